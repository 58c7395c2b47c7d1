//! In-memory host doubles for tests.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};

use crate::{
    CodeFixAction, CodeFixRequest, ConfigHost, FileWatchEvent, FileWatcher, HostDiagnostic,
    HostProject, LanguageService, SourceDocument, WatchCallback,
};

struct Watch {
    path: PathBuf,
    callback: WatchCallback,
    poll_interval: Duration,
    closed: Arc<AtomicBool>,
}

/// A [`ConfigHost`] over an in-memory file map. Watches only fire when the
/// test calls [`MemoryHost::notify`].
#[derive(Default)]
pub struct MemoryHost {
    files: RwLock<HashMap<PathBuf, String>>,
    watches: Mutex<Vec<Watch>>,
    reads: AtomicUsize,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(self, path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        self.write_file(path, text);
        self
    }

    /// Writes a file without notifying watchers.
    pub fn write_file(&self, path: impl Into<PathBuf>, text: impl Into<String>) {
        self.files.write().insert(path.into(), text.into());
    }

    pub fn remove_file(&self, path: &Path) {
        self.files.write().remove(path);
    }

    /// Fires every open watch on `path`. Returns the number fired.
    pub fn notify(&self, path: &Path, event: FileWatchEvent) -> usize {
        let callbacks: Vec<WatchCallback> = self
            .watches
            .lock()
            .iter()
            .filter(|w| w.path == path && !w.closed.load(Ordering::Acquire))
            .map(|w| Arc::clone(&w.callback))
            .collect();
        for callback in &callbacks {
            callback(path, event);
        }
        callbacks.len()
    }

    /// Paths with an open watch, in registration order.
    pub fn watched_paths(&self) -> Vec<PathBuf> {
        self.watches
            .lock()
            .iter()
            .filter(|w| !w.closed.load(Ordering::Acquire))
            .map(|w| w.path.clone())
            .collect()
    }

    /// Poll intervals requested by watchers, in registration order.
    pub fn poll_intervals(&self) -> Vec<Duration> {
        self.watches.lock().iter().map(|w| w.poll_interval).collect()
    }

    /// Number of `read_file` calls that found a file.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::Relaxed)
    }
}

impl ConfigHost for MemoryHost {
    fn read_file(&self, path: &Path) -> Option<String> {
        let text = self.files.read().get(path).cloned();
        if text.is_some() {
            self.reads.fetch_add(1, Ordering::Relaxed);
        }
        text
    }

    fn watch_file(
        &self,
        path: &Path,
        callback: WatchCallback,
        poll_interval: Duration,
    ) -> Box<dyn FileWatcher> {
        let closed = Arc::new(AtomicBool::new(false));
        self.watches.lock().push(Watch {
            path: path.to_path_buf(),
            callback,
            poll_interval,
            closed: Arc::clone(&closed),
        });
        Box::new(MemoryWatcher { closed })
    }
}

struct MemoryWatcher {
    closed: Arc<AtomicBool>,
}

impl FileWatcher for MemoryWatcher {
    fn close(&mut self) {
        self.closed.store(true, Ordering::Release);
    }
}

/// A [`HostProject`] over a fixed set of documents.
#[derive(Default)]
pub struct MemoryProject {
    documents: RwLock<HashMap<PathBuf, SourceDocument>>,
}

impl MemoryProject {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(self, document: SourceDocument) -> Self {
        self.insert(document);
        self
    }

    pub fn insert(&self, document: SourceDocument) {
        self.documents
            .write()
            .insert(document.path.clone(), document);
    }
}

impl HostProject for MemoryProject {
    fn source_file(&self, path: &Path) -> Option<SourceDocument> {
        self.documents.read().get(path).cloned()
    }
}

/// A [`LanguageService`] returning canned results and counting calls.
#[derive(Default)]
pub struct FixedService {
    pub diagnostics: Vec<HostDiagnostic>,
    pub fixes: Vec<CodeFixAction>,
    pub supported_codes: Vec<String>,
    semantic_calls: AtomicUsize,
    fix_calls: AtomicUsize,
}

impl FixedService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_diagnostics(mut self, diagnostics: Vec<HostDiagnostic>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn with_fixes(mut self, fixes: Vec<CodeFixAction>) -> Self {
        self.fixes = fixes;
        self
    }

    pub fn with_supported_codes(mut self, codes: &[&str]) -> Self {
        self.supported_codes = codes.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn semantic_calls(&self) -> usize {
        self.semantic_calls.load(Ordering::Relaxed)
    }

    pub fn fix_calls(&self) -> usize {
        self.fix_calls.load(Ordering::Relaxed)
    }
}

impl LanguageService for FixedService {
    fn get_semantic_diagnostics(&self, _file: &Path) -> Vec<HostDiagnostic> {
        self.semantic_calls.fetch_add(1, Ordering::Relaxed);
        self.diagnostics.clone()
    }

    fn get_code_fixes_at_position(&self, _request: &CodeFixRequest) -> Vec<CodeFixAction> {
        self.fix_calls.fetch_add(1, Ordering::Relaxed);
        self.fixes.clone()
    }

    fn get_supported_code_fixes(&self) -> Vec<String> {
        self.supported_codes.clone()
    }
}
