//! Config file reads and watches.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use notify::{Event, EventKind, PollWatcher, RecursiveMode, Watcher};
use tracing::{debug, warn};

/// What happened to a watched file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileWatchEvent {
    Created,
    Changed,
    Deleted,
}

impl FileWatchEvent {
    fn from_kind(kind: &EventKind) -> Option<Self> {
        match kind {
            EventKind::Create(_) => Some(Self::Created),
            EventKind::Modify(_) => Some(Self::Changed),
            EventKind::Remove(_) => Some(Self::Deleted),
            _ => None,
        }
    }
}

/// Called with the watched path whenever it changes.
pub type WatchCallback = Arc<dyn Fn(&Path, FileWatchEvent) + Send + Sync>;

/// A live file watch. Closing it stops further callbacks.
pub trait FileWatcher: Send {
    fn close(&mut self);
}

/// The file-system facilities the config resolver needs from its host.
pub trait ConfigHost: Send + Sync {
    /// Reads a file to a string. `None` when it does not exist or is unreadable.
    fn read_file(&self, path: &Path) -> Option<String>;

    /// Watches `path` (which need not exist yet), polling at `poll_interval`.
    fn watch_file(
        &self,
        path: &Path,
        callback: WatchCallback,
        poll_interval: Duration,
    ) -> Box<dyn FileWatcher>;
}

/// [`ConfigHost`] backed by `std::fs`, with `notify` polling watchers.
///
/// A watch polls the file's parent directory, so files that do not exist
/// yet are reported when they appear.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsHost;

impl FsHost {
    pub fn new() -> Self {
        Self
    }

    fn poll_watcher(
        path: &Path,
        callback: WatchCallback,
        poll_interval: Duration,
        closed: Arc<AtomicBool>,
    ) -> notify::Result<PollWatcher> {
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let target = path.to_path_buf();

        let handler = move |result: notify::Result<Event>| match result {
            Ok(event) => {
                if closed.load(Ordering::Acquire) || !event.paths.iter().any(|p| *p == target) {
                    return;
                }
                if let Some(kind) = FileWatchEvent::from_kind(&event.kind) {
                    debug!("Watched file {:?}: {}", kind, target.display());
                    callback(&target, kind);
                }
            }
            Err(e) => warn!("Watch error for {}: {}", target.display(), e),
        };

        let config = notify::Config::default().with_poll_interval(poll_interval);
        let mut watcher = PollWatcher::new(handler, config)?;
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        Ok(watcher)
    }
}

impl ConfigHost for FsHost {
    fn read_file(&self, path: &Path) -> Option<String> {
        fs::read_to_string(path).ok()
    }

    fn watch_file(
        &self,
        path: &Path,
        callback: WatchCallback,
        poll_interval: Duration,
    ) -> Box<dyn FileWatcher> {
        let closed = Arc::new(AtomicBool::new(false));
        let watcher = Self::poll_watcher(path, callback, poll_interval, Arc::clone(&closed))
            .map_err(|e| warn!("Failed to watch {}: {}", path.display(), e))
            .ok();

        Box::new(NotifyWatcher { watcher, closed })
    }
}

struct NotifyWatcher {
    watcher: Option<PollWatcher>,
    closed: Arc<AtomicBool>,
}

impl FileWatcher for NotifyWatcher {
    fn close(&mut self) {
        self.closed.store(true, Ordering::Release);
        self.watcher.take();
    }
}
