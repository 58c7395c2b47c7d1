//! Deferred, cached ignore checks.
//!
//! [`PathFilter::is_ignored`] never blocks on I/O. The first query for a
//! path answers "not ignored" and queues the real check; once that check
//! has run, later queries see its result. A file may therefore be linted
//! once before its ignore status is known.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender};
use globset::GlobSet;
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use parking_lot::RwLock;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::globs::{build_globset, matches};

/// Patterns ignored in every project.
pub const DEFAULT_IGNORE_PATTERNS: [&str; 2] = ["**/node_modules/**", "**/.git/**"];

/// Where queued ignore checks run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeferredMode {
    /// A worker thread drains the queue.
    #[default]
    Background,
    /// The host drains the queue with [`PathFilter::run_pending`].
    Manual,
}

/// Cached ignore status of one path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IgnoreState {
    /// Never queried.
    Unknown,
    /// Check queued but not run yet.
    Pending,
    Ignored,
    NotIgnored,
}

/// Options for [`PathFilter::new`].
#[derive(Debug, Clone)]
pub struct PathFilterOptions {
    /// Project root. Paths outside it are never ignored.
    pub project_dir: Option<PathBuf>,
    /// Gitignore-syntax file read from the project root.
    pub ignore_file_name: String,
    pub mode: DeferredMode,
}

impl Default for PathFilterOptions {
    fn default() -> Self {
        Self {
            project_dir: None,
            ignore_file_name: ".lintignore".to_string(),
            mode: DeferredMode::Background,
        }
    }
}

struct IgnoreMatcher {
    root: Option<PathBuf>,
    gitignore: Option<Gitignore>,
    defaults: Option<GlobSet>,
}

impl IgnoreMatcher {
    fn load(root: Option<&Path>, ignore_file_name: &str) -> Self {
        let patterns: Vec<String> = DEFAULT_IGNORE_PATTERNS.iter().map(|p| p.to_string()).collect();
        let defaults = build_globset(&patterns).unwrap_or_else(|e| {
            warn!("Default ignore patterns unusable: {}", e);
            None
        });

        let gitignore = root.and_then(|root| {
            let path = root.join(ignore_file_name);
            if !path.is_file() {
                return None;
            }
            let mut builder = GitignoreBuilder::new(root);
            if let Some(err) = builder.add(&path) {
                warn!("Failed to read {}: {}", path.display(), err);
            }
            match builder.build() {
                Ok(gitignore) => {
                    debug!("Loaded {} ignore rules from {}", gitignore.len(), path.display());
                    Some(gitignore)
                }
                Err(e) => {
                    warn!("Invalid ignore file {}: {}", path.display(), e);
                    None
                }
            }
        });

        Self {
            root: root.map(Path::to_path_buf),
            gitignore,
            defaults,
        }
    }

    fn is_ignored(&self, path: &Path) -> bool {
        let relative = match &self.root {
            Some(root) => match path.strip_prefix(root) {
                Ok(relative) => relative,
                Err(_) => return false,
            },
            None => path,
        };
        if matches(self.defaults.as_ref(), relative) {
            return true;
        }
        self.gitignore
            .as_ref()
            .is_some_and(|gitignore| gitignore.matched_path_or_any_parents(relative, false).is_ignore())
    }
}

struct FilterShared {
    root: Option<PathBuf>,
    ignore_file_name: String,
    matcher: OnceLock<IgnoreMatcher>,
    states: RwLock<HashMap<PathBuf, IgnoreState>>,
}

impl FilterShared {
    fn check(&self, path: &Path) {
        let matcher = self
            .matcher
            .get_or_init(|| IgnoreMatcher::load(self.root.as_deref(), &self.ignore_file_name));
        let state = if matcher.is_ignored(path) {
            IgnoreState::Ignored
        } else {
            IgnoreState::NotIgnored
        };
        debug!("Ignore check for {}: {:?}", path.display(), state);
        self.states.write().insert(path.to_path_buf(), state);
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Answers whether a file is excluded from linting.
pub struct PathFilter {
    shared: Arc<FilterShared>,
    sender: Option<Sender<PathBuf>>,
    receiver: Receiver<PathBuf>,
    worker: Option<JoinHandle<()>>,
}

impl PathFilter {
    pub fn new(options: PathFilterOptions) -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded::<PathBuf>();
        let shared = Arc::new(FilterShared {
            root: options.project_dir.as_deref().map(absolute),
            ignore_file_name: options.ignore_file_name,
            matcher: OnceLock::new(),
            states: RwLock::new(HashMap::new()),
        });

        let worker = match options.mode {
            DeferredMode::Background => {
                let worker_shared = Arc::clone(&shared);
                let queue = receiver.clone();
                thread::Builder::new()
                    .name("lintbridge-ignore".to_string())
                    .spawn(move || {
                        for path in queue.iter() {
                            worker_shared.check(&path);
                        }
                    })
                    .map_err(|e| warn!("Failed to start ignore worker: {}", e))
                    .ok()
            }
            DeferredMode::Manual => None,
        };

        Self {
            shared,
            sender: Some(sender),
            receiver,
            worker,
        }
    }

    /// Returns the cached answer for `path`, queueing a check on first use.
    ///
    /// `Unknown` and `Pending` both answer `false`.
    pub fn is_ignored(&self, path: &Path) -> bool {
        let path = absolute(path);
        match self.cached_state(&path) {
            IgnoreState::Ignored => true,
            IgnoreState::NotIgnored | IgnoreState::Pending => false,
            IgnoreState::Unknown => {
                self.schedule(path);
                false
            }
        }
    }

    /// The cached state of `path`, without scheduling anything.
    pub fn state(&self, path: &Path) -> IgnoreState {
        self.cached_state(&absolute(path))
    }

    fn cached_state(&self, path: &Path) -> IgnoreState {
        self.shared
            .states
            .read()
            .get(path)
            .copied()
            .unwrap_or(IgnoreState::Unknown)
    }

    fn schedule(&self, path: PathBuf) {
        {
            let mut states = self.shared.states.write();
            if states.contains_key(&path) {
                return;
            }
            states.insert(path.clone(), IgnoreState::Pending);
        }

        debug!("Scheduling ignore check for {}", path.display());
        if let Some(sender) = &self.sender
            && let Err(e) = sender.send(path)
        {
            warn!("Ignore check queue closed: {}", e);
        }
    }

    /// Runs every queued check on the calling thread. Returns how many ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        while let Ok(path) = self.receiver.try_recv() {
            self.shared.check(&path);
            ran += 1;
        }
        ran
    }
}

impl Drop for PathFilter {
    fn drop(&mut self) {
        self.sender.take();
        if let Some(worker) = self.worker.take()
            && worker.join().is_err()
        {
            warn!("Ignore worker panicked");
        }
    }
}
