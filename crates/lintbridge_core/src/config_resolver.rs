//! Cascading config resolution with a watch-invalidated cache.
//!
//! The config applicable to a file is built from the fragments found in each
//! directory from the filesystem root down to the file's own directory.
//! Closer fragments override farther ones, and a `root: true` fragment hides
//! everything above it.
//!
//! Merged chains are cached per canonical directory. The cache is versioned:
//! every watch notification bumps a generation counter, and entries computed
//! under an older generation are treated as misses. Only whole-cache
//! invalidation exists.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use globset::GlobSet;
use lintbridge_engine::EffectiveConfig;
use lintbridge_host::{ConfigHost, FileWatchEvent, FileWatcher, WatchCallback};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::BridgeError;
use crate::config::{
    ConfigFragment, FileSettings, OverrideBlock, WATCHED_CONFIG_NAMES, in_file,
    load_directory_config,
};
use crate::globs::{build_globset, matches};
use crate::preset::PresetLocator;

/// Options for [`ConfigResolver::new`].
#[derive(Debug, Clone)]
pub struct ConfigResolverOptions {
    /// Directories whose conventional config files are watched.
    pub watch_dirs: Vec<PathBuf>,
    /// Extra directories searched for named presets.
    pub preset_paths: Vec<PathBuf>,
    /// Poll interval handed to the host's file watcher.
    pub poll_interval: Duration,
}

impl Default for ConfigResolverOptions {
    fn default() -> Self {
        Self {
            watch_dirs: Vec::new(),
            preset_paths: Vec::new(),
            poll_interval: Duration::from_millis(50),
        }
    }
}

#[derive(Debug, Clone)]
struct ScopedOverride {
    base: PathBuf,
    files: Option<GlobSet>,
    excluded: Option<GlobSet>,
    settings: FileSettings,
}

impl ScopedOverride {
    fn applies_to(&self, file: &Path) -> bool {
        let Ok(relative) = file.strip_prefix(&self.base) else {
            return false;
        };
        matches(self.files.as_ref(), relative) && !matches(self.excluded.as_ref(), relative)
    }
}

#[derive(Debug, Clone)]
struct ScopedIgnore {
    base: PathBuf,
    patterns: GlobSet,
}

/// The merged config fragments of one directory and its ancestors.
#[derive(Debug, Clone, Default)]
pub struct ConfigChain {
    settings: FileSettings,
    overrides: Vec<ScopedOverride>,
    ignores: Vec<ScopedIgnore>,
}

impl ConfigChain {
    /// The effective config for `file`, with matching overrides applied in
    /// declaration order.
    pub fn extract(&self, file: &Path) -> EffectiveConfig {
        let mut settings = self.settings.clone();
        for block in self.overrides.iter().filter(|o| o.applies_to(file)) {
            settings.merge_from(&block.settings);
        }
        settings.to_effective()
    }

    /// Returns true if an `ignorePatterns` entry of the chain matches `file`.
    pub fn is_ignored(&self, file: &Path) -> bool {
        self.ignores.iter().any(|ignore| {
            file.strip_prefix(&ignore.base)
                .is_ok_and(|relative| ignore.patterns.is_match(relative))
        })
    }

    /// Adds a fragment declared in directory `base` on top of the chain.
    fn push(&mut self, base: &Path, fragment: &ConfigFragment) -> Result<(), BridgeError> {
        self.settings.merge_from(&fragment.settings);
        for block in &fragment.overrides {
            self.push_override(base, block)?;
        }
        if let Some(patterns) = build_globset(&fragment.ignore_patterns)? {
            self.ignores.push(ScopedIgnore {
                base: base.to_path_buf(),
                patterns,
            });
        }
        Ok(())
    }

    fn push_override(&mut self, base: &Path, block: &OverrideBlock) -> Result<(), BridgeError> {
        self.overrides.push(ScopedOverride {
            base: base.to_path_buf(),
            files: build_globset(&block.files)?,
            excluded: build_globset(&block.excluded_files)?,
            settings: block.settings.clone(),
        });
        Ok(())
    }
}

struct CacheEntry {
    generation: u64,
    chain: Arc<ConfigChain>,
}

struct ResolverState {
    host: Arc<dyn ConfigHost>,
    presets: PresetLocator,
    generation: AtomicU64,
    cache: RwLock<HashMap<PathBuf, CacheEntry>>,
}

impl ResolverState {
    fn invalidate(&self, path: &Path, event: FileWatchEvent) {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        info!(
            "Config file {} ({:?}), invalidating config cache (generation {})",
            path.display(),
            event,
            generation
        );
    }

    fn chain_for_dir(&self, dir: &Path) -> Result<Arc<ConfigChain>, BridgeError> {
        let generation = self.generation.load(Ordering::Acquire);
        if let Some(entry) = self.cache.read().get(dir)
            && entry.generation == generation
        {
            return Ok(Arc::clone(&entry.chain));
        }

        // A failing directory caches an empty chain, so later lookups below
        // it do not re-read the broken config.
        let chain = match self.build_chain(dir) {
            Ok(chain) => Arc::new(chain),
            Err(e) => {
                self.store(dir, generation, Arc::new(ConfigChain::default()));
                return Err(e);
            }
        };
        self.store(dir, generation, Arc::clone(&chain));
        Ok(chain)
    }

    fn store(&self, dir: &Path, generation: u64, chain: Arc<ConfigChain>) {
        self.cache
            .write()
            .insert(dir.to_path_buf(), CacheEntry { generation, chain });
    }

    fn build_chain(&self, dir: &Path) -> Result<ConfigChain, BridgeError> {
        let found = load_directory_config(self.host.as_ref(), dir)?;
        let is_root = found.as_ref().is_some_and(|(_, fragment)| fragment.root);

        let mut chain = match dir.parent() {
            Some(parent) if !is_root => (*self.chain_for_dir(parent)?).clone(),
            _ => ConfigChain::default(),
        };

        if let Some((path, fragment)) = found {
            debug!("Loaded config {}", path.display());
            let mut visiting = vec![path];
            self.apply(&mut chain, dir, dir, &fragment, &mut visiting)?;
        }
        Ok(chain)
    }

    /// Applies `fragment` and, first, everything it extends.
    ///
    /// `scope` is the directory the fragment applies to; `origin` is where
    /// relative `extends` entries resolve from.
    fn apply(
        &self,
        chain: &mut ConfigChain,
        scope: &Path,
        origin: &Path,
        fragment: &ConfigFragment,
        visiting: &mut Vec<PathBuf>,
    ) -> Result<(), BridgeError> {
        for reference in &fragment.extends {
            let Some((path, text)) = self.load_extended(reference, origin) else {
                warn!(
                    "Config '{}' extended from {} was not found, using an empty preset",
                    reference,
                    origin.display()
                );
                continue;
            };

            if visiting.contains(&path) {
                let cycle: Vec<String> = visiting
                    .iter()
                    .chain(std::iter::once(&path))
                    .map(|p| p.display().to_string())
                    .collect();
                return Err(BridgeError::config(format!(
                    "Circular extends: {}",
                    cycle.join(" -> ")
                )));
            }

            let extended = ConfigFragment::from_jsonc(&text).map_err(in_file(&path))?;
            let extended_origin = path.parent().unwrap_or(origin).to_path_buf();
            visiting.push(path);
            self.apply(chain, scope, &extended_origin, &extended, visiting)?;
            visiting.pop();
        }

        chain.push(scope, fragment)
    }

    fn load_extended(&self, reference: &str, origin: &Path) -> Option<(PathBuf, String)> {
        if reference.starts_with("./") || reference.starts_with("../") {
            let path = normalize(&origin.join(reference));
            return self.host.read_file(&path).map(|text| (path, text));
        }
        self.presets.resolve(reference, self.host.as_ref())
    }
}

/// Lexically removes `.` and `..` components.
fn normalize(path: &Path) -> PathBuf {
    use std::path::Component;

    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

/// The canonical form of the directory containing `file`.
fn canonical_dir(file: &Path) -> PathBuf {
    let dir = file.parent().unwrap_or_else(|| Path::new(""));
    dir.canonicalize().unwrap_or_else(|_| normalize(dir))
}

/// Resolves the [`EffectiveConfig`] of any file.
pub struct ConfigResolver {
    state: Arc<ResolverState>,
    watchers: Mutex<Vec<Box<dyn FileWatcher>>>,
}

impl ConfigResolver {
    /// Creates a resolver and registers watches on every conventional config
    /// file name in each of `options.watch_dirs`.
    pub fn new(host: Arc<dyn ConfigHost>, options: ConfigResolverOptions) -> Self {
        let state = Arc::new(ResolverState {
            host,
            presets: PresetLocator::new(options.preset_paths),
            generation: AtomicU64::new(0),
            cache: RwLock::new(HashMap::new()),
        });

        let mut watchers = Vec::new();
        for dir in &options.watch_dirs {
            for name in WATCHED_CONFIG_NAMES {
                let weak = Arc::downgrade(&state);
                let callback: WatchCallback = Arc::new(move |path, event| {
                    if let Some(state) = weak.upgrade() {
                        state.invalidate(path, event);
                    }
                });
                watchers.push(
                    state
                        .host
                        .watch_file(&dir.join(name), callback, options.poll_interval),
                );
            }
        }
        debug!(
            "Watching {} config files in {} directories",
            watchers.len(),
            options.watch_dirs.len()
        );

        Self {
            state,
            watchers: Mutex::new(watchers),
        }
    }

    /// Resolves the config for `file`.
    ///
    /// Never fails: an unreadable or malformed config yields an empty config,
    /// which is cached like any other result until the next invalidation.
    pub fn resolve_for_file(&self, file: &Path) -> EffectiveConfig {
        let dir = canonical_dir(file);
        let file = match file.file_name() {
            Some(name) => dir.join(name),
            None => dir.clone(),
        };
        self.chain_for(&dir).extract(&file)
    }

    /// Returns true if the `ignorePatterns` applicable to `file` match it.
    pub fn is_ignored_by_config(&self, file: &Path) -> bool {
        let dir = canonical_dir(file);
        let file = match file.file_name() {
            Some(name) => dir.join(name),
            None => dir.clone(),
        };
        self.chain_for(&dir).is_ignored(&file)
    }

    fn chain_for(&self, dir: &Path) -> Arc<ConfigChain> {
        self.state.chain_for_dir(dir).unwrap_or_else(|e| {
            warn!("{}; using an empty config for {}", e, dir.display());
            Arc::new(ConfigChain::default())
        })
    }

    /// Drops every cached result.
    pub fn invalidate_all(&self) {
        self.state.generation.fetch_add(1, Ordering::AcqRel);
    }

    /// Current cache generation.
    pub fn generation(&self) -> u64 {
        self.state.generation.load(Ordering::Acquire)
    }

    /// Directories with a cache entry valid for the current generation.
    pub fn cached_dirs(&self) -> Vec<PathBuf> {
        let generation = self.generation();
        let mut dirs: Vec<PathBuf> = self
            .state
            .cache
            .read()
            .iter()
            .filter(|(_, entry)| entry.generation == generation)
            .map(|(dir, _)| dir.clone())
            .collect();
        dirs.sort();
        dirs
    }
}

impl Drop for ConfigResolver {
    fn drop(&mut self) {
        for watcher in self.watchers.get_mut().iter_mut() {
            watcher.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lintbridge_engine::RuleSeverity;
    use lintbridge_host::test_utils::MemoryHost;
    use pretty_assertions::assert_eq;

    fn resolver(host: &Arc<MemoryHost>, options: ConfigResolverOptions) -> ConfigResolver {
        ConfigResolver::new(Arc::clone(host) as Arc<dyn ConfigHost>, options)
    }

    fn severity(config: &EffectiveConfig, rule: &str) -> Option<RuleSeverity> {
        config.rules.get(rule).map(|s| s.severity)
    }

    #[test]
    fn test_cascade_closer_wins() {
        let host = Arc::new(
            MemoryHost::new()
                .with_file("/p/.lintrc.json", r#"{ "parser": "outer", "rules": { "semi": "error", "quotes": "error" } }"#)
                .with_file("/p/src/.lintrc.json", r#"{ "rules": { "semi": "off" } }"#),
        );
        let resolver = resolver(&host, ConfigResolverOptions::default());

        let config = resolver.resolve_for_file(Path::new("/p/src/a.ts"));
        assert_eq!(config.parser.as_deref(), Some("outer"));
        assert_eq!(severity(&config, "semi"), Some(RuleSeverity::Off));
        assert_eq!(severity(&config, "quotes"), Some(RuleSeverity::Error));
    }

    #[test]
    fn test_root_stops_upward_search() {
        let host = Arc::new(
            MemoryHost::new()
                .with_file("/p/.lintrc.json", r#"{ "rules": { "semi": "error" } }"#)
                .with_file("/p/pkg/.lintrc.json", r#"{ "root": true, "rules": { "quotes": "warn" } }"#),
        );
        let resolver = resolver(&host, ConfigResolverOptions::default());

        let config = resolver.resolve_for_file(Path::new("/p/pkg/lib/a.ts"));
        assert_eq!(severity(&config, "semi"), None);
        assert_eq!(severity(&config, "quotes"), Some(RuleSeverity::Warn));
    }

    #[test]
    fn test_no_config_is_empty() {
        let host = Arc::new(MemoryHost::new());
        let resolver = resolver(&host, ConfigResolverOptions::default());
        assert_eq!(resolver.resolve_for_file(Path::new("/p/a.ts")), EffectiveConfig::default());
    }

    #[test]
    fn test_malformed_config_is_empty_and_cached() {
        let host = Arc::new(
            MemoryHost::new()
                .with_file("/p/.lintrc.json", r#"{ "rules": { "semi": "error" } }"#)
                .with_file("/p/src/.lintrc.json", "{ broken"),
        );
        let resolver = resolver(&host, ConfigResolverOptions::default());

        let config = resolver.resolve_for_file(Path::new("/p/src/a.ts"));
        assert_eq!(config, EffectiveConfig::default());

        let reads = host.reads();
        let again = resolver.resolve_for_file(Path::new("/p/src/b.ts"));
        assert_eq!(again, config);
        assert_eq!(host.reads(), reads);
    }

    #[test]
    fn test_extends_relative_and_preset() {
        let host = Arc::new(
            MemoryHost::new()
                .with_file("/presets/recommended.json", r#"{ "rules": { "semi": "error", "quotes": ["error", "single"] } }"#)
                .with_file("/p/base.json", r#"{ "extends": "lint:recommended", "env": { "node": true } }"#)
                .with_file("/p/.lintrc.json", r#"{ "extends": ["./base.json"], "rules": { "quotes": "warn" } }"#),
        );
        let resolver = resolver(
            &host,
            ConfigResolverOptions {
                preset_paths: vec!["/presets".into()],
                ..Default::default()
            },
        );

        let config = resolver.resolve_for_file(Path::new("/p/a.ts"));
        assert_eq!(severity(&config, "semi"), Some(RuleSeverity::Error));
        assert_eq!(severity(&config, "quotes"), Some(RuleSeverity::Warn));
        assert_eq!(config.rules["quotes"].options, vec![serde_json::json!("single")]);
        assert_eq!(config.env.get("node"), Some(&true));
    }

    #[test]
    fn test_missing_preset_is_empty() {
        let host = Arc::new(MemoryHost::new().with_file(
            "/p/.lintrc.json",
            r#"{ "extends": "lint:does-not-exist", "rules": { "semi": "error" } }"#,
        ));
        let resolver = resolver(&host, ConfigResolverOptions::default());

        let config = resolver.resolve_for_file(Path::new("/p/a.ts"));
        assert_eq!(severity(&config, "semi"), Some(RuleSeverity::Error));
        assert_eq!(config.rules.len(), 1);
    }

    #[test]
    fn test_extends_cycle_yields_empty_config() {
        let host = Arc::new(
            MemoryHost::new()
                .with_file("/p/a.json", r#"{ "extends": "./b.json" }"#)
                .with_file("/p/b.json", r#"{ "extends": "./a.json" }"#)
                .with_file("/p/.lintrc.json", r#"{ "extends": "./a.json", "rules": { "semi": 2 } }"#),
        );
        let resolver = resolver(&host, ConfigResolverOptions::default());
        assert_eq!(resolver.resolve_for_file(Path::new("/p/x.ts")), EffectiveConfig::default());
    }

    #[test]
    fn test_diamond_extends_is_not_a_cycle() {
        let host = Arc::new(
            MemoryHost::new()
                .with_file("/p/shared.json", r#"{ "rules": { "semi": 2 } }"#)
                .with_file("/p/a.json", r#"{ "extends": "./shared.json" }"#)
                .with_file("/p/b.json", r#"{ "extends": "./shared.json" }"#)
                .with_file("/p/.lintrc.json", r#"{ "extends": ["./a.json", "./b.json"] }"#),
        );
        let resolver = resolver(&host, ConfigResolverOptions::default());
        let config = resolver.resolve_for_file(Path::new("/p/x.ts"));
        assert_eq!(severity(&config, "semi"), Some(RuleSeverity::Error));
    }

    #[test]
    fn test_overrides_apply_per_file() {
        let host = Arc::new(MemoryHost::new().with_file(
            "/p/.lintrc.json",
            r#"{
                "rules": { "semi": "error" },
                "overrides": [{
                    "files": ["*.test.ts"],
                    "excludedFiles": "fixtures/**",
                    "rules": { "semi": "off" }
                }]
            }"#,
        ));
        let resolver = resolver(&host, ConfigResolverOptions::default());

        let plain = resolver.resolve_for_file(Path::new("/p/src/a.ts"));
        let test = resolver.resolve_for_file(Path::new("/p/src/a.test.ts"));
        let fixture = resolver.resolve_for_file(Path::new("/p/fixtures/a.test.ts"));
        assert_eq!(severity(&plain, "semi"), Some(RuleSeverity::Error));
        assert_eq!(severity(&test, "semi"), Some(RuleSeverity::Off));
        assert_eq!(severity(&fixture, "semi"), Some(RuleSeverity::Error));
    }

    #[test]
    fn test_ignore_patterns() {
        let host = Arc::new(
            MemoryHost::new().with_file("/p/.lintrc.json", r#"{ "ignorePatterns": ["dist/", "*.min.js"] }"#),
        );
        let resolver = resolver(&host, ConfigResolverOptions::default());

        assert!(resolver.is_ignored_by_config(Path::new("/p/dist/bundle.js")));
        assert!(resolver.is_ignored_by_config(Path::new("/p/src/app.min.js")));
        assert!(!resolver.is_ignored_by_config(Path::new("/p/src/app.js")));
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let host = Arc::new(MemoryHost::new().with_file(
            "/p/.lintrc.json",
            r#"{ "parser": "x", "globals": { "b": "readonly", "a": true }, "rules": { "z": 1, "a": 2 } }"#,
        ));
        let resolver = resolver(&host, ConfigResolverOptions::default());

        let first = resolver.resolve_for_file(Path::new("/p/a.ts"));
        let second = resolver.resolve_for_file(Path::new("/p/a.ts"));
        assert_eq!(first, second);
        assert_eq!(first.hash(), second.hash());
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_cache_is_per_directory_and_shared_with_ancestors() {
        let host = Arc::new(MemoryHost::new().with_file("/p/.lintrc.json", "{}"));
        let resolver = resolver(&host, ConfigResolverOptions::default());

        resolver.resolve_for_file(Path::new("/p/src/a.ts"));
        let reads = host.reads();
        resolver.resolve_for_file(Path::new("/p/src/b.ts"));
        resolver.resolve_for_file(Path::new("/p/c.ts"));
        assert_eq!(host.reads(), reads);

        let dirs = resolver.cached_dirs();
        assert!(dirs.contains(&PathBuf::from("/p")));
        assert!(dirs.contains(&PathBuf::from("/p/src")));
        assert!(dirs.contains(&PathBuf::from("/")));
    }

    #[test]
    fn test_watch_registration() {
        let host = Arc::new(MemoryHost::new());
        let resolver = resolver(
            &host,
            ConfigResolverOptions {
                watch_dirs: vec!["/p".into(), "/q".into()],
                ..Default::default()
            },
        );

        let watched = host.watched_paths();
        assert_eq!(watched.len(), 2 * WATCHED_CONFIG_NAMES.len());
        assert!(watched.contains(&PathBuf::from("/p/.lintrc.json")));
        assert!(watched.contains(&PathBuf::from("/q/package.json")));
        assert!(host.poll_intervals().iter().all(|d| *d == Duration::from_millis(50)));

        drop(resolver);
        assert!(host.watched_paths().is_empty());
    }

    #[test]
    fn test_malformed_ancestor_is_cached_as_empty() {
        let host = Arc::new(MemoryHost::new().with_file("/p/.lintrc.json", r#"{ "rules": "#));
        let resolver = resolver(&host, ConfigResolverOptions::default());

        let first = resolver.resolve_for_file(Path::new("/p/a/x.ts"));
        assert!(first.rules.is_empty());
        let dirs = resolver.cached_dirs();
        assert!(dirs.contains(&PathBuf::from("/p")));
        assert!(dirs.contains(&PathBuf::from("/p/a")));

        let reads = host.reads();
        let sibling = resolver.resolve_for_file(Path::new("/p/b/y.ts"));
        assert!(sibling.rules.is_empty());
        assert_eq!(host.reads(), reads);
    }

    #[test]
    fn test_yaml_config_edit_invalidates() {
        let host = Arc::new(MemoryHost::new());
        let resolver = resolver(
            &host,
            ConfigResolverOptions {
                watch_dirs: vec!["/p".into()],
                ..Default::default()
            },
        );

        let watched = host.watched_paths();
        assert!(watched.contains(&PathBuf::from("/p/.lintrc.yaml")));
        assert!(watched.contains(&PathBuf::from("/p/.lintrc.yml")));

        let generation = resolver.generation();
        assert_eq!(host.notify(Path::new("/p/.lintrc.yml"), FileWatchEvent::Created), 1);
        assert_eq!(resolver.generation(), generation + 1);
    }

    #[test]
    fn test_watch_event_invalidates_everything() {
        let host = Arc::new(MemoryHost::new().with_file("/p/.lintrc.json", r#"{ "rules": { "semi": 2 } }"#));
        let resolver = resolver(
            &host,
            ConfigResolverOptions {
                watch_dirs: vec!["/p".into()],
                ..Default::default()
            },
        );

        let before = resolver.resolve_for_file(Path::new("/p/a.ts"));
        assert_eq!(severity(&before, "semi"), Some(RuleSeverity::Error));
        assert!(!resolver.cached_dirs().is_empty());

        host.write_file("/p/.lintrc.json", r#"{ "rules": { "semi": 1 } }"#);
        let stale = resolver.resolve_for_file(Path::new("/p/a.ts"));
        assert_eq!(stale, before);

        let generation = resolver.generation();
        host.notify(Path::new("/p/.lintrc.json"), FileWatchEvent::Changed);
        assert_eq!(resolver.generation(), generation + 1);
        assert!(resolver.cached_dirs().is_empty());

        let after = resolver.resolve_for_file(Path::new("/p/a.ts"));
        assert_eq!(severity(&after, "semi"), Some(RuleSeverity::Warn));
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(Path::new("/p/a/../b/./c.json")), PathBuf::from("/p/b/c.json"));
    }
}
