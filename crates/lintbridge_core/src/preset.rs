//! Built-in preset lookup.

use std::path::{Component, Path, PathBuf};

use lintbridge_host::ConfigHost;

/// Prefix marking an `extends` entry as a named preset.
pub const PRESET_PREFIX: &str = "lint:";

/// Resolves preset names to preset files.
#[derive(Debug, Clone, Default)]
pub struct PresetLocator {
    search_paths: Vec<PathBuf>,
}

impl PresetLocator {
    pub fn new(search_paths: Vec<PathBuf>) -> Self {
        Self { search_paths }
    }

    /// Directories searched for presets, in order.
    ///
    /// 1. every configured search path
    /// 2. `$HOME/.lintbridge/presets`
    pub fn search_dirs(&self) -> Vec<PathBuf> {
        let mut dirs = self.search_paths.clone();
        if let Some(home) = dirs::home_dir() {
            dirs.push(home.join(".lintbridge").join("presets"));
        }
        dirs
    }

    /// Finds `<name>.json` and reads it through `host`.
    ///
    /// `name` may carry the [`PRESET_PREFIX`]. Names that are not a single
    /// normal path component never resolve.
    pub fn resolve(&self, name: &str, host: &dyn ConfigHost) -> Option<(PathBuf, String)> {
        let name = name.strip_prefix(PRESET_PREFIX).unwrap_or(name);

        // Validate preset name to prevent path traversal
        let mut components = Path::new(name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => {}
            _ => return None,
        }
        if name.ends_with('/') || name.ends_with('\\') {
            return None;
        }

        let filename = format!("{}.json", name);
        self.search_dirs().into_iter().find_map(|dir| {
            let path = dir.join(&filename);
            host.read_file(&path).map(|text| (path, text))
        })
    }
}
