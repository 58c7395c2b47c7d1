//! Glob set helpers.

use std::path::Path;

use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::BridgeError;

/// Builds a glob set, or `None` when there are no patterns.
///
/// A pattern ending in `/` names a directory and matches everything below it.
pub(crate) fn build_globset(patterns: &[String]) -> Result<Option<GlobSet>, BridgeError> {
    if patterns.is_empty() {
        return Ok(None);
    }

    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let pattern = match pattern.strip_suffix('/') {
            Some(dir) => format!("{dir}/**"),
            None => pattern.clone(),
        };
        let glob = Glob::new(&pattern)
            .map_err(|e| BridgeError::config(format!("Invalid pattern '{}': {}", pattern, e)))?;
        builder.add(glob);
    }

    let globset = builder
        .build()
        .map_err(|e| BridgeError::config(format!("Failed to build globset: {}", e)))?;

    Ok(Some(globset))
}

/// Matches `path` against an optional glob set.
pub(crate) fn matches(globs: Option<&GlobSet>, path: &Path) -> bool {
    globs.is_some_and(|set| set.is_match(path))
}
