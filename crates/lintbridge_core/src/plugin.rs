//! Plugin entry point: wires the bridge into a host operation table.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use lintbridge_engine::{LintEngine, LintParser};
use lintbridge_host::{ConfigHost, HostProject, ServiceOps};
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::bridge::Bridge;
use crate::config_resolver::{ConfigResolver, ConfigResolverOptions};
use crate::diagnostics::LINT_DIAGNOSTIC_CODE;
use crate::path_filter::{DeferredMode, PathFilter, PathFilterOptions};
use crate::proxy::ServiceProxyBuilder;
use crate::source_adapter::SourceAdapter;
use crate::BridgeError;

/// Prefix of plugin log lines.
pub const LOG_PREFIX: &str = "[lintbridge]";

/// Plugin configuration handed over by the host.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PluginConfig {
    /// Directories whose config files are watched for changes.
    pub watch_dirs: Vec<PathBuf>,

    /// Parser a config must declare for its files to be linted.
    pub expected_parser: String,

    /// Extra directories searched for named presets.
    pub preset_paths: Vec<PathBuf>,

    /// Project root for ignore rules.
    pub project_dir: Option<PathBuf>,

    /// Ignore file read from the project root.
    pub ignore_file_name: String,

    /// Poll interval for config file watches, in milliseconds.
    pub watch_poll_interval_ms: u64,

    /// Where deferred ignore checks run.
    pub deferred_ignore_check: DeferredMode,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            watch_dirs: Vec::new(),
            expected_parser: "@lintbridge/parser".to_string(),
            preset_paths: Vec::new(),
            project_dir: None,
            ignore_file_name: ".lintignore".to_string(),
            watch_poll_interval_ms: 50,
            deferred_ignore_check: DeferredMode::Background,
        }
    }
}

impl PluginConfig {
    /// Parses the host's config value.
    pub fn from_value(value: &Value) -> Result<Self, BridgeError> {
        if value.is_null() {
            return Ok(Self::default());
        }
        Self::deserialize(value)
            .map_err(|e| BridgeError::config(format!("Invalid plugin config: {}", e)))
    }
}

/// Everything the host provides when creating the plugin.
pub struct PluginCreateInfo {
    /// Raw plugin config.
    pub config: Value,
    /// The host's operation table to proxy.
    pub service: ServiceOps,
    pub project: Arc<dyn HostProject>,
    pub config_host: Arc<dyn ConfigHost>,
    pub parser: Arc<dyn LintParser>,
    pub engine: Arc<dyn LintEngine>,
}

/// A created plugin: the proxied operation table and the bridge behind it.
pub struct Plugin {
    ops: ServiceOps,
    bridge: Arc<Bridge>,
}

impl Plugin {
    /// Creates the bridge and proxies the host's diagnostic and code-fix
    /// operations through it.
    ///
    /// An unusable plugin config is logged and replaced by defaults.
    pub fn create(info: PluginCreateInfo) -> Self {
        let config = PluginConfig::from_value(&info.config).unwrap_or_else(|e| {
            warn!("{} {}, using defaults", LOG_PREFIX, e);
            PluginConfig::default()
        });
        info!("{} config: {}", LOG_PREFIX, info.config);

        let configs = ConfigResolver::new(
            info.config_host,
            ConfigResolverOptions {
                watch_dirs: config.watch_dirs.clone(),
                preset_paths: config.preset_paths.clone(),
                poll_interval: Duration::from_millis(config.watch_poll_interval_ms),
            },
        );
        let filter = PathFilter::new(PathFilterOptions {
            project_dir: config.project_dir.clone(),
            ignore_file_name: config.ignore_file_name.clone(),
            mode: config.deferred_ignore_check,
        });
        let bridge = Arc::new(Bridge::new(
            info.project,
            Arc::new(configs),
            Arc::new(filter),
            SourceAdapter::new(info.parser),
            info.engine,
            config.expected_parser,
        ));

        let diagnostics_bridge = Arc::clone(&bridge);
        let fixes_bridge = Arc::clone(&bridge);
        let ops = ServiceProxyBuilder::new(info.service)
            .wrap_semantic_diagnostics(move |delegate, file| {
                diagnostics_bridge.semantic_diagnostics(delegate.as_ref(), file)
            })
            .wrap_code_fixes_at_position(move |delegate, request| {
                fixes_bridge.code_fixes_at_position(delegate.as_ref(), request)
            })
            .wrap_supported_code_fixes(|delegate| {
                let mut codes = delegate();
                let lint_code = LINT_DIAGNOSTIC_CODE.to_string();
                if !codes.contains(&lint_code) {
                    codes.push(lint_code);
                }
                codes
            })
            .build();

        Self { ops, bridge }
    }

    /// The proxied operation table to install in the host.
    pub fn ops(&self) -> &ServiceOps {
        &self.ops
    }

    pub fn into_ops(self) -> ServiceOps {
        self.ops
    }

    pub fn bridge(&self) -> &Bridge {
        &self.bridge
    }

    /// Runs queued ignore checks. Hosts using [`DeferredMode::Manual`] call
    /// this from their event loop.
    pub fn run_pending_ignore_checks(&self) -> usize {
        self.bridge.path_filter().run_pending()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_plugin_config_defaults() {
        let config = PluginConfig::from_value(&json!({})).unwrap();
        assert_eq!(config, PluginConfig::default());
        assert_eq!(config.expected_parser, "@lintbridge/parser");
        assert_eq!(config.ignore_file_name, ".lintignore");
        assert_eq!(config.watch_poll_interval_ms, 50);
        assert_eq!(config.deferred_ignore_check, DeferredMode::Background);
        assert_eq!(PluginConfig::from_value(&Value::Null).unwrap(), config);
    }

    #[test]
    fn test_plugin_config_camel_case() {
        let config = PluginConfig::from_value(&json!({
            "watchDirs": ["/p"],
            "expectedParser": "custom-parser",
            "presetPaths": ["/presets"],
            "projectDir": "/p",
            "ignoreFileName": ".customignore",
            "watchPollIntervalMs": 200,
            "deferredIgnoreCheck": "manual"
        }))
        .unwrap();

        assert_eq!(config.watch_dirs, vec![PathBuf::from("/p")]);
        assert_eq!(config.expected_parser, "custom-parser");
        assert_eq!(config.preset_paths, vec![PathBuf::from("/presets")]);
        assert_eq!(config.project_dir, Some(PathBuf::from("/p")));
        assert_eq!(config.ignore_file_name, ".customignore");
        assert_eq!(config.watch_poll_interval_ms, 200);
        assert_eq!(config.deferred_ignore_check, DeferredMode::Manual);
    }

    #[test]
    fn test_plugin_config_invalid() {
        let err = PluginConfig::from_value(&json!({ "watchDirs": 3 })).unwrap_err();
        assert!(err.to_string().contains("Invalid plugin config"));
    }
}
