//! # lintbridge_core
//!
//! Adds linter findings and quick-fixes to a host language service.
//!
//! The bridge sits between a host service and a linter engine:
//!
//! - **Source Adapter**: turns host documents into engine sources
//! - **Config Resolver**: cascading config lookup with a watch-invalidated cache
//! - **Path Filter**: deferred, cached ignore checks
//! - **Diagnostic / Code-Fix Translators**: findings to host shapes
//! - **Bridge**: runs the above for one request, never failing the host
//! - **Proxy**: installs the bridge into the host's operation table
//!
//! # Example
//!
//! ```ignore
//! use lintbridge_core::{Plugin, PluginCreateInfo};
//!
//! let plugin = Plugin::create(PluginCreateInfo {
//!     config: serde_json::json!({ "watchDirs": ["/project"] }),
//!     service,
//!     project,
//!     config_host: Arc::new(FsHost::new()),
//!     parser,
//!     engine,
//! });
//! let ops = plugin.into_ops();
//! ```

mod bridge;
mod code_fix;
pub mod config;
mod config_resolver;
mod diagnostics;
mod error;
mod globs;
mod path_filter;
mod plugin;
pub mod preset;
mod proxy;
mod source_adapter;

pub use bridge::{Augmentation, Bridge, SkipReason};
pub use code_fix::{FALLBACK_FIX_NAME, translate_code_fixes};
pub use config::{ConfigFragment, FileSettings, OverrideBlock};
pub use config_resolver::{ConfigChain, ConfigResolver, ConfigResolverOptions};
pub use diagnostics::{
    LINT_DIAGNOSTIC_CODE, category_of, finding_span, format_message, to_host_diagnostic,
    translate_diagnostics,
};
pub use error::BridgeError;
pub use path_filter::{
    DEFAULT_IGNORE_PATTERNS, DeferredMode, IgnoreState, PathFilter, PathFilterOptions,
};
pub use plugin::{LOG_PREFIX, Plugin, PluginConfig, PluginCreateInfo};
pub use proxy::ServiceProxyBuilder;
pub use source_adapter::SourceAdapter;
