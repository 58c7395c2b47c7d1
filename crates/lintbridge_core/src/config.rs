//! Linter configuration files.
//!
//! A directory contributes at most one [`ConfigFragment`], read from the
//! first of [`CONFIG_FILE_NAMES`] that exists. Fragments are JSON with
//! comments and trailing commas allowed, and are validated against an
//! embedded schema before being deserialized.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use jsonschema::Validator;
use lintbridge_engine::{EffectiveConfig, RuleSetting};
use lintbridge_host::ConfigHost;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::BridgeError;

/// Conventional config file names, in lookup priority order.
pub const CONFIG_FILE_NAMES: [&str; 4] = [".lintrc.json", ".lintrc.jsonc", ".lintrc", PACKAGE_MANIFEST];

/// Config file names whose changes invalidate resolved configs. YAML
/// configs are watched so edits to them are noticed, but never loaded.
pub const WATCHED_CONFIG_NAMES: [&str; 6] = [
    ".lintrc.json",
    ".lintrc.jsonc",
    ".lintrc.yaml",
    ".lintrc.yml",
    ".lintrc",
    PACKAGE_MANIFEST,
];

/// The package manifest, which carries its config under [`PACKAGE_CONFIG_KEY`].
pub const PACKAGE_MANIFEST: &str = "package.json";

/// Key of the embedded config inside the package manifest.
pub const PACKAGE_CONFIG_KEY: &str = "lintConfig";

const SCHEMA_JSON: &str = include_str!("../schemas/lintrc.schema.json");
static CONFIG_SCHEMA: OnceLock<Result<Validator, String>> = OnceLock::new();

fn schema() -> Result<&'static Validator, BridgeError> {
    CONFIG_SCHEMA
        .get_or_init(|| {
            let schema_json: Value = serde_json::from_str(SCHEMA_JSON).map_err(|e| e.to_string())?;
            Validator::new(&schema_json).map_err(|e| e.to_string())
        })
        .as_ref()
        .map_err(|e| BridgeError::internal(format!("Invalid embedded config schema: {e}")))
}

/// Settings that apply to a file: the part of a config that merges.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSettings {
    #[serde(default)]
    pub parser: Option<String>,

    #[serde(default)]
    pub parser_options: Map<String, Value>,

    #[serde(default)]
    pub env: BTreeMap<String, bool>,

    #[serde(default)]
    pub globals: BTreeMap<String, Value>,

    #[serde(default)]
    pub plugins: Vec<String>,

    #[serde(default)]
    pub rules: BTreeMap<String, RuleSetting>,

    #[serde(default)]
    pub settings: Map<String, Value>,
}

impl FileSettings {
    /// Merges `closer` over `self`.
    ///
    /// - `parser`: closer wins
    /// - `parserOptions`, `settings`: deep object merge
    /// - `env`, `globals`: key merge
    /// - `plugins`: ordered union
    /// - `rules`: key merge; a closer severity-only entry keeps the options
    ///   already present
    pub fn merge_from(&mut self, closer: &FileSettings) {
        if let Some(parser) = &closer.parser {
            self.parser = Some(parser.clone());
        }
        deep_merge(&mut self.parser_options, &closer.parser_options);
        self.env
            .extend(closer.env.iter().map(|(k, v)| (k.clone(), *v)));
        self.globals
            .extend(closer.globals.iter().map(|(k, v)| (k.clone(), v.clone())));
        for plugin in &closer.plugins {
            if !self.plugins.contains(plugin) {
                self.plugins.push(plugin.clone());
            }
        }
        for (rule_id, setting) in &closer.rules {
            match self.rules.get_mut(rule_id) {
                Some(existing) if setting.options.is_empty() => {
                    existing.severity = setting.severity;
                }
                _ => {
                    self.rules.insert(rule_id.clone(), setting.clone());
                }
            }
        }
        deep_merge(&mut self.settings, &closer.settings);
    }

    /// Converts into the engine's config.
    pub fn to_effective(&self) -> EffectiveConfig {
        EffectiveConfig {
            parser: self.parser.clone(),
            parser_options: self.parser_options.clone(),
            env: self.env.clone(),
            globals: self.globals.clone(),
            plugins: self.plugins.clone(),
            rules: self.rules.clone(),
            settings: self.settings.clone(),
        }
    }
}

fn deep_merge(base: &mut Map<String, Value>, closer: &Map<String, Value>) {
    for (key, value) in closer {
        match (base.get_mut(key), value) {
            (Some(Value::Object(base_obj)), Value::Object(closer_obj)) => {
                deep_merge(base_obj, closer_obj);
            }
            _ => {
                base.insert(key.clone(), value.clone());
            }
        }
    }
}

/// A settings block applied to files matching `files` globs.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverrideBlock {
    #[serde(deserialize_with = "one_or_many")]
    pub files: Vec<String>,

    #[serde(default, deserialize_with = "one_or_many")]
    pub excluded_files: Vec<String>,

    #[serde(flatten)]
    pub settings: FileSettings,
}

/// The contents of one config file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigFragment {
    /// Stops the upward search at this directory.
    #[serde(default)]
    pub root: bool,

    /// Presets (`lint:<name>`) or relative config paths to build upon.
    #[serde(default, deserialize_with = "one_or_many")]
    pub extends: Vec<String>,

    /// Globs, relative to the config's directory, of files never linted.
    #[serde(default, deserialize_with = "one_or_many")]
    pub ignore_patterns: Vec<String>,

    #[serde(default)]
    pub overrides: Vec<OverrideBlock>,

    #[serde(flatten)]
    pub settings: FileSettings,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

fn one_or_many<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(item) => vec![item],
        OneOrMany::Many(items) => items,
    })
}

impl ConfigFragment {
    /// Parses a JSONC config document with schema validation.
    pub fn from_jsonc(text: &str) -> Result<Self, BridgeError> {
        Self::from_value(parse_jsonc(text)?)
    }

    /// Validates and deserializes a config value.
    pub fn from_value(value: Value) -> Result<Self, BridgeError> {
        if let Err(e) = schema()?.validate(&value) {
            return Err(BridgeError::config(format!(
                "Config validation failed: {} at {}",
                e,
                e.instance_path()
            )));
        }

        serde_json::from_value(value)
            .map_err(|e| BridgeError::config(format!("Invalid config: {}", e)))
    }

    /// Parses the contents of a conventional config file.
    ///
    /// Returns `Ok(None)` for a package manifest without an embedded config.
    pub fn from_file_text(file_name: &str, text: &str) -> Result<Option<Self>, BridgeError> {
        if file_name != PACKAGE_MANIFEST {
            return Self::from_jsonc(text).map(Some);
        }

        let mut manifest = parse_jsonc(text)?;
        match manifest.get_mut(PACKAGE_CONFIG_KEY).map(Value::take) {
            Some(config) => Self::from_value(config).map(Some),
            None => Ok(None),
        }
    }
}

fn parse_jsonc(text: &str) -> Result<Value, BridgeError> {
    let parse_options = jsonc_parser::ParseOptions::default();
    jsonc_parser::parse_to_serde_value(text, &parse_options)
        .map(|value| value.unwrap_or_else(|| Value::Object(Map::new())))
        .map_err(|e| BridgeError::config(format!("Invalid JSON: {}", e)))
}

/// Prefixes config errors with the offending file.
pub(crate) fn in_file(path: &Path) -> impl FnOnce(BridgeError) -> BridgeError + '_ {
    move |err| match err {
        BridgeError::ConfigResolution(message) => {
            BridgeError::config(format!("{}: {}", path.display(), message))
        }
        other => other,
    }
}

/// Loads the config fragment of `dir`, if it has one.
pub fn load_directory_config(
    host: &dyn ConfigHost,
    dir: &Path,
) -> Result<Option<(PathBuf, ConfigFragment)>, BridgeError> {
    for name in CONFIG_FILE_NAMES {
        let path = dir.join(name);
        let Some(text) = host.read_file(&path) else {
            continue;
        };
        if let Some(fragment) = ConfigFragment::from_file_text(name, &text).map_err(in_file(&path))? {
            return Ok(Some((path, fragment)));
        }
    }
    Ok(None)
}
