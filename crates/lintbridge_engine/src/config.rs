//! The effective configuration handed to the engine for one file.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Severity configured for a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RuleSeverity {
    /// Rule disabled (`0` / `"off"`).
    Off,
    /// Rule reports warnings (`1` / `"warn"`).
    Warn,
    /// Rule reports errors (`2` / `"error"`).
    Error,
}

impl RuleSeverity {
    /// Parses `0`/`1`/`2` or `"off"`/`"warn"`/`"error"` (case-insensitive).
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => match n.as_u64()? {
                0 => Some(Self::Off),
                1 => Some(Self::Warn),
                2 => Some(Self::Error),
                _ => None,
            },
            Value::String(s) => match s.to_ascii_lowercase().as_str() {
                "off" => Some(Self::Off),
                "warn" => Some(Self::Warn),
                "error" => Some(Self::Error),
                _ => None,
            },
            _ => None,
        }
    }

    /// Numeric level the engine reports findings with.
    pub fn level(self) -> u8 {
        match self {
            Self::Off => 0,
            Self::Warn => 1,
            Self::Error => 2,
        }
    }

    /// Canonical name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for RuleSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity plus options for one rule.
///
/// Accepts `2`, `"error"` or `["error", ...options]`; always serializes to
/// the array form with the severity name first.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleSetting {
    /// Configured severity.
    pub severity: RuleSeverity,
    /// Rule options following the severity.
    pub options: Vec<Value>,
}

impl RuleSetting {
    /// Creates a setting without options.
    pub fn new(severity: RuleSeverity) -> Self {
        Self {
            severity,
            options: Vec::new(),
        }
    }

    /// Appends a rule option.
    pub fn with_option(mut self, option: Value) -> Self {
        self.options.push(option);
        self
    }

    /// Returns true unless the rule is off.
    pub fn is_enabled(&self) -> bool {
        self.severity != RuleSeverity::Off
    }

    /// Parses a setting from its JSON form.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Array(items) => {
                let (first, rest) = items.split_first()?;
                Some(Self {
                    severity: RuleSeverity::from_value(first)?,
                    options: rest.to_vec(),
                })
            }
            other => Some(Self::new(RuleSeverity::from_value(other)?)),
        }
    }
}

impl Serialize for RuleSetting {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeSeq;

        let mut seq = serializer.serialize_seq(Some(self.options.len() + 1))?;
        seq.serialize_element(self.severity.as_str())?;
        for option in &self.options {
            seq.serialize_element(option)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for RuleSetting {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(&value)
            .ok_or_else(|| D::Error::custom(format!("invalid rule setting: {value}")))
    }
}

/// Fully merged configuration applicable to one file.
///
/// All maps are ordered so that resolving the same inputs twice serializes
/// to identical bytes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectiveConfig {
    /// Declared parser module identity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parser: Option<String>,

    /// Options forwarded to the parser.
    #[serde(default)]
    pub parser_options: Map<String, Value>,

    /// Enabled environments.
    #[serde(default)]
    pub env: BTreeMap<String, bool>,

    /// Declared globals (`"readonly"`, `"writable"`, `"off"`, or booleans).
    #[serde(default)]
    pub globals: BTreeMap<String, Value>,

    /// Plugins to load, in declaration order.
    #[serde(default)]
    pub plugins: Vec<String>,

    /// Rule settings by rule id.
    #[serde(default)]
    pub rules: BTreeMap<String, RuleSetting>,

    /// Shared settings visible to every rule.
    #[serde(default)]
    pub settings: Map<String, Value>,
}

impl EffectiveConfig {
    /// Creates an empty configuration (no parser, no rules).
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns enabled rules in id order.
    pub fn enabled_rules(&self) -> impl Iterator<Item = (&str, &RuleSetting)> {
        self.rules
            .iter()
            .filter(|(_, setting)| setting.is_enabled())
            .map(|(id, setting)| (id.as_str(), setting))
    }

    /// Returns true if no rule is enabled.
    pub fn has_no_rules(&self) -> bool {
        self.enabled_rules().next().is_none()
    }

    /// BLAKE3 hash of the serialized configuration.
    pub fn hash(&self) -> String {
        let json = serde_json::to_string(self).unwrap_or_default();
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }
}
