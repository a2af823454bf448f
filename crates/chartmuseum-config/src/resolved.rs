//! Resolved configuration.

use std::fmt;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value as Json};

use crate::{ConfigError, Settings, Value};

/// Keys whose values are masked when rendered.
const SECRET_KEYS: &[&str] = &["basicauth.pass"];

const REDACTED: &str = "<redacted>";

/// Layer that supplied an effective value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueSource {
    /// Catalog default.
    Default,
    /// Configuration file.
    File,
    /// Environment variable.
    Env,
    /// Command line flag.
    CommandLine,
}

impl fmt::Display for ValueSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Default => "default",
            Self::File => "file",
            Self::Env => "env",
            Self::CommandLine => "command line",
        })
    }
}

/// An effective value and where it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedValue {
    /// The value.
    pub value: Value,
    /// The layer it came from.
    pub source: ValueSource,
}

/// Effective configuration, one entry per catalog variable in catalog order.
///
/// Built by [`ConfigLoader`](crate::ConfigLoader) and never mutated
/// afterwards; a reload produces a new instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedConfig {
    values: IndexMap<String, ResolvedValue>,
    config_file: Option<PathBuf>,
}

impl ResolvedConfig {
    pub(crate) fn new(
        values: IndexMap<String, ResolvedValue>,
        config_file: Option<PathBuf>,
    ) -> Self {
        Self {
            values,
            config_file,
        }
    }

    /// Effective value of a key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key).map(|r| &r.value)
    }

    /// Layer that supplied a key's value.
    pub fn source(&self, key: &str) -> Option<ValueSource> {
        self.values.get(key).map(|r| r.source)
    }

    /// String value of a key; `None` if missing or not a string.
    pub fn string(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Integer value of a key; `None` if missing or not an int.
    pub fn int(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_int)
    }

    /// Boolean value of a key; `None` if missing or not a bool.
    pub fn bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    /// All entries in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ResolvedValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether there are no entries.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The config file that was read, if any.
    pub fn config_file(&self) -> Option<&Path> {
        self.config_file.as_deref()
    }

    /// Nest dotted keys into objects: `tls.cert` becomes `{"tls": {"cert": ..}}`.
    ///
    /// # Errors
    ///
    /// Fails if one key is a prefix of another, e.g. both `tls` and
    /// `tls.cert`.
    pub fn to_nested_json(&self) -> Result<Json, ConfigError> {
        self.nest(|_, value| to_json(value))
    }

    /// Deserialize into the typed [`Settings`] view.
    pub fn settings(&self) -> Result<Settings, ConfigError> {
        Ok(serde_json::from_value(self.to_nested_json()?)?)
    }

    /// Render as TOML with secrets masked.
    pub fn redacted_toml(&self) -> Result<String, ConfigError> {
        let nested = self.nest(|key, value| match value {
            Value::String(s) if !s.is_empty() && SECRET_KEYS.contains(&key) => {
                Json::String(REDACTED.to_string())
            }
            other => to_json(other),
        })?;
        Ok(toml::to_string_pretty(&nested)?)
    }

    fn nest(&self, convert: impl Fn(&str, &Value) -> Json) -> Result<Json, ConfigError> {
        let mut root = Map::new();
        for (key, resolved) in &self.values {
            let mut parts = key.split('.').peekable();
            let mut table = &mut root;
            while let Some(part) = parts.next() {
                if parts.peek().is_none() {
                    if table.contains_key(part) {
                        return Err(ConfigError::invalid_config(format!(
                            "key {key} overlaps a nested table"
                        )));
                    }
                    table.insert(part.to_string(), convert(key, &resolved.value));
                    break;
                }
                let entry = table
                    .entry(part.to_string())
                    .or_insert_with(|| Json::Object(Map::new()));
                table = match entry {
                    Json::Object(map) => map,
                    _ => {
                        return Err(ConfigError::invalid_config(format!(
                            "key {key} nests under a value"
                        )))
                    }
                };
            }
        }
        Ok(Json::Object(root))
    }
}

fn to_json(value: &Value) -> Json {
    match value {
        Value::String(s) => Json::String(s.clone()),
        Value::Int(i) => Json::from(*i),
        Value::Bool(b) => Json::Bool(*b),
    }
}
