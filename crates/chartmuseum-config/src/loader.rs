//! Configuration loader with layered approach.
//!
//! This module provides the [`ConfigLoader`] for resolving every catalog
//! variable from its sources: defaults, a config file, environment
//! variables and the command line.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde_json::Value as Json;

use crate::flags::CONFIG_ENV_VAR;
use crate::{
    Catalog, CliValues, ConfigError, EnvSnapshot, ResolvedConfig, ResolvedValue, Value,
    ValueSource, VariableType,
};

/// Values read from a configuration file, keyed by dotted catalog key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileValues {
    path: Option<PathBuf>,
    values: IndexMap<String, Value>,
}

impl FileValues {
    /// Read and parse a file. The format follows the extension.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - The file does not exist
    /// - The file cannot be read
    /// - The extension is not `.toml` or `.json`
    /// - The content is invalid, has unknown keys or mistyped values
    pub fn from_file<P: AsRef<Path>>(catalog: &Catalog, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);
        let format = match extension.as_deref() {
            Some(ext @ ("toml" | "json")) => ext,
            _ => {
                return Err(ConfigError::UnsupportedFormat {
                    path: path.to_path_buf(),
                })
            }
        };

        let mut values = Self::parse(catalog, &content, format)?;
        values.path = Some(path.to_path_buf());
        Ok(values)
    }

    /// Parse configuration content.
    ///
    /// # Arguments
    ///
    /// * `content` - Configuration content as a string
    /// * `format` - File format ("toml" or "json")
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if parsing fails, a key is not in the catalog,
    /// or a value does not match the variable's type.
    pub fn parse(catalog: &Catalog, content: &str, format: &str) -> Result<Self, ConfigError> {
        let document: Json = match format.to_lowercase().as_str() {
            "toml" => toml::from_str(content)?,
            "json" => serde_json::from_str(content)?,
            _ => {
                return Err(ConfigError::invalid_config(format!(
                    "unsupported configuration format: {format}"
                )))
            }
        };

        let mut leaves = Vec::new();
        match &document {
            Json::Object(_) => flatten("", &document, &mut leaves),
            Json::Null => {}
            _ => {
                return Err(ConfigError::invalid_config(
                    "configuration file must contain a table of settings",
                ))
            }
        }

        let mut values = IndexMap::new();
        for (key, raw) in leaves {
            let var = catalog
                .lookup(&key)
                .ok_or_else(|| ConfigError::unknown_field(key.as_str()))?;
            let value = coerce(var.var_type(), raw).ok_or_else(|| {
                ConfigError::invalid_value(key.as_str(), format!("expected {}", var.var_type()))
            })?;
            values.insert(key, value);
        }

        Ok(Self { path: None, values })
    }

    /// Path the values were read from.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Value for a key, if the file set it.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Number of keys set.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the file set nothing.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// Collect non-table leaves as (dotted key, value)
fn flatten<'a>(prefix: &str, value: &'a Json, out: &mut Vec<(String, &'a Json)>) {
    match value {
        Json::Object(map) => {
            for (k, v) in map {
                let key = if prefix.is_empty() {
                    k.clone()
                } else {
                    format!("{prefix}.{k}")
                };
                flatten(&key, v, out);
            }
        }
        leaf => out.push((prefix.to_string(), leaf)),
    }
}

fn coerce(ty: VariableType, raw: &Json) -> Option<Value> {
    match (ty, raw) {
        (VariableType::String, Json::String(s)) => Some(Value::String(s.clone())),
        (VariableType::Int, Json::Number(n)) => n.as_i64().map(Value::Int),
        (VariableType::Bool, Json::Bool(b)) => Some(Value::Bool(*b)),
        _ => None,
    }
}

/// Configuration loader with layered approach.
///
/// The loader resolves each catalog variable from the highest layer that
/// sets it:
/// 1. Command line flags
/// 2. Environment variables
/// 3. Configuration file (TOML or JSON)
/// 4. Catalog defaults
///
/// Only variables with an external binding read the command line and the
/// environment. The config file path comes from an explicit
/// [`with_file`](Self::with_file), else `--config`/`-c`, else `CONFIG`.
///
/// # Example
///
/// ```
/// use chartmuseum_config::{Catalog, CliValues, ConfigLoader, EnvSnapshot, ValueSource};
///
/// let catalog = Catalog::standard().unwrap();
/// let config = ConfigLoader::new(&catalog)
///     .with_env(EnvSnapshot::from_pairs([("PORT", "9000"), ("DEBUG", "true")]))
///     .with_cli(CliValues::new().with_value("port", 9090))
///     .load()
///     .unwrap();
///
/// assert_eq!(config.int("port"), Some(9090));
/// assert_eq!(config.source("port"), Some(ValueSource::CommandLine));
/// assert_eq!(config.bool("debug"), Some(true));
/// ```
#[derive(Debug)]
pub struct ConfigLoader<'a> {
    catalog: &'a Catalog,
    file: Option<FileValues>,
    env: EnvSnapshot,
    cli: CliValues,
}

impl<'a> ConfigLoader<'a> {
    /// Create a loader with no file, an empty environment and no flags.
    #[must_use]
    pub fn new(catalog: &'a Catalog) -> Self {
        Self {
            catalog,
            file: None,
            env: EnvSnapshot::empty(),
            cli: CliValues::new(),
        }
    }

    /// Load configuration from a file.
    ///
    /// Supports TOML (.toml) and JSON (.json) formats.
    ///
    /// # Errors
    ///
    /// See [`FileValues::from_file`].
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        self.file = Some(FileValues::from_file(self.catalog, path)?);
        Ok(self)
    }

    /// Load configuration from a file if it exists.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be loaded.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Load configuration from a string.
    ///
    /// # Errors
    ///
    /// See [`FileValues::parse`].
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.file = Some(FileValues::parse(self.catalog, content, format)?);
        Ok(self)
    }

    /// Use already-parsed file values.
    #[must_use]
    pub fn with_file_values(mut self, values: FileValues) -> Self {
        self.file = Some(values);
        self
    }

    /// Set the environment snapshot.
    #[must_use]
    pub fn with_env(mut self, env: EnvSnapshot) -> Self {
        self.env = env;
        self
    }

    /// Set the command line values.
    #[must_use]
    pub fn with_cli(mut self, cli: CliValues) -> Self {
        self.cli = cli;
        self
    }

    /// Path of the config file named by the command line or environment.
    pub fn requested_config_path(&self) -> Option<PathBuf> {
        self.cli
            .config_path()
            .map(Path::to_path_buf)
            .or_else(|| {
                self.env
                    .get(CONFIG_ENV_VAR)
                    .filter(|p| !p.is_empty())
                    .map(PathBuf::from)
            })
    }

    /// Resolve every catalog variable.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - A requested config file cannot be loaded
    /// - An environment variable cannot be parsed as its variable's type
    pub fn load(mut self) -> Result<ResolvedConfig, ConfigError> {
        if self.file.is_none() {
            if let Some(path) = self.requested_config_path() {
                self.file = Some(FileValues::from_file(self.catalog, &path)?);
            }
        }
        let file = self.file.unwrap_or_default();
        if let Some(path) = file.path() {
            tracing::info!(path = %path.display(), keys = file.len(), "loaded configuration file");
        }

        let mut values = IndexMap::with_capacity(self.catalog.len());
        for var in self.catalog.all() {
            let key = var.key();
            let mut resolved = None;

            if let Some(binding) = var.binding() {
                if let Some(value) = self.cli.get(key) {
                    resolved = Some((value.clone(), ValueSource::CommandLine));
                } else if let Some(raw) =
                    self.env.get(binding.env_var()).filter(|v| !v.is_empty())
                {
                    let value = Value::parse(var.var_type(), raw).ok_or_else(|| {
                        ConfigError::env_parse_error(
                            binding.env_var(),
                            format!("expected {}", var.var_type()),
                        )
                    })?;
                    resolved = Some((value, ValueSource::Env));
                }
            }

            let (value, source) = match resolved {
                Some(found) => found,
                None => match file.get(key) {
                    Some(value) => (value.clone(), ValueSource::File),
                    None => (var.default_value().clone(), ValueSource::Default),
                },
            };
            if value.var_type() != var.var_type() {
                return Err(ConfigError::invalid_value(
                    key,
                    format!("expected {}, got {}", var.var_type(), value.var_type()),
                ));
            }
            tracing::trace!(key, %source, "resolved configuration variable");
            values.insert(key.to_string(), ResolvedValue { value, source });
        }

        Ok(ResolvedConfig::new(values, file.path().map(Path::to_path_buf)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ConfigVariable, ExternalBinding};

    fn catalog() -> Catalog {
        Catalog::standard().unwrap()
    }

    #[test]
    fn test_loader_defaults() {
        let catalog = catalog();
        let config = ConfigLoader::new(&catalog).load().unwrap();
        assert_eq!(config.len(), catalog.len());
        assert_eq!(config.int("port"), Some(8080));
        assert_eq!(config.string("chartpostformfieldname"), Some("chart"));
        assert_eq!(config.source("port"), Some(ValueSource::Default));
        assert!(config.config_file().is_none());
    }

    #[test]
    fn test_loader_with_string_toml() {
        let catalog = catalog();
        let toml = r#"
            port = 9000
            debug = true

            [storage]
            backend = "local"

            [storage.local]
            rootdir = "/var/charts"
        "#;

        let config = ConfigLoader::new(&catalog)
            .with_string(toml, "toml")
            .unwrap()
            .load()
            .unwrap();

        assert_eq!(config.int("port"), Some(9000));
        assert_eq!(config.bool("debug"), Some(true));
        assert_eq!(config.string("storage.backend"), Some("local"));
        assert_eq!(config.string("storage.local.rootdir"), Some("/var/charts"));
        assert_eq!(config.source("storage.local.rootdir"), Some(ValueSource::File));
        assert_eq!(config.source("depth"), Some(ValueSource::Default));
    }

    #[test]
    fn test_loader_with_string_json() {
        let catalog = catalog();
        let json = r#"{"basicauth": {"user": "admin"}, "tls.cert": "/tls/cert.pem"}"#;

        let config = ConfigLoader::new(&catalog)
            .with_string(json, "json")
            .unwrap()
            .load()
            .unwrap();

        assert_eq!(config.string("basicauth.user"), Some("admin"));
        assert_eq!(config.string("tls.cert"), Some("/tls/cert.pem"));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = FileValues::parse(&catalog(), "[storage]\nbackend2 = \"x\"", "toml")
            .unwrap_err();
        match err {
            ConfigError::UnknownField { key } => assert_eq!(key, "storage.backend2"),
            other => panic!("expected UnknownField, got {other}"),
        }
    }

    #[test]
    fn test_mistyped_file_value_rejected() {
        let err = FileValues::parse(&catalog(), "port = \"8080\"", "toml").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "port"));
    }

    #[test]
    fn test_unsupported_format_string() {
        assert!(FileValues::parse(&catalog(), "port: 1", "yaml").is_err());
    }

    #[test]
    fn test_non_table_document_rejected() {
        assert!(FileValues::parse(&catalog(), "[1, 2]", "json").is_err());
    }

    #[test]
    fn test_loader_with_file_not_found() {
        let catalog = catalog();
        let result = ConfigLoader::new(&catalog).with_file("/nonexistent/chartmuseum.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound { .. })));
    }

    #[test]
    fn test_loader_with_optional_file_not_found() {
        let catalog = catalog();
        let config = ConfigLoader::new(&catalog)
            .with_optional_file("/nonexistent/chartmuseum.toml")
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(config.int("port"), Some(8080));
    }

    #[test]
    fn test_env_overrides_file() {
        let catalog = catalog();
        let config = ConfigLoader::new(&catalog)
            .with_string("port = 9000\ndepth = 1", "toml")
            .unwrap()
            .with_env(EnvSnapshot::from_pairs([("PORT", "9100")]))
            .load()
            .unwrap();
        assert_eq!(config.int("port"), Some(9100));
        assert_eq!(config.source("port"), Some(ValueSource::Env));
        assert_eq!(config.int("depth"), Some(1));
    }

    #[test]
    fn test_cli_overrides_env() {
        let catalog = catalog();
        let config = ConfigLoader::new(&catalog)
            .with_env(EnvSnapshot::from_pairs([("STORAGE", "amazon")]))
            .with_cli(CliValues::new().with_value("storage.backend", "google"))
            .load()
            .unwrap();
        assert_eq!(config.string("storage.backend"), Some("google"));
        assert_eq!(config.source("storage.backend"), Some(ValueSource::CommandLine));
    }

    #[test]
    fn test_env_bool_forms() {
        let catalog = catalog();
        let config = ConfigLoader::new(&catalog)
            .with_env(EnvSnapshot::from_pairs([
                ("DEBUG", "yes"),
                ("LOG_JSON", "1"),
                ("DISABLE_API", "OFF"),
            ]))
            .load()
            .unwrap();
        assert_eq!(config.bool("debug"), Some(true));
        assert_eq!(config.bool("logjson"), Some(true));
        assert_eq!(config.bool("disableapi"), Some(false));
    }

    #[test]
    fn test_empty_env_value_is_unset() {
        let catalog = catalog();
        let config = ConfigLoader::new(&catalog)
            .with_string("debug = true\n[storage]\nbackend = \"local\"", "toml")
            .unwrap()
            .with_env(EnvSnapshot::from_pairs([
                ("DEBUG", ""),
                ("PORT", ""),
                ("STORAGE", ""),
            ]))
            .load()
            .unwrap();
        assert_eq!(config.bool("debug"), Some(true));
        assert_eq!(config.source("debug"), Some(ValueSource::File));
        assert_eq!(config.int("port"), Some(8080));
        assert_eq!(config.source("port"), Some(ValueSource::Default));
        assert_eq!(config.string("storage.backend"), Some("local"));
    }

    #[test]
    fn test_invalid_env_int() {
        let catalog = catalog();
        let err = ConfigLoader::new(&catalog)
            .with_env(EnvSnapshot::from_pairs([("INDEX_LIMIT", "lots")]))
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigError::EnvParseError { ref var, .. } if var == "INDEX_LIMIT"));
    }

    #[test]
    fn test_internal_variable_ignores_env() {
        let catalog = Catalog::from_variables([
            ConfigVariable::string("internal.mode", "fast"),
            ConfigVariable::int("port", 8080)
                .with_binding(ExternalBinding::new("port", "PORT", "port to listen on")),
        ])
        .unwrap();
        let config = ConfigLoader::new(&catalog)
            .with_env(EnvSnapshot::from_pairs([("INTERNAL_MODE", "slow")]))
            .with_string(r#"internal = { mode = "file" }"#, "toml")
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(config.string("internal.mode"), Some("file"));
        assert_eq!(config.source("internal.mode"), Some(ValueSource::File));
    }

    #[test]
    fn test_requested_config_path_prefers_cli() {
        let catalog = catalog();
        let loader = ConfigLoader::new(&catalog)
            .with_env(EnvSnapshot::from_pairs([("CONFIG", "/env.toml")]))
            .with_cli(CliValues::new().with_config_path("/cli.toml"));
        assert_eq!(loader.requested_config_path(), Some(PathBuf::from("/cli.toml")));

        let loader = ConfigLoader::new(&catalog)
            .with_env(EnvSnapshot::from_pairs([("CONFIG", "/env.toml")]));
        assert_eq!(loader.requested_config_path(), Some(PathBuf::from("/env.toml")));
    }

    #[test]
    fn test_requested_missing_config_fails() {
        let catalog = catalog();
        let err = ConfigLoader::new(&catalog)
            .with_env(EnvSnapshot::from_pairs([("CONFIG", "/nonexistent/chartmuseum.toml")]))
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));
    }
}
