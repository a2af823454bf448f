//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

use crate::VariableType;

/// Errors raised while defining the catalog.
///
/// These are startup-fatal: a catalog that fails to define or materialize
/// must abort the process before any flags are exposed. Every variant names
/// the key that caused it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DefinitionError {
    /// A variable was defined with an empty key.
    #[error("configuration variable key must not be empty")]
    EmptyKey,

    /// Two variables share the same key.
    #[error("duplicate configuration variable key: {key}")]
    DuplicateKey {
        /// The repeated key.
        key: String,
    },

    /// Two bindings share the same flag name.
    #[error("flag --{flag} of {key} is already bound to {existing}")]
    DuplicateFlag {
        /// Key being defined.
        key: String,
        /// The colliding flag name.
        flag: String,
        /// Key that already owns the flag.
        existing: String,
    },

    /// Two bindings share the same short alias.
    #[error("short flag -{short} of {key} is already bound to {existing}")]
    DuplicateShort {
        /// Key being defined.
        key: String,
        /// The colliding alias.
        short: char,
        /// Key that already owns the alias.
        existing: String,
    },

    /// Two bindings share the same environment variable.
    #[error("environment variable {env_var} of {key} is already bound to {existing}")]
    DuplicateEnvVar {
        /// Key being defined.
        key: String,
        /// The colliding environment variable.
        env_var: String,
        /// Key that already owns the variable.
        existing: String,
    },

    /// The default value does not match the declared type.
    #[error("default for {key} is {actual} but the variable is declared {expected}")]
    TypeMismatch {
        /// Key being defined.
        key: String,
        /// Declared type.
        expected: VariableType,
        /// Type of the supplied default.
        actual: VariableType,
    },

    /// The flag name is not lower-case kebab.
    #[error("invalid flag name {flag:?} for {key}")]
    InvalidFlagName {
        /// Key being defined.
        key: String,
        /// The rejected flag name.
        flag: String,
    },

    /// The environment variable name is not upper-case snake.
    #[error("invalid environment variable name {env_var:?} for {key}")]
    InvalidEnvVar {
        /// Key being defined.
        key: String,
        /// The rejected name.
        env_var: String,
    },

    /// The binding reuses a name owned by the config-file option.
    #[error("{name} of {key} is reserved for the configuration file option")]
    ReservedName {
        /// Key being defined.
        key: String,
        /// The reserved name.
        name: String,
    },
}

impl DefinitionError {
    /// Key of the variable that caused the error, if any.
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::EmptyKey => None,
            Self::DuplicateKey { key }
            | Self::DuplicateFlag { key, .. }
            | Self::DuplicateShort { key, .. }
            | Self::DuplicateEnvVar { key, .. }
            | Self::TypeMismatch { key, .. }
            | Self::InvalidFlagName { key, .. }
            | Self::InvalidEnvVar { key, .. }
            | Self::ReservedName { key, .. } => Some(key),
        }
    }
}

/// Errors that can occur while resolving configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The catalog violates one of its invariants.
    #[error("invalid configuration catalog: {0}")]
    Definition(#[from] DefinitionError),

    /// Configuration file not found.
    #[error("configuration file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// Failed to read configuration file.
    #[error("failed to read configuration file: {path}")]
    ReadError {
        /// Path to the file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// TOML parsing error.
    #[error("failed to parse TOML configuration: {0}")]
    TomlError(#[from] toml::de::Error),

    /// TOML rendering error.
    #[error("failed to render TOML configuration: {0}")]
    TomlRenderError(#[from] toml::ser::Error),

    /// JSON parsing error.
    #[error("failed to parse JSON configuration: {0}")]
    JsonError(#[from] serde_json::Error),

    /// The file extension is not a supported format.
    #[error("unsupported configuration file format: {path}")]
    UnsupportedFormat {
        /// Path of the rejected file.
        path: PathBuf,
    },

    /// Unknown key in a configuration file (strict mode).
    #[error("unknown configuration key: {key}")]
    UnknownField {
        /// Dotted key that has no catalog entry.
        key: String,
    },

    /// Invalid configuration value.
    #[error("invalid configuration value for {key}: {reason}")]
    InvalidValue {
        /// The key with the invalid value.
        key: String,
        /// Explanation of why the value is invalid.
        reason: String,
    },

    /// Environment variable parsing error.
    #[error("failed to parse environment variable {var}: {reason}")]
    EnvParseError {
        /// The environment variable name.
        var: String,
        /// Explanation of the parsing error.
        reason: String,
    },

    /// Command line parsing error.
    #[error(transparent)]
    Cli(#[from] clap::Error),

    /// Invalid configuration for a component.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the configuration error.
        message: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    /// Create a new file not found error.
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Create a new read error.
    pub fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadError {
            path: path.into(),
            source,
        }
    }

    /// Create a new unknown field error.
    pub fn unknown_field(key: impl Into<String>) -> Self {
        Self::UnknownField { key: key.into() }
    }

    /// Create a new invalid value error.
    pub fn invalid_value(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Create a new environment variable parse error.
    pub fn env_parse_error(var: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::EnvParseError {
            var: var.into(),
            reason: reason.into(),
        }
    }

    /// Create a new invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}
