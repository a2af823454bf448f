//! The variable catalog.
//!
//! A [`Catalog`] is the authoritative, ordered set of configuration variables
//! the server recognizes. Entries keep their declaration order so every
//! consumer (flag materialization, help output, config rendering) sees the
//! same sequence on every run.
//!
//! # Example
//!
//! ```
//! use chartmuseum_config::{Catalog, ConfigVariable, ExternalBinding, Value};
//!
//! # fn main() -> Result<(), chartmuseum_config::DefinitionError> {
//! let mut catalog = Catalog::new();
//! catalog.define(
//!     ConfigVariable::int("port", 8080)
//!         .with_binding(ExternalBinding::new("port", "PORT", "port to listen on")),
//! )?;
//!
//! assert_eq!(catalog.default_value("port"), Some(&Value::Int(8080)));
//! assert!(catalog.lookup("nonexistent.key").is_none());
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::{
    ConfigVariable, DefinitionError, ExternalBinding, Value, VariableType, CONFIG_ENV_VAR,
    CONFIG_FLAG, CONFIG_SHORT, PARSER_FLAGS, PARSER_SHORTS,
};

/// Ordered collection of configuration variables.
///
/// Invariants enforced by [`Catalog::define`]:
/// - keys are non-empty and unique
/// - flag names, short aliases and environment variables are unique,
///   including against the config-file option
/// - every default matches its declared type
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    vars: IndexMap<String, ConfigVariable>,
    flags: HashMap<String, String>,
    shorts: HashMap<char, String>,
    env_vars: HashMap<String, String>,
}

impl Catalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from variables in order, failing on the first
    /// invalid definition.
    pub fn from_variables<I>(vars: I) -> Result<Self, DefinitionError>
    where
        I: IntoIterator<Item = ConfigVariable>,
    {
        let mut catalog = Self::new();
        for var in vars {
            catalog.define(var)?;
        }
        Ok(catalog)
    }

    /// Register a variable.
    ///
    /// # Errors
    ///
    /// Returns a [`DefinitionError`] naming the key if the key is empty or
    /// already defined, or if the binding collides with an existing binding
    /// or the config-file option. The catalog is left unchanged on error.
    pub fn define(&mut self, var: ConfigVariable) -> Result<(), DefinitionError> {
        let key = var.key();
        if key.is_empty() {
            return Err(DefinitionError::EmptyKey);
        }
        if self.vars.contains_key(key) {
            return Err(DefinitionError::DuplicateKey {
                key: key.to_string(),
            });
        }
        if let Some(binding) = var.binding() {
            self.check_binding(key, binding)?;
            self.flags
                .insert(binding.flag_name().to_string(), key.to_string());
            if let Some(short) = binding.short() {
                self.shorts.insert(short, key.to_string());
            }
            self.env_vars
                .insert(binding.env_var().to_string(), key.to_string());
        }
        self.vars.insert(key.to_string(), var);
        Ok(())
    }

    /// Register a variable from a separate type tag and default.
    ///
    /// # Errors
    ///
    /// Fails like [`Catalog::define`], and with
    /// [`DefinitionError::TypeMismatch`] when `default` is not of type `ty`.
    pub fn define_typed(
        &mut self,
        key: impl Into<String>,
        ty: VariableType,
        default: Value,
        binding: Option<ExternalBinding>,
    ) -> Result<(), DefinitionError> {
        let var = ConfigVariable::typed(key, ty, default)?;
        let var = match binding {
            Some(binding) => var.with_binding(binding),
            None => var,
        };
        self.define(var)
    }

    /// Exact-match lookup.
    pub fn lookup(&self, key: &str) -> Option<&ConfigVariable> {
        self.vars.get(key)
    }

    /// Default value of a variable.
    pub fn default_value(&self, key: &str) -> Option<&Value> {
        self.lookup(key).map(ConfigVariable::default_value)
    }

    /// Every variable, in declaration order.
    pub fn all(&self) -> impl Iterator<Item = &ConfigVariable> {
        self.vars.values()
    }

    /// Variables that carry an external binding, in declaration order.
    pub fn bound(&self) -> impl Iterator<Item = (&ConfigVariable, &ExternalBinding)> {
        self.all().filter_map(|var| var.binding().map(|b| (var, b)))
    }

    /// Key owning the given environment variable.
    pub fn key_for_env(&self, env_var: &str) -> Option<&str> {
        self.env_vars.get(env_var).map(String::as_str)
    }

    /// Key owning the given flag name.
    pub fn key_for_flag(&self, flag: &str) -> Option<&str> {
        self.flags.get(flag).map(String::as_str)
    }

    /// Number of variables.
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Whether the catalog has no variables.
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Re-check every invariant from scratch.
    ///
    /// # Errors
    ///
    /// Returns the first violation found, in declaration order.
    pub fn validate(&self) -> Result<(), DefinitionError> {
        Self::from_variables(self.all().cloned()).map(|_| ())
    }

    fn check_binding(&self, key: &str, binding: &ExternalBinding) -> Result<(), DefinitionError> {
        let flag = binding.flag_name();
        if !is_valid_flag_name(flag) {
            return Err(DefinitionError::InvalidFlagName {
                key: key.to_string(),
                flag: flag.to_string(),
            });
        }
        if !is_valid_env_var(binding.env_var()) {
            return Err(DefinitionError::InvalidEnvVar {
                key: key.to_string(),
                env_var: binding.env_var().to_string(),
            });
        }

        if flag == CONFIG_FLAG || PARSER_FLAGS.contains(&flag) {
            return Err(reserved(key, format!("--{flag}")));
        }
        if let Some(short) = binding.short() {
            if short == CONFIG_SHORT || PARSER_SHORTS.contains(&short) {
                return Err(reserved(key, format!("-{short}")));
            }
        }
        if binding.env_var() == CONFIG_ENV_VAR {
            return Err(reserved(key, CONFIG_ENV_VAR.to_string()));
        }

        if let Some(existing) = self.flags.get(flag) {
            return Err(DefinitionError::DuplicateFlag {
                key: key.to_string(),
                flag: flag.to_string(),
                existing: existing.clone(),
            });
        }
        if let Some(short) = binding.short() {
            if let Some(existing) = self.shorts.get(&short) {
                return Err(DefinitionError::DuplicateShort {
                    key: key.to_string(),
                    short,
                    existing: existing.clone(),
                });
            }
        }
        if let Some(existing) = self.env_vars.get(binding.env_var()) {
            return Err(DefinitionError::DuplicateEnvVar {
                key: key.to_string(),
                env_var: binding.env_var().to_string(),
                existing: existing.clone(),
            });
        }
        Ok(())
    }
}

fn reserved(key: &str, name: String) -> DefinitionError {
    DefinitionError::ReservedName {
        key: key.to_string(),
        name,
    }
}

fn is_valid_flag_name(flag: &str) -> bool {
    !flag.is_empty()
        && !flag.starts_with('-')
        && flag
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

fn is_valid_env_var(env_var: &str) -> bool {
    !env_var.is_empty()
        && !env_var.starts_with(|c: char| c.is_ascii_digit())
        && env_var
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}
