//! Flag materialization.
//!
//! [`build_flag_set`] walks a [`Catalog`] once and produces the ordered list
//! of options the command line parser presents: the config-file option
//! first, then one entry per bound variable in catalog order. Variables
//! without a binding are internal-only and never appear here.

use std::fmt;

use serde::Serialize;

use crate::{Catalog, DefinitionError, Value, VariableType};

/// Long name of the config-file option.
pub const CONFIG_FLAG: &str = "config";

/// Short alias of the config-file option.
pub const CONFIG_SHORT: char = 'c';

/// Environment variable of the config-file option.
pub const CONFIG_ENV_VAR: &str = "CONFIG";

const CONFIG_USAGE: &str = "chartmuseum configuration file";

/// Long names the command line parser claims for itself.
pub const PARSER_FLAGS: &[&str] = &["help", "version"];

/// Short names the command line parser claims for itself.
pub const PARSER_SHORTS: &[char] = &['h', 'V'];

/// How the parser should read an option's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FlagKind {
    /// Takes a text argument.
    String,
    /// Takes an integer argument.
    Int,
    /// Presence switch.
    Bool,
}

impl From<VariableType> for FlagKind {
    fn from(ty: VariableType) -> Self {
        match ty {
            VariableType::String => Self::String,
            VariableType::Int => Self::Int,
            VariableType::Bool => Self::Bool,
        }
    }
}

/// A single materialized option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlagSpec {
    /// Long flag name without dashes.
    pub name: String,
    /// Single-character alias.
    pub short: Option<char>,
    /// Environment variable name.
    pub env_var: String,
    /// Help text.
    pub usage: String,
    /// Parse rule.
    pub kind: FlagKind,
    /// Catalog default; `None` for the config-file option.
    pub default: Option<Value>,
    /// Catalog key; `None` for the config-file option.
    pub key: Option<String>,
}

impl FlagSpec {
    fn config_file() -> Self {
        Self {
            name: CONFIG_FLAG.to_string(),
            short: Some(CONFIG_SHORT),
            env_var: CONFIG_ENV_VAR.to_string(),
            usage: CONFIG_USAGE.to_string(),
            kind: FlagKind::String,
            default: None,
            key: None,
        }
    }

    /// Whether this is the config-file option rather than a catalog entry.
    pub fn is_config_file(&self) -> bool {
        self.key.is_none()
    }
}

impl fmt::Display for FlagSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "--{}", self.name)?;
        if let Some(short) = self.short {
            write!(f, ", -{short}")?;
        }
        write!(f, " [${}]", self.env_var)?;
        match &self.default {
            Some(Value::String(s)) => write!(f, " (default: {s:?})")?,
            Some(other) => write!(f, " (default: {other})")?,
            None => {}
        }
        Ok(())
    }
}

/// The ordered, read-only option list derived from a catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlagSet {
    flags: Vec<FlagSpec>,
}

impl FlagSet {
    /// Options in presentation order.
    pub fn iter(&self) -> std::slice::Iter<'_, FlagSpec> {
        self.flags.iter()
    }

    /// Number of options, including the config-file option.
    pub fn len(&self) -> usize {
        self.flags.len()
    }

    /// Always false: the config-file option is always present.
    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Find an option by long name.
    pub fn get(&self, name: &str) -> Option<&FlagSpec> {
        self.flags.iter().find(|flag| flag.name == name)
    }

    /// The config-file option.
    pub fn config_flag(&self) -> &FlagSpec {
        &self.flags[0]
    }

    /// Options that map to catalog variables.
    pub fn variables(&self) -> impl Iterator<Item = &FlagSpec> {
        self.flags.iter().filter(|flag| !flag.is_config_file())
    }
}

impl<'a> IntoIterator for &'a FlagSet {
    type Item = &'a FlagSpec;
    type IntoIter = std::slice::Iter<'a, FlagSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Derive the option list from a catalog.
///
/// The result is `1 + count(bound variables)` long and identical for
/// identical catalogs.
///
/// # Errors
///
/// Returns the first catalog invariant violation; nothing is produced for a
/// broken catalog.
///
/// # Example
///
/// ```
/// use chartmuseum_config::{build_flag_set, Catalog};
///
/// let catalog = Catalog::standard().unwrap();
/// let flags = build_flag_set(&catalog).unwrap();
/// assert_eq!(flags.config_flag().name, "config");
/// assert_eq!(flags.len(), 1 + catalog.bound().count());
/// ```
pub fn build_flag_set(catalog: &Catalog) -> Result<FlagSet, DefinitionError> {
    catalog.validate()?;

    let mut flags = Vec::with_capacity(1 + catalog.len());
    flags.push(FlagSpec::config_file());
    for (var, binding) in catalog.bound() {
        flags.push(FlagSpec {
            name: binding.flag_name().to_string(),
            short: binding.short(),
            env_var: binding.env_var().to_string(),
            usage: binding.usage().to_string(),
            kind: var.var_type().into(),
            default: Some(var.default_value().clone()),
            key: Some(var.key().to_string()),
        });
    }

    tracing::debug!(
        flags = flags.len(),
        variables = catalog.len(),
        "materialized configuration flags"
    );

    Ok(FlagSet { flags })
}
