//! Value types carried by configuration variables.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The type of a configuration variable.
///
/// Determines how a raw command line, environment or file value is coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableType {
    /// Free-form text.
    String,
    /// Signed integer.
    Int,
    /// Boolean switch.
    Bool,
}

impl VariableType {
    /// Lower-case name used in messages and help output.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Int => "int",
            Self::Bool => "bool",
        }
    }
}

impl fmt::Display for VariableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed configuration value.
///
/// The variant is the type: a default and its declared type cannot disagree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Text value.
    String(String),
    /// Integer value.
    Int(i64),
    /// Boolean value.
    Bool(bool),
}

impl Value {
    /// Type of this value.
    pub fn var_type(&self) -> VariableType {
        match self {
            Self::String(_) => VariableType::String,
            Self::Int(_) => VariableType::Int,
            Self::Bool(_) => VariableType::Bool,
        }
    }

    /// Text content, if this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Integer content, if this is an int value.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Boolean content, if this is a bool value.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Parse raw text into a value of the given type.
    ///
    /// Booleans accept `true/1/yes/on` and `false/0/no/off`, ignoring case.
    pub fn parse(ty: VariableType, raw: &str) -> Option<Self> {
        match ty {
            VariableType::String => Some(Self::String(raw.to_string())),
            VariableType::Int => raw.trim().parse().ok().map(Self::Int),
            VariableType::Bool => parse_bool(raw).map(Self::Bool),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Int(i) => write!(f, "{i}"),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Parse a boolean from a string.
pub(crate) fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
