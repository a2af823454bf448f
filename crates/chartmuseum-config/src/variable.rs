//! Configuration variable descriptors.

use serde::Serialize;

use crate::{DefinitionError, Value, VariableType};

/// Command line and environment projection of a variable.
///
/// # Example
///
/// ```
/// use chartmuseum_config::ExternalBinding;
///
/// let binding = ExternalBinding::new("--port", "PORT", "port to listen on");
/// assert_eq!(binding.flag_name(), "port");
/// assert_eq!(binding.env_var(), "PORT");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExternalBinding {
    flag_name: String,
    short: Option<char>,
    env_var: String,
    usage: String,
}

impl ExternalBinding {
    /// Create a binding. A leading `--` on the flag name is dropped.
    pub fn new(
        flag_name: impl Into<String>,
        env_var: impl Into<String>,
        usage: impl Into<String>,
    ) -> Self {
        let flag_name = flag_name.into();
        let flag_name = match flag_name.strip_prefix("--") {
            Some(stripped) => stripped.to_string(),
            None => flag_name,
        };
        Self {
            flag_name,
            short: None,
            env_var: env_var.into(),
            usage: usage.into(),
        }
    }

    /// Create a binding whose names follow the key.
    ///
    /// `storage.amazon.bucket` becomes `--storage-amazon-bucket` and
    /// `STORAGE_AMAZON_BUCKET`.
    pub fn derived(key: &str, usage: impl Into<String>) -> Self {
        Self::new(
            key.replace('.', "-").to_lowercase(),
            key.replace(['.', '-'], "_").to_uppercase(),
            usage,
        )
    }

    /// Add a single-character alias.
    #[must_use]
    pub fn with_short(mut self, short: char) -> Self {
        self.short = Some(short);
        self
    }

    /// Long flag name without the leading dashes.
    pub fn flag_name(&self) -> &str {
        &self.flag_name
    }

    /// Single-character alias, if any.
    pub fn short(&self) -> Option<char> {
        self.short
    }

    /// Environment variable name.
    pub fn env_var(&self) -> &str {
        &self.env_var
    }

    /// Help text.
    pub fn usage(&self) -> &str {
        &self.usage
    }
}

/// One entry of the catalog.
///
/// The declared type is derived from the default, so the two always agree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigVariable {
    key: String,
    default: Value,
    binding: Option<ExternalBinding>,
}

impl ConfigVariable {
    /// Create an internal-only variable.
    pub fn new(key: impl Into<String>, default: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            default: default.into(),
            binding: None,
        }
    }

    /// Create a string variable.
    pub fn string(key: impl Into<String>, default: &str) -> Self {
        Self::new(key, default)
    }

    /// Create an int variable.
    pub fn int(key: impl Into<String>, default: i64) -> Self {
        Self::new(key, default)
    }

    /// Create a bool variable.
    pub fn bool(key: impl Into<String>, default: bool) -> Self {
        Self::new(key, default)
    }

    /// Create a variable from a separate type tag and default.
    ///
    /// Used when definitions come from data rather than code.
    ///
    /// # Example
    ///
    /// ```
    /// use chartmuseum_config::{ConfigVariable, Value, VariableType};
    ///
    /// assert!(ConfigVariable::typed("port", VariableType::Int, Value::Int(8080)).is_ok());
    /// assert!(ConfigVariable::typed("port", VariableType::Int, Value::from("8080")).is_err());
    /// ```
    pub fn typed(
        key: impl Into<String>,
        ty: VariableType,
        default: Value,
    ) -> Result<Self, DefinitionError> {
        let key = key.into();
        if default.var_type() != ty {
            return Err(DefinitionError::TypeMismatch {
                key,
                expected: ty,
                actual: default.var_type(),
            });
        }
        Ok(Self::new(key, default))
    }

    /// Attach a command line and environment binding.
    #[must_use]
    pub fn with_binding(mut self, binding: ExternalBinding) -> Self {
        self.binding = Some(binding);
        self
    }

    /// Dotted key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Declared type.
    pub fn var_type(&self) -> VariableType {
        self.default.var_type()
    }

    /// Default value.
    pub fn default_value(&self) -> &Value {
        &self.default
    }

    /// External binding, or `None` for internal-only variables.
    pub fn binding(&self) -> Option<&ExternalBinding> {
        self.binding.as_ref()
    }

    /// Whether the variable is exposed on the command line and environment.
    pub fn is_bound(&self) -> bool {
        self.binding.is_some()
    }
}
