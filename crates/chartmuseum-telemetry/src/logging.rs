//! Structured logging setup.
//!
//! Output goes to stderr so a configuration dump on stdout stays clean.
//! JSON lines are meant for log collectors; the pretty layout is for
//! operators reading a terminal.

use crate::error::TelemetryError;
use crate::TelemetryResult;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Whether logging is enabled.
    pub enabled: bool,

    /// Filter directives (e.g., "info", "chartmuseum_config=trace,warn").
    pub level: String,

    /// Whether to output JSON format.
    pub json_format: bool,

    /// Whether to include file/line info.
    pub file_line_info: bool,

    /// Whether to include target (module path).
    pub include_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            json_format: false,
            file_line_info: false,
            include_target: true,
        }
    }
}

impl LogConfig {
    /// Map the server's `debug` and `logjson` switches onto a configuration.
    ///
    /// `debug` raises the level to `debug` and adds file/line info.
    #[must_use]
    pub fn from_flags(debug: bool, log_json: bool) -> Self {
        let base = if debug {
            Self::development()
        } else {
            Self::production()
        };
        Self {
            json_format: log_json,
            ..base
        }
    }

    /// Creates a development configuration with human-readable output.
    #[must_use]
    pub fn development() -> Self {
        Self {
            enabled: true,
            level: "debug".to_string(),
            json_format: false,
            file_line_info: true,
            include_target: true,
        }
    }

    /// Creates a production configuration with JSON output.
    #[must_use]
    pub fn production() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            json_format: true,
            file_line_info: false,
            include_target: true,
        }
    }

    /// Replace the filter directives, e.g. from `RUST_LOG`.
    ///
    /// Blank directives are ignored.
    #[must_use]
    pub fn with_level_override(mut self, directives: Option<&str>) -> Self {
        if let Some(directives) = directives.map(str::trim).filter(|d| !d.is_empty()) {
            self.level = directives.to_string();
        }
        self
    }
}

/// Initializes the logging subsystem.
///
/// # Errors
///
/// Returns `TelemetryError::InvalidConfig` for an empty or malformed level
/// and `TelemetryError::LoggingInit` if a global subscriber is already set.
pub fn init_logging(config: &LogConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let filter = create_env_filter(&config.level)?;

    if config.json_format {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_file(config.file_line_info)
            .with_line_number(config.file_line_info)
            .with_target(config.include_target)
            .with_filter(filter);

        tracing_subscriber::registry()
            .with(fmt_layer)
            .try_init()
            .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .pretty()
            .with_writer(std::io::stderr)
            .with_file(config.file_line_info)
            .with_line_number(config.file_line_info)
            .with_target(config.include_target)
            .with_filter(filter);

        tracing_subscriber::registry()
            .with(fmt_layer)
            .try_init()
            .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;
    }

    Ok(())
}

/// Creates an env filter from a directive string.
///
/// # Errors
///
/// Returns error if the filter string is empty or invalid.
pub fn create_env_filter(filter: &str) -> TelemetryResult<EnvFilter> {
    if filter.trim().is_empty() {
        return Err(TelemetryError::InvalidConfig("empty log level".to_string()));
    }
    EnvFilter::try_new(filter)
        .map_err(|e| TelemetryError::InvalidConfig(format!("Invalid log level: {e}")))
}
