//! Logging for ChartMuseum.
//!
//! The server's `debug` and `logjson` variables decide how verbose the logs
//! are and whether they are emitted as JSON lines or in a human-readable
//! layout. This crate turns those two switches into a `tracing` subscriber.
//!
//! # Example
//!
//! ```rust,ignore
//! use chartmuseum_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::from_flags(settings.debug, settings.log_json))?;
//! tracing::info!(port = settings.port, "starting");
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{init_logging, LogConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
