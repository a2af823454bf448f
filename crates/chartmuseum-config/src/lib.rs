//! Typed configuration catalog for ChartMuseum.
//!
//! This crate is the single source of truth for the server's tunable
//! settings. It provides:
//! - A [`Catalog`] of typed, defaulted variables with optional command line
//!   and environment bindings
//! - [`build_flag_set`], which materializes the ordered option list a
//!   command line parser presents
//! - A `clap` adapter ([`FlagSet::command`], [`CliValues`])
//! - Layered resolution (defaults → file → env → command line) through
//!   [`ConfigLoader`]
//! - A typed [`Settings`] view and a swappable [`ConfigHandle`] for hot
//!   reload
//!
//! # Example
//!
//! ```
//! use chartmuseum_config::{CliValues, ConfigLoader, EnvSnapshot, Registry};
//!
//! # fn main() -> Result<(), chartmuseum_config::ConfigError> {
//! let registry = Registry::build()?;
//! let cli = CliValues::parse_from(
//!     registry.flags(),
//!     "chartmuseum",
//!     ["chartmuseum", "--storage", "local", "--storage-local-rootdir", "/charts"],
//! )?;
//!
//! let config = ConfigLoader::new(registry.catalog())
//!     .with_env(EnvSnapshot::from_pairs([("PORT", "9000")]))
//!     .with_cli(cli)
//!     .load()?;
//!
//! let settings = config.settings()?;
//! assert_eq!(settings.port, 9000);
//! assert_eq!(settings.storage.backend, "local");
//! assert_eq!(settings.storage.local.rootdir, "/charts");
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! Dotted keys nest as tables:
//!
//! ```toml
//! port = 8080
//! debug = true
//!
//! [basicauth]
//! user = "admin"
//!
//! [storage]
//! backend = "amazon"
//!
//! [storage.amazon]
//! bucket = "my-charts"
//! region = "us-east-1"
//! ```

#![warn(missing_docs)]

mod catalog;
mod cli;
mod env;
mod error;
mod flags;
mod loader;
mod registry;
mod resolved;
mod schema;
mod value;
mod variable;
mod vars;
mod watcher;

pub use catalog::Catalog;
pub use cli::CliValues;
pub use env::EnvSnapshot;
pub use error::{ConfigError, DefinitionError};
pub use flags::{
    build_flag_set, FlagKind, FlagSet, FlagSpec, CONFIG_ENV_VAR, CONFIG_FLAG, CONFIG_SHORT,
    PARSER_FLAGS, PARSER_SHORTS,
};
pub use loader::{ConfigLoader, FileValues};
pub use registry::{ConfigHandle, Registry};
pub use resolved::{ResolvedConfig, ResolvedValue, ValueSource};
pub use schema::*;
pub use value::{Value, VariableType};
pub use variable::{ConfigVariable, ExternalBinding};
pub use watcher::{ConfigReloader, FileChangeEvent, FileChangeKind, FileWatcher};
