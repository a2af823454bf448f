//! ChartMuseum configuration entry point.
//!
//! Builds the variable catalog, parses the command line against the flags
//! materialized from it, resolves every variable and prints the effective
//! configuration as TOML with secrets masked.

use anyhow::Context;
use tracing::{debug, info};

use chartmuseum_config::{
    CliValues, ConfigLoader, EnvSnapshot, Registry, ResolvedConfig, Settings, ValueSource,
};
use chartmuseum_telemetry::{init_logging, LogConfig};

const ABOUT: &str = "Helm Chart Repository with support for Amazon S3, Google Cloud Storage, \
                     Microsoft Azure Blob Storage and Alibaba Cloud OSS";

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let registry = Registry::install().context("invalid variable catalog")?;

    // Help, version and malformed input exit here with clap's own messages
    let matches = registry
        .flags()
        .command("chartmuseum")
        .version(env!("CARGO_PKG_VERSION"))
        .about(ABOUT)
        .get_matches();
    let cli = CliValues::from_matches(registry.flags(), &matches);

    let env = EnvSnapshot::from_process_with_dotenv();
    let config = ConfigLoader::new(registry.catalog())
        .with_env(env.clone())
        .with_cli(cli)
        .load()
        .context("failed to resolve configuration")?;
    let settings = config.settings().context("failed to build settings")?;

    // Logging depends on resolved values, so nothing before this point is seen
    let log_config = LogConfig::from_flags(settings.debug, settings.log_json)
        .with_level_override(env.get("RUST_LOG"));
    init_logging(&log_config).context("failed to initialize logging")?;
    log_startup(registry, &config, &settings);

    print!("{}", config.redacted_toml().context("failed to render configuration")?);
    Ok(())
}

/// Report what startup did once a subscriber is listening.
fn log_startup(registry: &Registry, config: &ResolvedConfig, settings: &Settings) {
    debug!(
        flags = registry.flags().len(),
        variables = registry.catalog().len(),
        "materialized configuration flags"
    );
    if let Some(path) = config.config_file() {
        info!(path = %path.display(), "loaded configuration file");
    }
    for (key, resolved) in config.iter() {
        if resolved.source != ValueSource::Default {
            debug!(key, source = %resolved.source, "override");
        }
    }
    info!(
        version = env!("CARGO_PKG_VERSION"),
        port = settings.port,
        storage = %settings.storage.backend,
        "resolved configuration"
    );
}
