//! Command line adapter.
//!
//! Turns a [`FlagSet`] into a `clap` [`Command`] and pulls back only the
//! values an operator actually typed. Environment variables are listed in
//! the help text but read by the resolver, not by clap, so that precedence
//! stays in one place.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use clap::parser::ValueSource;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use indexmap::IndexMap;

use crate::flags::CONFIG_FLAG;
use crate::{ConfigError, FlagKind, FlagSet, FlagSpec, Value};

impl FlagSet {
    /// Build a parser for this option list.
    ///
    /// # Example
    ///
    /// ```
    /// use chartmuseum_config::{build_flag_set, Catalog};
    ///
    /// let flags = build_flag_set(&Catalog::standard().unwrap()).unwrap();
    /// let matches = flags
    ///     .command("chartmuseum")
    ///     .try_get_matches_from(["chartmuseum", "--port", "9000", "--debug"])
    ///     .unwrap();
    /// assert_eq!(matches.get_one::<i64>("port"), Some(&9000));
    /// assert!(matches.get_flag("debug"));
    /// ```
    pub fn command(&self, name: impl Into<String>) -> Command {
        Command::new(name.into()).args(self.iter().map(to_arg))
    }
}

fn to_arg(flag: &FlagSpec) -> Arg {
    let mut help = flag.usage.clone();
    match &flag.default {
        Some(Value::String(s)) if !s.is_empty() => help.push_str(&format!(" (default: {s:?})")),
        Some(Value::Int(i)) if *i != 0 => help.push_str(&format!(" (default: {i})")),
        _ => {}
    }
    help.push_str(&format!(" [env: {}]", flag.env_var));

    let mut arg = Arg::new(flag.name.clone())
        .long(flag.name.clone())
        .help(help);
    if let Some(short) = flag.short {
        arg = arg.short(short);
    }

    match flag.kind {
        FlagKind::String => arg
            .action(ArgAction::Set)
            .value_name("VALUE")
            .value_parser(value_parser!(String)),
        FlagKind::Int => arg
            .action(ArgAction::Set)
            .value_name("INT")
            .allow_negative_numbers(true)
            .value_parser(value_parser!(i64)),
        FlagKind::Bool => arg.action(ArgAction::SetTrue),
    }
}

/// Values supplied on the command line, keyed by catalog key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliValues {
    config_path: Option<PathBuf>,
    values: IndexMap<String, Value>,
}

impl CliValues {
    /// No command line input.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an argument vector against the option list.
    ///
    /// The first item is the program name.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Cli`] for unknown flags or unparsable values.
    pub fn parse_from<I, T>(flags: &FlagSet, name: &str, args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = flags.command(name).try_get_matches_from(args)?;
        Ok(Self::from_matches(flags, &matches))
    }

    /// Collect the values whose source is the command line.
    ///
    /// Flags the operator did not pass are left out so lower layers apply.
    pub fn from_matches(flags: &FlagSet, matches: &ArgMatches) -> Self {
        let mut values = IndexMap::new();
        for flag in flags.variables() {
            if matches.value_source(&flag.name) != Some(ValueSource::CommandLine) {
                continue;
            }
            let value = match flag.kind {
                FlagKind::String => matches
                    .get_one::<String>(&flag.name)
                    .cloned()
                    .map(Value::String),
                FlagKind::Int => matches.get_one::<i64>(&flag.name).copied().map(Value::Int),
                FlagKind::Bool => Some(Value::Bool(matches.get_flag(&flag.name))),
            };
            if let (Some(key), Some(value)) = (&flag.key, value) {
                values.insert(key.clone(), value);
            }
        }

        Self {
            config_path: matches.get_one::<String>(CONFIG_FLAG).map(PathBuf::from),
            values,
        }
    }

    /// Set a value directly.
    #[must_use]
    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Set the config file path directly.
    #[must_use]
    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    /// Path given with `--config` / `-c`.
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Value for a key, if it was passed.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Passed values in flag order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of passed values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether nothing was passed.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
