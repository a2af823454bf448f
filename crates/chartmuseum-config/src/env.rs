//! Environment snapshots.

use std::env;

use indexmap::IndexMap;

/// A frozen copy of environment variables.
///
/// Resolution reads from a snapshot rather than the live process
/// environment, so a reload sees the same environment as startup and tests
/// never touch global state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSnapshot {
    vars: IndexMap<String, String>,
}

impl EnvSnapshot {
    /// An empty environment.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Capture the current process environment.
    ///
    /// Variables whose name or value is not valid UTF-8 are skipped.
    pub fn from_process() -> Self {
        let vars = env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect();
        Self { vars }
    }

    /// Load a `.env` file into the process, then capture the environment.
    ///
    /// A missing `.env` file is not an error. Variables already set in the
    /// process take precedence over the file.
    pub fn from_process_with_dotenv() -> Self {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "loaded .env file"),
            Err(e) if e.not_found() => {}
            Err(e) => tracing::warn!(error = %e, "ignoring unreadable .env file"),
        }
        Self::from_process()
    }

    /// Build a snapshot from explicit pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Value of a variable.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// Number of captured variables.
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Whether nothing was captured.
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}
