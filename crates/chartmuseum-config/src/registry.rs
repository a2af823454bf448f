//! Process-wide configuration state.
//!
//! The catalog and its flag set are built once at startup and installed in
//! a [`Registry`]; nothing mutates them afterwards. The resolved
//! configuration lives behind a [`ConfigHandle`] so a reload can publish a
//! new snapshot without touching the one readers already hold.

use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;

use crate::{build_flag_set, Catalog, DefinitionError, FlagSet, ResolvedConfig};

static REGISTRY: OnceLock<Registry> = OnceLock::new();

/// The catalog and the flags materialized from it.
#[derive(Debug, Clone)]
pub struct Registry {
    catalog: Catalog,
    flags: FlagSet,
}

impl Registry {
    /// Build the registry for the standard catalog.
    ///
    /// # Errors
    ///
    /// Returns the catalog's first invariant violation.
    pub fn build() -> Result<Self, DefinitionError> {
        Self::from_catalog(Catalog::standard()?)
    }

    /// Build the registry for a given catalog.
    ///
    /// # Errors
    ///
    /// Returns the catalog's first invariant violation.
    pub fn from_catalog(catalog: Catalog) -> Result<Self, DefinitionError> {
        let flags = build_flag_set(&catalog)?;
        Ok(Self { catalog, flags })
    }

    /// Build the standard registry and install it process-wide.
    ///
    /// Later calls return the already-installed registry.
    ///
    /// # Errors
    ///
    /// Returns the catalog's first invariant violation on the first call.
    pub fn install() -> Result<&'static Self, DefinitionError> {
        if let Some(registry) = REGISTRY.get() {
            return Ok(registry);
        }
        let registry = Self::build()?;
        Ok(REGISTRY.get_or_init(|| registry))
    }

    /// The installed registry, if [`Registry::install`] has run.
    pub fn global() -> Option<&'static Self> {
        REGISTRY.get()
    }

    /// The catalog.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// The materialized flags.
    pub fn flags(&self) -> &FlagSet {
        &self.flags
    }
}

/// Shared handle to the current resolved configuration.
///
/// Readers take an `Arc` snapshot with [`current`](Self::current) and keep
/// using it for as long as they like; [`replace`](Self::replace) swaps in a
/// new snapshot atomically.
///
/// # Example
///
/// ```
/// use chartmuseum_config::{Catalog, ConfigHandle, ConfigLoader};
///
/// let catalog = Catalog::standard().unwrap();
/// let handle = ConfigHandle::new(ConfigLoader::new(&catalog).load().unwrap());
/// let snapshot = handle.current();
/// assert_eq!(snapshot.int("port"), Some(8080));
/// ```
#[derive(Debug, Clone)]
pub struct ConfigHandle {
    inner: Arc<RwLock<Arc<ResolvedConfig>>>,
}

impl ConfigHandle {
    /// Wrap an initial configuration.
    pub fn new(config: ResolvedConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(config))),
        }
    }

    /// The current snapshot.
    pub fn current(&self) -> Arc<ResolvedConfig> {
        Arc::clone(&self.inner.read())
    }

    /// Publish a new snapshot and return the previous one.
    pub fn replace(&self, config: ResolvedConfig) -> Arc<ResolvedConfig> {
        let mut guard = self.inner.write();
        std::mem::replace(&mut *guard, Arc::new(config))
    }
}
