//! Config file hot-reload.
//!
//! [`FileWatcher`] reports changes to a single configuration file.
//! [`ConfigReloader`] re-resolves the configuration when that file changes
//! and publishes the result through a [`ConfigHandle`]. The catalog and the
//! flag set are never rebuilt by a reload; only resolved values change.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use chartmuseum_config::{
//!     Catalog, CliValues, ConfigHandle, ConfigLoader, ConfigReloader, EnvSnapshot,
//! };
//!
//! # async fn example() -> Result<(), chartmuseum_config::ConfigError> {
//! let catalog = Catalog::standard()?;
//! let env = EnvSnapshot::from_process();
//! let handle = ConfigHandle::new(
//!     ConfigLoader::new(&catalog)
//!         .with_file("chartmuseum.toml")?
//!         .with_env(env.clone())
//!         .load()?,
//! );
//!
//! let reloader = ConfigReloader::new(catalog, "chartmuseum.toml", env, CliValues::new(), handle);
//! let task = reloader.spawn(Duration::from_millis(500))?;
//! # task.abort();
//! # Ok(())
//! # }
//! ```

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::{
    Catalog, CliValues, ConfigError, ConfigHandle, ConfigLoader, EnvSnapshot, ResolvedConfig,
};

/// Kind of file change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileChangeKind {
    /// File was created.
    Created,
    /// File was modified.
    Modified,
    /// File was deleted.
    Deleted,
}

impl FileChangeKind {
    fn from_event_kind(kind: &EventKind) -> Option<Self> {
        match kind {
            EventKind::Create(_) => Some(Self::Created),
            EventKind::Modify(_) => Some(Self::Modified),
            EventKind::Remove(_) => Some(Self::Deleted),
            _ => None,
        }
    }
}

/// A change to the watched file.
#[derive(Debug, Clone)]
pub struct FileChangeEvent {
    /// Path of the watched file.
    pub path: PathBuf,
    /// Kind of change.
    pub kind: FileChangeKind,
    /// When the change was seen.
    pub timestamp: Instant,
}

/// Watches one configuration file.
///
/// The parent directory is watched rather than the file itself, so editors
/// that save by writing a new file and renaming it over the old one are
/// still noticed. Events for other files in the directory are dropped.
///
/// Changes are reported on the trailing edge of a burst: once an event for
/// the file arrives, the watcher waits until `debounce` has passed without
/// another one and then reports a single change carrying the last kind
/// seen. A truncate followed by a write therefore yields one event, after
/// the write.
pub struct FileWatcher {
    _watcher: Option<RecommendedWatcher>,
    rx: mpsc::Receiver<Event>,
    path: PathBuf,
    file_name: OsString,
    debounce: Duration,
}

impl FileWatcher {
    /// Start watching a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist or the platform watcher
    /// cannot be created.
    pub fn new<P: AsRef<Path>>(path: P, debounce: Duration) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }
        let path = path.canonicalize()?;
        let dir = match path.parent() {
            Some(dir) => dir.to_path_buf(),
            None => {
                return Err(ConfigError::invalid_config(format!(
                    "cannot watch {}",
                    path.display()
                )))
            }
        };

        let (tx, rx) = mpsc::channel(100);
        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            if let Ok(event) = res {
                // Receiver gone means the watcher is shutting down
                let _ = tx.blocking_send(event);
            }
        })
        .map_err(|e| ConfigError::invalid_config(format!("failed to create file watcher: {e}")))?;

        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .map_err(|e| {
                ConfigError::invalid_config(format!("failed to watch {}: {e}", dir.display()))
            })?;

        Self::from_receiver(Some(watcher), rx, path, debounce)
    }

    fn from_receiver(
        watcher: Option<RecommendedWatcher>,
        rx: mpsc::Receiver<Event>,
        path: PathBuf,
        debounce: Duration,
    ) -> Result<Self, ConfigError> {
        let file_name = match path.file_name() {
            Some(name) => name.to_os_string(),
            None => {
                return Err(ConfigError::invalid_config(format!(
                    "cannot watch {}",
                    path.display()
                )))
            }
        };
        Ok(Self {
            _watcher: watcher,
            rx,
            path,
            file_name,
            debounce,
        })
    }

    /// Path being watched.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Wait for the next settled change to the file.
    ///
    /// Returns `None` once the underlying watcher stops.
    pub async fn next(&mut self) -> Option<FileChangeEvent> {
        let mut kind = loop {
            let event = self.rx.recv().await?;
            if let Some(kind) = self.classify(&event) {
                break kind;
            }
        };

        let mut deadline = tokio::time::Instant::now() + self.debounce;
        loop {
            match tokio::time::timeout_at(deadline, self.rx.recv()).await {
                Ok(Some(event)) => {
                    if let Some(later) = self.classify(&event) {
                        kind = later;
                        deadline = tokio::time::Instant::now() + self.debounce;
                    }
                }
                // Quiet for a full window, or the sender is gone
                Ok(None) | Err(_) => break,
            }
        }

        Some(FileChangeEvent {
            path: self.path.clone(),
            kind,
            timestamp: Instant::now(),
        })
    }

    fn classify(&self, event: &Event) -> Option<FileChangeKind> {
        let kind = FileChangeKind::from_event_kind(&event.kind)?;
        event
            .paths
            .iter()
            .any(|p| p.file_name() == Some(self.file_name.as_os_str()))
            .then_some(kind)
    }
}

/// Re-resolves configuration when the config file changes.
///
/// Reloads reuse the environment snapshot and command line values captured
/// at startup, so only the file layer can change. A reload that fails
/// leaves the current snapshot in place.
#[derive(Debug)]
pub struct ConfigReloader {
    catalog: Catalog,
    path: PathBuf,
    env: EnvSnapshot,
    cli: CliValues,
    handle: ConfigHandle,
}

impl ConfigReloader {
    /// Create a reloader for `path`.
    pub fn new(
        catalog: Catalog,
        path: impl Into<PathBuf>,
        env: EnvSnapshot,
        cli: CliValues,
        handle: ConfigHandle,
    ) -> Self {
        Self {
            catalog,
            path: path.into(),
            env,
            cli,
            handle,
        }
    }

    /// Handle the reloader publishes to.
    pub fn handle(&self) -> &ConfigHandle {
        &self.handle
    }

    /// Resolve again from the file and publish the result.
    ///
    /// # Errors
    ///
    /// Returns the resolution error; the handle is left unchanged.
    pub fn reload(&self) -> Result<Arc<ResolvedConfig>, ConfigError> {
        let config = ConfigLoader::new(&self.catalog)
            .with_file(&self.path)?
            .with_env(self.env.clone())
            .with_cli(self.cli.clone())
            .load()?;
        self.handle.replace(config);
        Ok(self.handle.current())
    }

    /// Reload on every change reported by `watcher` until it stops.
    pub async fn run(self, mut watcher: FileWatcher) {
        while let Some(event) = watcher.next().await {
            if event.kind == FileChangeKind::Deleted {
                tracing::warn!(
                    path = %event.path.display(),
                    "configuration file removed, keeping current configuration"
                );
                continue;
            }
            match self.reload() {
                Ok(_) => {
                    tracing::info!(path = %event.path.display(), "configuration reloaded");
                }
                Err(e) => {
                    tracing::warn!(
                        path = %event.path.display(),
                        error = %e,
                        "configuration reload failed, keeping current configuration"
                    );
                }
            }
        }
    }

    /// Watch the file and reload in a background task.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be watched.
    pub fn spawn(self, debounce: Duration) -> Result<JoinHandle<()>, ConfigError> {
        let watcher = FileWatcher::new(&self.path, debounce)?;
        Ok(tokio::spawn(self.run(watcher)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ValueSource;
    use std::fs;
    use tempfile::TempDir;
    use tokio::time::{sleep, timeout};

    fn event(kind: EventKind, path: &Path) -> Event {
        Event::new(kind).add_path(path.to_path_buf())
    }

    fn modify() -> EventKind {
        EventKind::Modify(notify::event::ModifyKind::Data(
            notify::event::DataChange::Any,
        ))
    }

    #[test]
    fn test_change_kind_mapping() {
        assert_eq!(
            FileChangeKind::from_event_kind(&EventKind::Create(notify::event::CreateKind::File)),
            Some(FileChangeKind::Created)
        );
        assert_eq!(
            FileChangeKind::from_event_kind(&modify()),
            Some(FileChangeKind::Modified)
        );
        assert_eq!(
            FileChangeKind::from_event_kind(&EventKind::Remove(notify::event::RemoveKind::File)),
            Some(FileChangeKind::Deleted)
        );
        assert_eq!(
            FileChangeKind::from_event_kind(&EventKind::Access(
                notify::event::AccessKind::Any
            )),
            None
        );
    }

    #[test]
    fn test_watch_missing_file() {
        let result = FileWatcher::new("/nonexistent/chartmuseum.toml", Duration::from_millis(50));
        assert!(matches!(result, Err(ConfigError::FileNotFound { .. })));
    }

    fn channel_watcher(path: &Path, debounce: Duration) -> (mpsc::Sender<Event>, FileWatcher) {
        let (tx, rx) = mpsc::channel(16);
        let watcher = FileWatcher::from_receiver(None, rx, path.to_path_buf(), debounce).unwrap();
        (tx, watcher)
    }

    fn reloader_for(content: &str) -> (TempDir, PathBuf, ConfigHandle, ConfigReloader) {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("chartmuseum.toml");
        fs::write(&config_path, content).unwrap();

        let catalog = Catalog::standard().unwrap();
        let handle = ConfigHandle::new(
            ConfigLoader::new(&catalog)
                .with_file(&config_path)
                .unwrap()
                .load()
                .unwrap(),
        );
        let reloader = ConfigReloader::new(
            catalog,
            &config_path,
            EnvSnapshot::empty(),
            CliValues::new(),
            handle.clone(),
        );
        (dir, config_path, handle, reloader)
    }

    #[tokio::test]
    async fn test_other_files_ignored() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("chartmuseum.toml");
        let (tx, mut watcher) = channel_watcher(&config_path, Duration::from_millis(20));

        tx.send(event(modify(), &dir.path().join("README.md"))).await.unwrap();
        tx.send(event(EventKind::Access(notify::event::AccessKind::Any), &config_path))
            .await
            .unwrap();
        drop(tx);

        assert!(watcher.next().await.is_none());
    }

    #[tokio::test]
    async fn test_burst_reported_once_after_it_settles() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("chartmuseum.toml");
        let (tx, mut watcher) = channel_watcher(&config_path, Duration::from_millis(200));

        let sender = tokio::spawn(async move {
            tx.send(event(EventKind::Remove(notify::event::RemoveKind::File), &config_path))
                .await
                .unwrap();
            sleep(Duration::from_millis(30)).await;
            tx.send(event(EventKind::Create(notify::event::CreateKind::File), &config_path))
                .await
                .unwrap();
            sleep(Duration::from_millis(30)).await;
            tx.send(event(modify(), &config_path)).await.unwrap();
            tx
        });

        let change = watcher.next().await.unwrap();
        assert_eq!(change.kind, FileChangeKind::Modified);

        // Nothing left over from the same burst
        drop(sender.await.unwrap());
        assert!(watcher.next().await.is_none());
    }

    #[tokio::test]
    async fn test_quiet_window_separates_changes() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("chartmuseum.toml");
        let (tx, mut watcher) = channel_watcher(&config_path, Duration::from_millis(20));

        tx.send(event(modify(), &config_path)).await.unwrap();
        assert!(watcher.next().await.is_some());

        tx.send(event(modify(), &config_path)).await.unwrap();
        assert!(watcher.next().await.is_some());
    }

    #[tokio::test]
    async fn test_run_reloads_final_content_of_a_burst() {
        let (_dir, config_path, handle, reloader) = reloader_for("port = 9000");
        let (tx, watcher) = channel_watcher(&config_path, Duration::from_millis(200));
        let task = tokio::spawn(reloader.run(watcher));

        // Truncate, then write the real content shortly after
        fs::write(&config_path, "").unwrap();
        tx.send(event(modify(), &config_path)).await.unwrap();
        sleep(Duration::from_millis(50)).await;
        fs::write(&config_path, "port = 9100").unwrap();
        tx.send(event(modify(), &config_path)).await.unwrap();
        drop(tx);

        timeout(Duration::from_secs(5), task).await.unwrap().unwrap();
        assert_eq!(handle.current().int("port"), Some(9100));
    }

    #[tokio::test]
    async fn test_run_ignores_deleted_file() {
        let (_dir, config_path, handle, reloader) = reloader_for("port = 9000");
        let (tx, watcher) = channel_watcher(&config_path, Duration::from_millis(20));
        let task = tokio::spawn(reloader.run(watcher));

        // A delete must not trigger a reload, even if the file is readable
        fs::write(&config_path, "port = 9100").unwrap();
        tx.send(event(EventKind::Remove(notify::event::RemoveKind::File), &config_path))
            .await
            .unwrap();
        drop(tx);

        timeout(Duration::from_secs(5), task).await.unwrap().unwrap();
        assert_eq!(handle.current().int("port"), Some(9000));
    }

    #[tokio::test]
    async fn test_run_keeps_snapshot_on_invalid_file() {
        let (_dir, config_path, handle, reloader) = reloader_for("port = 9000");
        let (tx, watcher) = channel_watcher(&config_path, Duration::from_millis(20));
        let task = tokio::spawn(reloader.run(watcher));

        fs::write(&config_path, "port = \"eighty\"").unwrap();
        tx.send(event(modify(), &config_path)).await.unwrap();
        drop(tx);

        timeout(Duration::from_secs(5), task).await.unwrap().unwrap();
        assert_eq!(handle.current().int("port"), Some(9000));
    }

    #[test]
    fn test_reload_publishes_new_snapshot() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("chartmuseum.toml");
        fs::write(&config_path, "port = 9000").unwrap();

        let catalog = Catalog::standard().unwrap();
        let handle = ConfigHandle::new(
            ConfigLoader::new(&catalog)
                .with_file(&config_path)
                .unwrap()
                .load()
                .unwrap(),
        );
        let reloader = ConfigReloader::new(
            catalog,
            &config_path,
            EnvSnapshot::from_pairs([("DEBUG", "true")]),
            CliValues::new().with_value("depth", 3),
            handle.clone(),
        );

        fs::write(&config_path, "port = 9100").unwrap();
        let reloaded = reloader.reload().unwrap();

        assert_eq!(reloaded.int("port"), Some(9100));
        assert_eq!(reloaded.source("port"), Some(ValueSource::File));
        assert_eq!(reloaded.bool("debug"), Some(true));
        assert_eq!(reloaded.int("depth"), Some(3));
        assert_eq!(handle.current().int("port"), Some(9100));
    }

    #[test]
    fn test_failed_reload_keeps_snapshot() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("chartmuseum.toml");
        fs::write(&config_path, "port = 9000").unwrap();

        let catalog = Catalog::standard().unwrap();
        let handle = ConfigHandle::new(
            ConfigLoader::new(&catalog)
                .with_file(&config_path)
                .unwrap()
                .load()
                .unwrap(),
        );
        let reloader = ConfigReloader::new(
            catalog,
            &config_path,
            EnvSnapshot::empty(),
            CliValues::new(),
            handle.clone(),
        );

        fs::write(&config_path, "port = \"not a number\"").unwrap();
        assert!(reloader.reload().is_err());
        assert_eq!(handle.current().int("port"), Some(9000));
    }

    #[tokio::test]
    async fn test_spawn_reloads_on_file_change() {
        let (_dir, config_path, handle, reloader) = reloader_for("port = 9000");
        let task = reloader.spawn(Duration::from_millis(50)).unwrap();

        // Give the platform watcher time to start
        sleep(Duration::from_millis(100)).await;
        fs::write(&config_path, "port = 9001").unwrap();

        let reloaded = timeout(Duration::from_secs(5), async {
            while handle.current().int("port") != Some(9001) {
                sleep(Duration::from_millis(20)).await;
            }
        })
        .await;
        task.abort();
        assert!(reloaded.is_ok(), "configuration was not reloaded");
    }
}
