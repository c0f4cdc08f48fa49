//! Hot reload of mock responses.
//!
//! File-backed bodies are read once per configuration, so edits to a body
//! file trigger a reload just like edits to the config file itself.
//!
//! # Design Decisions
//! - notify delivers events over a channel to a dedicated reload thread;
//!   adding watches from inside the notify callback can deadlock the backend
//! - The set of watched body files follows each accepted configuration and is
//!   updated before the configuration is sent on
//! - The reload thread only holds a weak reference to the watcher, so dropping
//!   the [`WatchHandle`] stops both

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{mpsc as std_mpsc, Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::thread;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::ServerConfig;

/// Watches the configuration file and the body files it references.
pub struct ConfigWatcher {
    config_path: PathBuf,
    body_files: Vec<PathBuf>,
    update_tx: mpsc::UnboundedSender<ServerConfig>,
}

/// Keeps a running [`ConfigWatcher`] alive. Dropping it stops watching.
pub struct WatchHandle {
    state: Arc<Mutex<WatchState>>,
}

impl WatchHandle {
    /// Body files currently watched, sorted.
    pub fn body_files(&self) -> Vec<PathBuf> {
        lock(&self.state).body_files.iter().cloned().collect()
    }
}

struct WatchState {
    watcher: RecommendedWatcher,
    body_files: BTreeSet<PathBuf>,
}

impl WatchState {
    /// Watch exactly `wanted` as body files. Paths that cannot be watched are
    /// skipped and retried on the next reload.
    fn track(&mut self, wanted: Vec<PathBuf>) {
        let wanted: BTreeSet<PathBuf> = wanted.into_iter().collect();

        let stale: Vec<PathBuf> = self.body_files.difference(&wanted).cloned().collect();
        for path in stale {
            if let Err(e) = self.watcher.unwatch(&path) {
                tracing::debug!(path = ?path, error = ?e, "Failed to unwatch response body file");
            }
            self.body_files.remove(&path);
        }

        for path in wanted {
            if self.body_files.contains(&path) {
                continue;
            }
            match self.watcher.watch(&path, RecursiveMode::NonRecursive) {
                Ok(()) => {
                    tracing::debug!(path = ?path, "Watching response body file");
                    self.body_files.insert(path);
                }
                Err(e) => tracing::warn!(path = ?path, error = ?e, "Cannot watch response body file"),
            }
        }
    }
}

impl ConfigWatcher {
    /// Create a watcher for `config_path`.
    ///
    /// Returns the watcher and a receiver for validated configurations.
    pub fn new(config_path: &Path) -> (Self, mpsc::UnboundedReceiver<ServerConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let watcher = Self {
            config_path: config_path.to_path_buf(),
            body_files: Vec::new(),
            update_tx,
        };
        (watcher, update_rx)
    }

    /// Also watch the body files referenced by `config`.
    pub fn with_body_files(mut self, config: &ServerConfig) -> Self {
        self.body_files = body_files(config);
        self
    }

    /// Start watching in a background thread.
    pub fn run(self) -> Result<WatchHandle, notify::Error> {
        let Self {
            config_path,
            body_files,
            update_tx,
        } = self;

        let (event_tx, event_rx) = std_mpsc::channel();
        let mut watcher = RecommendedWatcher::new(
            event_tx,
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;
        watcher.watch(&config_path, RecursiveMode::NonRecursive)?;

        let state = Arc::new(Mutex::new(WatchState {
            watcher,
            body_files: BTreeSet::new(),
        }));
        lock(&state).track(body_files);

        let weak = Arc::downgrade(&state);
        let reload_path = config_path.clone();
        thread::Builder::new()
            .name("config-reload".into())
            .spawn(move || reload_loop(&reload_path, event_rx, weak, update_tx))
            .map_err(notify::Error::io)?;

        tracing::info!(
            path = ?config_path,
            body_files = lock(&state).body_files.len(),
            "Config watcher started"
        );
        Ok(WatchHandle { state })
    }
}

/// Reload on every change until the watcher is dropped.
fn reload_loop(
    config_path: &Path,
    events: std_mpsc::Receiver<notify::Result<Event>>,
    state: Weak<Mutex<WatchState>>,
    update_tx: mpsc::UnboundedSender<ServerConfig>,
) {
    for res in events {
        match res {
            Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                tracing::info!(paths = ?event.paths, "Mock definition changed, reloading");
                let config = match load_config(config_path) {
                    Ok(config) => config,
                    Err(e) => {
                        tracing::error!(error = %e, "Reload rejected, keeping current responses");
                        continue;
                    }
                };

                let Some(state) = state.upgrade() else {
                    break;
                };
                lock(&state).track(body_files(&config));
                drop(state);

                if update_tx.send(config).is_err() {
                    tracing::debug!("Reload receiver gone, dropping configuration");
                }
            }
            Ok(_) => {}
            Err(e) => tracing::error!(error = ?e, "Config watch error"),
        }
    }
    tracing::debug!("Config watcher stopped");
}

fn lock(state: &Mutex<WatchState>) -> MutexGuard<'_, WatchState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Distinct body file paths referenced by `config`.
fn body_files(config: &ServerConfig) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = config
        .responses
        .iter()
        .filter_map(|r| r.file.clone())
        .collect();
    files.sort();
    files.dedup();
    files
}
