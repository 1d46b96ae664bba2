//! Initial load and watch-driven reloads.
//!
//! ```text
//! Uninitialized --initialize--> WatchingPendingReady --first load ok--> Ready
//! ```
//!
//! Once ready, every burst of filesystem changes under the root triggers one
//! full load. Reloads run one at a time on a dedicated task; a successful
//! load is swapped into the [`Snapshot`], a failed one is logged and the
//! previous generation keeps serving.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use lds_store::Store;

use crate::auth::{EnvSecrets, LayerAuth, SecretSource};
use crate::config::DirectoryConfig;
use crate::error::{DirectoryError, DirectoryResult};
use crate::query::Query;
use crate::snapshot::Snapshot;
use crate::watch::DirWatcher;

/// Lifecycle state of a [`Directory`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum State {
    Uninitialized,
    WatchingPendingReady,
    Ready,
}

/// Counters describing the reload history.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ReloadStatus {
    /// Number of generations installed so far; the initial load is 1.
    pub generation: u64,
    /// Reload passes that failed and left the previous generation in place.
    pub failures: u64,
    /// Error of the latest reload, cleared by the next successful one.
    pub last_error: Option<String>,
}

/// A live, file-backed directory.
pub struct Directory {
    config: DirectoryConfig,
    snapshot: Arc<Snapshot>,
    auth: LayerAuth,
    state: Mutex<State>,
    status: Arc<watch::Sender<ReloadStatus>>,
    watcher: Mutex<Option<DirWatcher>>,
    reloader: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for Directory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Directory")
            .field("state", &self.state())
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

impl Directory {
    /// A directory whose layer secrets come from the environment.
    pub fn new(config: DirectoryConfig) -> Self {
        Self::with_secrets(config, Arc::new(EnvSecrets))
    }

    pub fn with_secrets(config: DirectoryConfig, secrets: Arc<dyn SecretSource>) -> Self {
        let auth = LayerAuth::new(secrets, &config);
        let (status, _) = watch::channel(ReloadStatus::default());
        Self {
            config,
            snapshot: Arc::new(Snapshot::new()),
            auth,
            state: Mutex::new(State::Uninitialized),
            status: Arc::new(status),
            watcher: Mutex::new(None),
            reloader: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &DirectoryConfig {
        &self.config
    }

    pub fn state(&self) -> State {
        *self.state.lock().expect("state lock poisoned")
    }

    pub fn status(&self) -> ReloadStatus {
        self.status.borrow().clone()
    }

    /// Receive a notification after every reload attempt.
    pub fn subscribe(&self) -> watch::Receiver<ReloadStatus> {
        self.status.subscribe()
    }

    /// A query handle reading this directory's current generation.
    pub fn query(&self) -> Query {
        Query::new(Arc::clone(&self.snapshot), self.auth.clone())
    }

    /// Start watching `dir` and perform the initial load.
    ///
    /// Returns once the first generation is installed and the directory is
    /// [`State::Ready`]. Fails with [`DirectoryError::AlreadyInitialized`] if
    /// called more than once. If the watch cannot be registered the directory
    /// returns to [`State::Uninitialized`] and may be initialized again. If the
    /// initial load fails the error is returned, the watch is torn down, and
    /// the directory never becomes ready.
    pub async fn initialize(&self, dir: impl AsRef<Path>) -> DirectoryResult<()> {
        let dir = dir.as_ref();
        {
            let mut state = self.state.lock().expect("state lock poisoned");
            if *state != State::Uninitialized {
                warn!(dir = %dir.display(), state = ?*state, "directory already initialized");
                return Err(DirectoryError::AlreadyInitialized);
            }
            *state = State::WatchingPendingReady;
        }

        let (tx, mut rx) = mpsc::unbounded_channel();
        let watcher = match DirWatcher::start(dir, tx) {
            Ok(watcher) => watcher,
            Err(e) => {
                *self.state.lock().expect("state lock poisoned") = State::Uninitialized;
                error!(dir = %dir.display(), error = %e, "failed to watch directory");
                return Err(e);
            }
        };

        // Anything reported before the initial load is covered by it.
        while rx.try_recv().is_ok() {}

        let store = match Store::load_within(dir, self.config.load_timeout()).await {
            Ok(store) => store,
            Err(e) => {
                error!(dir = %dir.display(), error = %e, "initial load failed");
                return Err(e.into());
            }
        };

        info!(
            dir = %dir.display(),
            users = store.user_count(),
            groups = store.group_count(),
            layers = store.layer_count(),
            diagnostics = store.diagnostics().len(),
            "initial load complete"
        );
        self.snapshot.replace(store);
        self.status.send_modify(|status| status.generation = 1);

        let reloader = tokio::spawn(reload_loop(
            dir.to_path_buf(),
            rx,
            Arc::clone(&self.snapshot),
            Arc::clone(&self.status),
            self.config.debounce(),
            self.config.load_timeout(),
        ));
        *self.watcher.lock().expect("watcher lock poisoned") = Some(watcher);
        *self.reloader.lock().expect("reloader lock poisoned") = Some(reloader);
        *self.state.lock().expect("state lock poisoned") = State::Ready;
        Ok(())
    }

    /// Stop watching. The last installed generation keeps serving queries.
    pub fn shutdown(&self) {
        if self.watcher.lock().expect("watcher lock poisoned").take().is_some() {
            debug!("directory watch stopped");
        }
        if let Some(handle) = self.reloader.lock().expect("reloader lock poisoned").take() {
            handle.abort();
        }
    }
}

impl Drop for Directory {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn reload_loop(
    dir: PathBuf,
    mut changes: mpsc::UnboundedReceiver<PathBuf>,
    snapshot: Arc<Snapshot>,
    status: Arc<watch::Sender<ReloadStatus>>,
    debounce: Duration,
    limit: Option<Duration>,
) {
    while let Some(first) = changes.recv().await {
        if !debounce.is_zero() {
            tokio::time::sleep(debounce).await;
        }
        let mut coalesced = 0usize;
        while changes.try_recv().is_ok() {
            coalesced += 1;
        }
        debug!(path = %first.display(), coalesced, "change detected, reloading");

        match Store::load_within(&dir, limit).await {
            Ok(store) => {
                let users = store.user_count();
                let groups = store.group_count();
                let layers = store.layer_count();
                snapshot.replace(store);
                status.send_modify(|s| {
                    s.generation += 1;
                    s.last_error = None;
                });
                info!(
                    generation = status.borrow().generation,
                    users, groups, layers, "store reloaded"
                );
            }
            Err(e) => {
                error!(dir = %dir.display(), error = %e, "reload failed, keeping previous store");
                status.send_modify(|s| {
                    s.failures += 1;
                    s.last_error = Some(e.to_string());
                });
            }
        }
    }
    debug!(dir = %dir.display(), "watch closed, reload task exiting");
}
