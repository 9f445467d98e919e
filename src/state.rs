//! Shared process state
//!
//! One [`AppState`] is constructed at startup and torn down at shutdown; its
//! lifecycle is owned by the binary's run function, not a global. Request
//! handlers and the background workers all borrow from here.

use futures::FutureExt;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::{Config, Environment};
use crate::manager::{run_scheduled_functions, GraphCleaner, GraphInfoUpdater, ScheduledFn};
use crate::queue::TaskQueue;
use crate::storage::{Compressor, GraphStore};
use crate::Result;

/// Process-wide handle binding the queue, store, and background maintenance
/// together.
pub struct AppState {
    environment: Environment,
    store: Arc<GraphStore>,
    queue: Arc<TaskQueue>,
    info_updater: Arc<GraphInfoUpdater>,
    cleaner: Arc<GraphCleaner>,
    /// Active game sessions: session id -> crawled host
    active_courses: RwLock<HashMap<String, String>>,
    shutdown: watch::Sender<bool>,
    watcher_interval: Duration,
}

impl AppState {
    /// Builds the shared state from a loaded configuration.
    ///
    /// Creates the graph root directory when missing; a root that cannot be
    /// created is a startup failure.
    pub fn initialize(config: Config) -> Result<Self> {
        let environment = Environment::from_env();
        let store = Arc::new(GraphStore::new(
            &config.output.graph_root,
            config.output.compressor,
        )?);

        let info_updater = Arc::new(GraphInfoUpdater::new(
            store.clone(),
            config.watcher.teleport_count,
            config.watcher.max_files_per_sweep,
        ));
        let cleaner = Arc::new(GraphCleaner::new(store.clone()));
        let watcher_interval = Duration::from_secs(config.watcher.interval_secs);

        let queue = Arc::new(TaskQueue::new(config, environment, store.clone()));
        let (shutdown, _) = watch::channel(false);

        tracing::info!(
            "State initialized ({} profile, graphs at {})",
            environment.as_str(),
            store.root().display()
        );

        Ok(Self {
            environment,
            store,
            queue,
            info_updater,
            cleaner,
            active_courses: RwLock::new(HashMap::new()),
            shutdown,
            watcher_interval,
        })
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn compressor(&self) -> Compressor {
        self.store.compressor()
    }

    pub fn graph_root(&self) -> &Path {
        self.store.root()
    }

    pub fn store(&self) -> &Arc<GraphStore> {
        &self.store
    }

    pub fn queue(&self) -> &Arc<TaskQueue> {
        &self.queue
    }

    pub fn info_updater(&self) -> &Arc<GraphInfoUpdater> {
        &self.info_updater
    }

    pub fn cleaner(&self) -> &Arc<GraphCleaner> {
        &self.cleaner
    }

    /// Spawns the queue worker and the background scheduler.
    ///
    /// Both run until [`shutdown`](Self::shutdown) is called; the returned
    /// handles let the caller await a clean exit.
    pub fn spawn_background(&self) -> (JoinHandle<()>, JoinHandle<()>) {
        let worker = tokio::spawn(
            self.queue
                .clone()
                .process_queue(self.shutdown.subscribe()),
        );

        let cleaner = self.cleaner.clone();
        let updater = self.info_updater.clone();
        let fns: Vec<ScheduledFn> = vec![
            Box::new(move || {
                let cleaner = cleaner.clone();
                async move {
                    cleaner.sweep().await;
                }
                .boxed()
            }),
            Box::new(move || {
                let updater = updater.clone();
                async move {
                    updater.update_info().await;
                }
                .boxed()
            }),
        ];
        let scheduler = tokio::spawn(run_scheduled_functions(
            fns,
            self.watcher_interval,
            self.shutdown.subscribe(),
        ));

        (worker, scheduler)
    }

    /// Signals every background task to stop.
    ///
    /// The queue worker drains in-flight crawls up to its grace period
    /// before returning; await the handles from
    /// [`spawn_background`](Self::spawn_background) to observe completion.
    pub fn shutdown(&self) {
        tracing::info!("Shutting down shared state");
        let _ = self.shutdown.send(true);
    }

    // ===== Active courses =====

    /// Registers a game session against a crawled host.
    pub fn register_course(&self, uid: &str, host: &str) {
        self.active_courses
            .write()
            .expect("course map lock poisoned")
            .insert(uid.to_string(), host.to_string());
    }

    /// Resolves a session id to its host.
    pub fn resolve_course(&self, uid: &str) -> Option<String> {
        self.active_courses
            .read()
            .expect("course map lock poisoned")
            .get(uid)
            .cloned()
    }

    /// Removes a finished session.
    pub fn finish_course(&self, uid: &str) {
        self.active_courses
            .write()
            .expect("course map lock poisoned")
            .remove(uid);
    }
}
