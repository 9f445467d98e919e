//! Background maintenance of persisted graphs
//!
//! Two collaborators run on the scheduler's cadence: the info updater keeps
//! an in-memory `host -> GraphInfo` cache in step with the files on disk,
//! and the cleaner deletes files that turned out malformed or empty.

mod scheduler;

pub use scheduler::{run_scheduled_functions, ScheduledFn};

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::graph::{GraphInfo, LinkGraph};
use crate::storage::GraphStore;

/// Lazily recomputed metadata cache over the persisted graphs.
///
/// Recomputation is bounded per sweep so a directory full of fresh graphs
/// cannot starve the event loop; the remainder is picked up on later ticks.
pub struct GraphInfoUpdater {
    store: Arc<GraphStore>,
    cache: RwLock<HashMap<String, GraphInfo>>,
    teleport_count: usize,
    max_files_per_sweep: usize,
}

impl GraphInfoUpdater {
    pub fn new(store: Arc<GraphStore>, teleport_count: usize, max_files_per_sweep: usize) -> Self {
        Self {
            store,
            cache: RwLock::new(HashMap::new()),
            teleport_count,
            max_files_per_sweep,
        }
    }

    /// Returns the cached info for a host, if any.
    pub fn get(&self, host: &str) -> Option<GraphInfo> {
        self.cache
            .read()
            .expect("info cache lock poisoned")
            .get(host)
            .cloned()
    }

    /// Lists the hosts with cached info.
    pub fn hosts(&self) -> Vec<String> {
        let mut hosts: Vec<String> = self
            .cache
            .read()
            .expect("info cache lock poisoned")
            .keys()
            .cloned()
            .collect();
        hosts.sort();
        hosts
    }

    /// Refreshes cache entries whose file changed since they were loaded.
    ///
    /// At most `max_files_per_sweep` files are reloaded per call. Entries
    /// for files that no longer exist are dropped.
    pub async fn update_info(&self) {
        let files = match self.store.list() {
            Ok(files) => files,
            Err(e) => {
                tracing::warn!("Cannot list graph directory: {}", e);
                return;
            }
        };

        let mut live_hosts: Vec<String> = Vec::with_capacity(files.len());
        let mut reloaded = 0usize;

        for path in &files {
            let Some(host) = GraphStore::host_of(path) else {
                continue;
            };
            live_hosts.push(host.clone());

            if reloaded >= self.max_files_per_sweep {
                continue;
            }

            let modified = match self.store.modified(path) {
                Ok(modified) => modified,
                Err(e) => {
                    tracing::warn!("Cannot stat {}: {}", path.display(), e);
                    continue;
                }
            };

            let stale = match self.get(&host) {
                Some(info) => info.last_modified < modified,
                None => true,
            };
            if !stale {
                continue;
            }

            match self.store.read_document(path) {
                Ok(data) => {
                    let graph = LinkGraph::from_node_link(&data);
                    let info = GraphInfo {
                        host: host.clone(),
                        node_count: graph.node_count(),
                        edge_count: graph.edge_count(),
                        teleport_nodes: graph.teleport_nodes(self.teleport_count),
                        last_modified: modified,
                    };
                    self.cache
                        .write()
                        .expect("info cache lock poisoned")
                        .insert(host.clone(), info);
                    reloaded += 1;
                    tracing::info!("Updated graph info for {}", host);
                }
                Err(e) => {
                    tracing::warn!("Skipping unreadable graph {}: {}", path.display(), e);
                }
            }
        }

        // Files the cleaner (or an operator) removed leave no cache entry.
        self.cache
            .write()
            .expect("info cache lock poisoned")
            .retain(|host, _| live_hosts.iter().any(|h| h == host));
    }
}

/// Deletes persisted graphs that fail to decode or hold at most one node.
pub struct GraphCleaner {
    store: Arc<GraphStore>,
}

impl GraphCleaner {
    pub fn new(store: Arc<GraphStore>) -> Self {
        Self { store }
    }

    /// Runs one cleanup pass, returning the number of files removed.
    pub async fn sweep(&self) -> usize {
        let files = match self.store.list() {
            Ok(files) => files,
            Err(e) => {
                tracing::warn!("Cannot list graph directory: {}", e);
                return 0;
            }
        };

        let mut removed = 0usize;
        for path in files {
            let dirty = match self.store.read_document(&path) {
                Ok(data) => data.nodes.len() <= 1,
                Err(_) => true,
            };
            if !dirty {
                continue;
            }
            match self.store.remove(&path) {
                Ok(()) => {
                    removed += 1;
                    tracing::info!("Removed dirty graph {}", path.display());
                }
                Err(e) => tracing::warn!("Cannot remove {}: {}", path.display(), e),
            }
        }

        if removed > 0 {
            tracing::info!("Graph cleanup removed {} file(s)", removed);
        }
        removed
    }
}
