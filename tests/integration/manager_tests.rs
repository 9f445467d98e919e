//! Watcher, info updater, and cleaner working over a shared graph directory

use linkatlas::graph::LinkGraph;
use linkatlas::manager::{run_scheduled_functions, GraphCleaner, GraphInfoUpdater, ScheduledFn};
use linkatlas::storage::{Compressor, GraphStore};
use futures::FutureExt;
use std::fs;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::watch;

fn chain_graph(n: usize) -> LinkGraph {
    let mut graph = LinkGraph::new();
    for i in 0..n.saturating_sub(1) {
        graph.add_edge(&format!("https://h.test/{}", i), &format!("https://h.test/{}", i + 1));
    }
    graph
}

#[tokio::test]
async fn test_scheduled_sweep_cleans_and_updates() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(GraphStore::new(dir.path(), Compressor::Gzip).unwrap());

    // one healthy graph, one corrupt file
    store.save("good.test", &chain_graph(4)).unwrap();
    fs::write(dir.path().join("bad.test.gz"), b"garbage").unwrap();

    let cleaner = Arc::new(GraphCleaner::new(store.clone()));
    let updater = Arc::new(GraphInfoUpdater::new(store.clone(), 2, 8));

    let c = cleaner.clone();
    let u = updater.clone();
    let fns: Vec<ScheduledFn> = vec![
        Box::new(move || {
            let c = c.clone();
            async move {
                c.sweep().await;
            }
            .boxed()
        }),
        Box::new(move || {
            let u = u.clone();
            async move {
                u.update_info().await;
            }
            .boxed()
        }),
    ];

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler = tokio::spawn(run_scheduled_functions(
        fns,
        Duration::from_millis(50),
        shutdown_rx,
    ));

    // wait for at least one full round
    tokio::time::sleep(Duration::from_millis(300)).await;
    shutdown_tx.send(true).unwrap();
    scheduler.await.unwrap();

    // the corrupt file is gone and never entered the cache
    assert!(!dir.path().join("bad.test.gz").exists());
    assert!(updater.get("bad.test").is_none());

    let info = updater.get("good.test").expect("healthy graph not cached");
    assert_eq!(info.node_count, 4);
    assert_eq!(info.edge_count, 3);
}

#[tokio::test]
async fn test_info_updater_tracks_file_replacement() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(GraphStore::new(dir.path(), Compressor::Gzip).unwrap());
    store.save("h.test", &chain_graph(3)).unwrap();

    let updater = GraphInfoUpdater::new(store.clone(), 2, 8);
    updater.update_info().await;
    assert_eq!(updater.get("h.test").unwrap().node_count, 3);

    // a re-crawl replaces the file with a bigger graph; nudge the mtime
    // forward so coarse filesystem clocks cannot hide the change
    tokio::time::sleep(Duration::from_millis(1100)).await;
    store.save("h.test", &chain_graph(6)).unwrap();

    updater.update_info().await;
    assert_eq!(updater.get("h.test").unwrap().node_count, 6);
}

#[tokio::test]
async fn test_teleport_nodes_from_persisted_graph() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(GraphStore::new(dir.path(), Compressor::Gzip).unwrap());

    let mut graph = LinkGraph::new();
    for spoke in ["a", "b", "c", "d"] {
        graph.add_edge("https://h.test/hub", &format!("https://h.test/{}", spoke));
    }
    store.save("h.test", &graph).unwrap();

    let updater = GraphInfoUpdater::new(store, 1, 8);
    updater.update_info().await;

    let info = updater.get("h.test").unwrap();
    assert_eq!(info.teleport_nodes, vec!["https://h.test/hub".to_string()]);
}

#[tokio::test]
async fn test_cleaner_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(GraphStore::new(dir.path(), Compressor::Gzip).unwrap());
    fs::write(dir.path().join("bad.test.gz"), b"garbage").unwrap();

    let cleaner = GraphCleaner::new(store);
    assert_eq!(cleaner.sweep().await, 1);
    assert_eq!(cleaner.sweep().await, 0);
}
