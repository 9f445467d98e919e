//! Graph persistence
//!
//! One compressed node-link document per crawled host, stored under a single
//! graph root directory. The file name is the host's network location plus
//! the compressor's extension.

mod codec;

pub use codec::Compressor;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::graph::{LinkGraph, NodeLinkData};
use crate::{AtlasError, Result};

/// Handle to the graph root directory for one compressor choice.
#[derive(Debug, Clone)]
pub struct GraphStore {
    root: PathBuf,
    compressor: Compressor,
}

impl GraphStore {
    /// Creates a store rooted at `root`, creating the directory if missing.
    pub fn new(root: impl Into<PathBuf>, compressor: Compressor) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root, compressor })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn compressor(&self) -> Compressor {
        self.compressor
    }

    /// The on-disk path for a host's graph.
    pub fn path_for(&self, host: &str) -> PathBuf {
        self.root
            .join(format!("{}{}", host, self.compressor.extension()))
    }

    /// Persists a graph for `host`.
    ///
    /// The document is written to a temporary sibling first and moved into
    /// place, so readers never observe a half-written file.
    pub fn save(&self, host: &str, graph: &LinkGraph) -> Result<PathBuf> {
        let payload = serde_json::to_vec(&graph.to_node_link())?;
        let compressed = self.compressor.compress(&payload)?;

        let path = self.path_for(host);
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, &compressed)?;
        fs::rename(&tmp, &path)?;

        tracing::info!("Persisted graph for {} at {}", host, path.display());
        Ok(path)
    }

    /// Loads and decodes the node-link document at `path`.
    pub fn read_document(&self, path: &Path) -> Result<NodeLinkData> {
        let compressed = fs::read(path)?;
        let payload = self.compressor.decompress(&compressed)?;
        Ok(serde_json::from_slice(&payload)?)
    }

    /// Loads the persisted graph for `host`.
    pub fn load(&self, host: &str) -> Result<LinkGraph> {
        let path = self.path_for(host);
        if !path.is_file() {
            return Err(AtlasError::GraphNotFound(host.to_string()));
        }
        let data = self.read_document(&path)?;
        Ok(LinkGraph::from_node_link(&data))
    }

    /// Lists the persisted graph files matching this store's compressor.
    pub fn list(&self) -> Result<Vec<PathBuf>> {
        let suffix = self.compressor.extension();
        let mut files: Vec<PathBuf> = fs::read_dir(&self.root)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file()
                    && path
                        .file_name()
                        .and_then(|n| n.to_str())
                        .is_some_and(|n| n.ends_with(suffix))
            })
            .collect();
        files.sort();
        Ok(files)
    }

    /// Lists the hosts with a persisted graph.
    pub fn list_hosts(&self) -> Result<Vec<String>> {
        Ok(self
            .list()?
            .iter()
            .filter_map(|path| Self::host_of(path))
            .collect())
    }

    /// Extracts the host from a graph file path (the file stem).
    pub fn host_of(path: &Path) -> Option<String> {
        path.file_stem()
            .and_then(|stem| stem.to_str())
            .map(|s| s.to_string())
    }

    /// Returns the modification time of a graph file.
    pub fn modified(&self, path: &Path) -> Result<SystemTime> {
        Ok(fs::metadata(path)?.modified()?)
    }

    /// Deletes a graph file.
    pub fn remove(&self, path: &Path) -> Result<()> {
        fs::remove_file(path)?;
        Ok(())
    }
}
