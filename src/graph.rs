//! Undirected link graph and its on-disk document model
//!
//! A [`LinkGraph`] is owned by exactly one crawl task while it is being
//! built. After persistence the only live representation is the compressed
//! node-link document plus the cached [`GraphInfo`] entry.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::time::SystemTime;

/// An undirected graph of URLs with set semantics.
///
/// Nodes are unique; edges are unordered pairs with no self-loops and no
/// parallel edges. Insertion order is preserved for both nodes and edges so
/// serialization is deterministic.
#[derive(Debug, Clone, Default)]
pub struct LinkGraph {
    nodes: Vec<String>,
    index: HashMap<String, usize>,
    edges: Vec<(usize, usize)>,
    edge_set: HashSet<(usize, usize)>,
}

impl LinkGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node, returning its index. Re-adding an existing node is a
    /// no-op.
    pub fn add_node(&mut self, id: &str) -> usize {
        if let Some(&idx) = self.index.get(id) {
            return idx;
        }
        let idx = self.nodes.len();
        self.nodes.push(id.to_string());
        self.index.insert(id.to_string(), idx);
        idx
    }

    /// Adds an undirected edge, inserting both endpoints as nodes if needed.
    ///
    /// Self-loops and duplicate edges (in either orientation) are ignored.
    pub fn add_edge(&mut self, a: &str, b: &str) {
        if a == b {
            return;
        }
        let ia = self.add_node(a);
        let ib = self.add_node(b);
        let key = (ia.min(ib), ia.max(ib));
        if self.edge_set.insert(key) {
            self.edges.push((ia, ib));
        }
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Iterates node identifiers in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(String::as_str)
    }

    /// Returns the neighbors of a node, in edge insertion order.
    pub fn neighbors(&self, id: &str) -> Vec<&str> {
        let Some(&idx) = self.index.get(id) else {
            return Vec::new();
        };
        self.edges
            .iter()
            .filter_map(|&(a, b)| {
                if a == idx {
                    Some(self.nodes[b].as_str())
                } else if b == idx {
                    Some(self.nodes[a].as_str())
                } else {
                    None
                }
            })
            .collect()
    }

    /// Returns the degree of every node, indexed like `nodes()`.
    fn degrees(&self) -> Vec<usize> {
        let mut degrees = vec![0usize; self.nodes.len()];
        for &(a, b) in &self.edges {
            degrees[a] += 1;
            degrees[b] += 1;
        }
        degrees
    }

    /// Selects the top-k nodes by degree centrality as long-range jump
    /// candidates. Ties break by node insertion order.
    pub fn teleport_nodes(&self, k: usize) -> Vec<String> {
        let degrees = self.degrees();
        let mut ranked: Vec<usize> = (0..self.nodes.len()).collect();
        ranked.sort_by(|&a, &b| degrees[b].cmp(&degrees[a]).then(a.cmp(&b)));
        ranked
            .into_iter()
            .take(k)
            .map(|i| self.nodes[i].clone())
            .collect()
    }

    /// Converts to the serializable node-link document.
    pub fn to_node_link(&self) -> NodeLinkData {
        NodeLinkData {
            directed: false,
            multigraph: false,
            graph: serde_json::Map::new(),
            nodes: self.nodes.iter().map(|id| NodeRef { id: id.clone() }).collect(),
            edges: self
                .edges
                .iter()
                .map(|&(a, b)| EdgeRef {
                    source: self.nodes[a].clone(),
                    target: self.nodes[b].clone(),
                })
                .collect(),
        }
    }

    /// Rebuilds a graph from a node-link document.
    ///
    /// Edge endpoints missing from the declared node list are inserted, so
    /// the invariant that every endpoint is a node holds for any input.
    pub fn from_node_link(data: &NodeLinkData) -> Self {
        let mut graph = Self::new();
        for node in &data.nodes {
            graph.add_node(&node.id);
        }
        for edge in &data.edges {
            graph.add_edge(&edge.source, &edge.target);
        }
        graph
    }
}

/// A node entry in the node-link document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeRef {
    pub id: String,
}

/// An edge entry in the node-link document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeRef {
    pub source: String,
    pub target: String,
}

/// The on-disk JSON document for a persisted graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeLinkData {
    pub directed: bool,
    pub multigraph: bool,
    #[serde(default)]
    pub graph: serde_json::Map<String, serde_json::Value>,
    pub nodes: Vec<NodeRef>,
    pub edges: Vec<EdgeRef>,
}

/// Cached metadata about one persisted graph.
#[derive(Debug, Clone, Serialize)]
pub struct GraphInfo {
    pub host: String,
    pub node_count: usize,
    pub edge_count: usize,
    pub teleport_nodes: Vec<String>,
    #[serde(skip)]
    pub last_modified: SystemTime,
}
