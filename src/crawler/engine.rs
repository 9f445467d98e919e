//! Crawler engine
//!
//! One [`Crawler`] instance maps one website into an undirected link graph.
//! The traversal is an iterative worklist bounded by a per-task semaphore:
//! the owner loop pops URLs, marks them visited, and adds graph nodes before
//! any suspension point; only the network fetch runs on spawned tasks.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use url::Url;

use crate::crawler::client::{FetchOutcome, ScopedClient};
use crate::crawler::parser::extract_links;
use crate::graph::LinkGraph;
use crate::robots::RobotsPolicy;
use crate::storage::GraphStore;
use crate::url::{netloc, same_origin, ExclusionList};
use crate::Result;

/// Classes of per-URL failures, aggregated over a crawl.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// DNS or connection failures after retry exhaustion
    Network,
    /// Responses without a Content-Type header
    MissingHeader,
    /// HTML documents the parser could not process
    Parse,
}

impl FailureKind {
    fn label(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::MissingHeader => "missing-header",
            Self::Parse => "parse",
        }
    }
}

/// Per-crawl failure accumulator, reported as one grouped entry per class.
#[derive(Debug, Default)]
pub struct FailureLedger {
    entries: HashMap<FailureKind, Vec<String>>,
}

impl FailureLedger {
    fn record(&mut self, kind: FailureKind, detail: &str) {
        let truncated: String = detail.chars().take(100).collect();
        self.entries.entry(kind).or_default().push(truncated);
    }

    pub fn total(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// Emits one grouped log entry per failure class.
    fn log_summary(&self, origin: &str) {
        for (kind, details) in &self.entries {
            tracing::error!(
                "{} {} failure(s) while crawling {}: {}",
                details.len(),
                kind.label(),
                origin,
                details.first().map(String::as_str).unwrap_or_default()
            );
        }
    }
}

/// One completed fetch, handed back to the owner loop.
struct FetchJob {
    url: Url,
    depth: u32,
    outcome: FetchOutcome,
}

/// Maps a single website into an undirected link graph.
pub struct Crawler {
    client: ScopedClient,
    robots: RobotsPolicy,
    max_depth: u32,
    request_limit: usize,
    exclusions: ExclusionList,
    graph: LinkGraph,
    failures: FailureLedger,
}

impl Crawler {
    pub fn new(
        client: ScopedClient,
        robots: RobotsPolicy,
        max_depth: u32,
        request_limit: usize,
    ) -> Self {
        Self {
            client,
            robots,
            max_depth,
            request_limit,
            exclusions: ExclusionList::default(),
            graph: LinkGraph::new(),
            failures: FailureLedger::default(),
        }
    }

    /// Replaces the default exclusion list.
    pub fn with_exclusions(mut self, exclusions: ExclusionList) -> Self {
        self.exclusions = exclusions;
        self
    }

    pub fn graph(&self) -> &LinkGraph {
        &self.graph
    }

    pub fn failures(&self) -> &FailureLedger {
        &self.failures
    }

    /// Checks the target is crawlable and adapts headers to the protocol.
    ///
    /// Returns false when the start URL answers the HEAD probe with an error
    /// status; the task then aborts without writing anything. When the probe
    /// negotiated HTTP/2 the connection-management headers are dropped for
    /// the rest of the task.
    pub async fn pre_crawl_setup(&mut self, start_url: &Url) -> bool {
        let response = match self.client.head(start_url).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("Pre-crawl HEAD failed for {}: {}", start_url, e);
                return false;
            }
        };

        if !response.status().is_success() {
            tracing::info!(
                "Crawling not permitted on this website (status {})",
                response.status()
            );
            return false;
        }

        if ScopedClient::is_http2(&response) {
            self.client.disable_connection_headers();
        }

        tracing::info!("Crawling initialized for {}", self.client.origin());
        true
    }

    /// Traverses same-origin links from `start_url` up to the depth cap.
    ///
    /// At most `request_limit` fetches are in flight at once. Per-URL
    /// failures prune only the subtree rooted at that URL; the crawl
    /// continues and failures are logged by class at the end.
    pub async fn build_graph(&mut self, start_url: &Url) {
        let origin = match netloc(start_url) {
            Ok(origin) => origin,
            Err(e) => {
                tracing::error!("Cannot crawl {}: {}", start_url, e);
                return;
            }
        };

        let semaphore = Arc::new(Semaphore::new(self.request_limit));
        let mut visited: HashSet<String> = HashSet::new();
        // LIFO worklist: the most recently discovered link is expanded first,
        // matching the eager first-found traversal order.
        let mut frontier: Vec<(Url, u32)> = vec![(start_url.clone(), 0)];
        let mut in_flight: JoinSet<FetchJob> = JoinSet::new();

        loop {
            // Admit frontier entries while fetch slots are free. Visited and
            // node bookkeeping happen here, before any await, so a sibling
            // never observes a URL as fresh twice.
            while !frontier.is_empty() {
                let Ok(permit) = semaphore.clone().try_acquire_owned() else {
                    break;
                };
                let Some((url, depth)) = frontier.pop() else {
                    break;
                };
                if depth > self.max_depth || visited.contains(url.as_str()) {
                    continue;
                }

                tracing::info!("Crawling: {}", url.path());
                visited.insert(url.as_str().to_string());
                self.graph.add_node(url.as_str());

                if self.exclusions.matches(url.path()) {
                    continue;
                }

                let client = self.client.clone();
                in_flight.spawn(async move {
                    let outcome = client.fetch_page(&url).await;
                    drop(permit);
                    FetchJob {
                        url,
                        depth,
                        outcome,
                    }
                });
            }

            if in_flight.is_empty() {
                if frontier.is_empty() {
                    break;
                }
                continue;
            }

            match in_flight.join_next().await {
                Some(Ok(job)) => self.process_fetch(job, &origin, &visited, &mut frontier),
                Some(Err(e)) => tracing::error!("Fetch task failed: {}", e),
                None => {}
            }
        }

        self.failures.log_summary(&origin);
    }

    /// Folds one completed fetch into the graph and the frontier.
    fn process_fetch(
        &mut self,
        job: FetchJob,
        origin: &str,
        visited: &HashSet<String>,
        frontier: &mut Vec<(Url, u32)>,
    ) {
        let path = job.url.path();
        let body = match job.outcome {
            FetchOutcome::Html { body, .. } => body,
            FetchOutcome::HttpStatus { status } => {
                tracing::info!("Non-200 response ({}): {}", status, path);
                return;
            }
            FetchOutcome::NotHtml { content_type } => {
                tracing::info!("Not HTML ({}): {}", content_type, path);
                return;
            }
            FetchOutcome::MissingContentType => {
                self.failures.record(FailureKind::MissingHeader, path);
                return;
            }
            FetchOutcome::Network { error } => {
                self.failures.record(FailureKind::Network, &error);
                return;
            }
        };

        // Consulted after the fetch: a disallowed page stays a leaf in the
        // graph and none of its links are extracted.
        if !self.robots.allowed(job.url.as_str()) {
            tracing::info!("Blocked by robots.txt: {}", path);
            return;
        }

        let links = match extract_links(&body, &job.url) {
            Ok(links) => links,
            Err(e) => {
                self.failures.record(FailureKind::Parse, &e);
                return;
            }
        };

        let next_depth = job.depth + 1;
        // Reverse push keeps the first extracted link on top of the stack.
        for link in links.iter().rev() {
            if !same_origin(link, origin) {
                continue;
            }
            // Links past the depth cap never become nodes or edges, so a
            // zero-depth crawl yields exactly the start node.
            if next_depth > self.max_depth {
                continue;
            }
            self.graph.add_edge(job.url.as_str(), link.as_str());
            if !visited.contains(link.as_str()) {
                frontier.push((link.clone(), next_depth));
            }
        }
    }

    /// Persists the accumulated graph for `host`.
    ///
    /// Graphs with at most one node are not worth keeping and are skipped.
    pub fn compress_graph(&self, host: &str, store: &GraphStore) -> Result<Option<PathBuf>> {
        if self.graph.node_count() <= 1 {
            tracing::info!("Skipping compression, no graph nodes found");
            return Ok(None);
        }
        store.save(host, &self.graph).map(Some)
    }
}
