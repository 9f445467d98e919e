//! In-process task queue for crawl requests
//!
//! The queue is intentionally in-memory: admission, backpressure, and the
//! worker pool all live in the server process, trading horizontal
//! scalability for a simple operational surface. Capacity bounds the number
//! of concurrent crawls; the backlog bounds how many tasks may wait for a
//! slot.

use chrono::{DateTime, Utc};
use futures::FutureExt;
use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{watch, Notify};
use tokio::task::JoinSet;
use url::Url;

use crate::config::{Config, Environment};
use crate::crawler;
use crate::storage::{Compressor, GraphStore};
use crate::url::{netloc, normalize_url};
use crate::{AtlasError, Result};

/// One admitted crawl request. Immutable after admission; identity is the
/// normalized network location.
#[derive(Debug, Clone)]
pub struct CrawlTask {
    pub url: Url,
    pub host: String,
    pub compressor: Compressor,
    pub crawl_depth: u32,
    pub request_limit: usize,
    pub enqueued_at: DateTime<Utc>,
}

impl CrawlTask {
    pub fn new(
        url: Url,
        compressor: Compressor,
        crawl_depth: u32,
        request_limit: usize,
    ) -> Result<Self> {
        let host = netloc(&url)?;
        Ok(Self {
            url,
            host,
            compressor,
            crawl_depth,
            request_limit,
            enqueued_at: Utc::now(),
        })
    }
}

/// Outcome of an enqueue attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// Task admitted; `position` is its place in the backlog
    Accepted { position: usize },
    /// The same host is already queued or in flight
    Duplicate,
    /// The backlog is at capacity
    Full,
}

/// Queue availability, as reported to the status surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueState {
    Available,
    Full,
}

/// Snapshot of the queue for status reporting
#[derive(Debug, Clone)]
pub struct QueueStatus {
    pub state: QueueState,
    pub queued: usize,
    pub in_flight: usize,
}

#[derive(Debug, Default)]
struct QueueInner {
    pending: VecDeque<CrawlTask>,
    /// Hosts currently queued or in flight, for duplicate rejection
    tracked: HashSet<String>,
    in_flight: usize,
    closed: bool,
}

/// Bounded FIFO of pending crawls plus the worker pool that runs them.
pub struct TaskQueue {
    inner: Mutex<QueueInner>,
    notify: Notify,
    capacity: usize,
    backlog: usize,
    grace_period: Duration,
    config: Config,
    environment: Environment,
    store: Arc<GraphStore>,
}

impl TaskQueue {
    pub fn new(config: Config, environment: Environment, store: Arc<GraphStore>) -> Self {
        Self {
            inner: Mutex::new(QueueInner::default()),
            notify: Notify::new(),
            capacity: config.queue.capacity,
            backlog: config.queue.backlog,
            grace_period: Duration::from_secs(config.queue.grace_period_secs),
            config,
            environment,
            store,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Admits a URL for crawling.
    ///
    /// The URL is normalized first; unparsable or host-less URLs are
    /// rejected here, before a task ever exists. A host that is already
    /// queued or in flight is a duplicate.
    pub fn enqueue(&self, raw_url: &str) -> Result<EnqueueOutcome> {
        let url = normalize_url(raw_url)?;
        let task = CrawlTask::new(
            url,
            self.store.compressor(),
            self.config.crawler.crawl_depth.depth(),
            self.config.crawler.request_limit.permits(),
        )?;

        let outcome = {
            let mut inner = self.inner.lock().expect("queue lock poisoned");
            if inner.closed {
                return Err(AtlasError::QueueClosed);
            }
            if inner.tracked.contains(&task.host) {
                EnqueueOutcome::Duplicate
            } else if inner.pending.len() >= self.backlog {
                EnqueueOutcome::Full
            } else {
                inner.tracked.insert(task.host.clone());
                inner.pending.push_back(task);
                EnqueueOutcome::Accepted {
                    position: inner.pending.len(),
                }
            }
        };

        if matches!(outcome, EnqueueOutcome::Accepted { .. }) {
            self.notify.notify_one();
        }
        Ok(outcome)
    }

    /// Reports queue state for the status surface.
    pub fn status(&self) -> QueueStatus {
        let inner = self.inner.lock().expect("queue lock poisoned");
        QueueStatus {
            state: if inner.in_flight >= self.capacity {
                QueueState::Full
            } else {
                QueueState::Available
            },
            queued: inner.pending.len(),
            in_flight: inner.in_flight,
        }
    }

    /// True when nothing is queued or in flight.
    pub fn is_idle(&self) -> bool {
        let inner = self.inner.lock().expect("queue lock poisoned");
        inner.pending.is_empty() && inner.in_flight == 0
    }

    /// Waits until the queue has fully drained.
    pub async fn wait_idle(&self) {
        while !self.is_idle() {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }

    /// The background worker loop.
    ///
    /// Admits up to `capacity` concurrent crawls; a task error or panic is
    /// contained to that task and never kills the loop. On shutdown the loop
    /// stops admitting, waits out the grace period, then abandons whatever
    /// is still running.
    pub async fn process_queue(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let mut workers: JoinSet<String> = JoinSet::new();

        loop {
            while let Some(done) = workers.try_join_next() {
                self.release(done);
            }

            let task = {
                let mut inner = self.inner.lock().expect("queue lock poisoned");
                if inner.in_flight < self.capacity {
                    if let Some(task) = inner.pending.pop_front() {
                        inner.in_flight += 1;
                        Some(task)
                    } else {
                        None
                    }
                } else {
                    None
                }
            };

            if let Some(task) = task {
                let queue = self.clone();
                workers.spawn(async move { queue.run_task(task).await });
                continue;
            }

            tokio::select! {
                _ = self.notify.notified() => {}
                joined = workers.join_next(), if !workers.is_empty() => {
                    if let Some(done) = joined {
                        self.release(done);
                    }
                }
                _ = shutdown.changed() => break,
            }
        }

        self.inner.lock().expect("queue lock poisoned").closed = true;
        self.drain(workers).await;
    }

    /// Runs one crawl task, containing errors and panics.
    async fn run_task(&self, task: CrawlTask) -> String {
        let host = task.host.clone();
        tracing::info!("Starting crawl of {}", host);

        let work = crawler::process_task(&task, &self.config, self.environment, &self.store);
        match std::panic::AssertUnwindSafe(work).catch_unwind().await {
            Ok(Ok(())) => tracing::info!("Finished crawl of {}", host),
            Ok(Err(e)) => tracing::error!("Crawl of {} failed: {}", host, e),
            Err(_) => tracing::error!("Crawl of {} panicked", host),
        }
        host
    }

    /// Releases a finished worker's slot and host reservation.
    fn release(&self, done: std::result::Result<String, tokio::task::JoinError>) {
        let mut inner = self.inner.lock().expect("queue lock poisoned");
        inner.in_flight = inner.in_flight.saturating_sub(1);
        match done {
            Ok(host) => {
                inner.tracked.remove(&host);
            }
            Err(e) if e.is_cancelled() => {
                tracing::warn!("Dropped an in-flight crawl during shutdown");
            }
            Err(e) => tracing::error!("Crawl worker failed: {}", e),
        }
    }

    /// Waits for in-flight crawls up to the grace period, then aborts them.
    async fn drain(&self, mut workers: JoinSet<String>) {
        if workers.is_empty() {
            tracing::info!("Shutting down Task Queue");
            return;
        }

        tracing::info!(
            "Shutting down Task Queue; waiting up to {:?} for {} crawl(s)",
            self.grace_period,
            workers.len()
        );

        let graceful = tokio::time::timeout(self.grace_period, async {
            while let Some(done) = workers.join_next().await {
                self.release(done);
            }
        })
        .await;

        if graceful.is_err() {
            tracing::warn!("Grace period expired; abandoning {} crawl task(s)", workers.len());
            workers.abort_all();
            while let Some(done) = workers.join_next().await {
                self.release(done);
            }
        }
    }
}
