//! Crawler module
//!
//! Everything one crawl task needs: the scoped HTTP client, link extraction,
//! the traversal engine, and the task entry point wiring them together.

mod client;
mod engine;
mod parser;

pub use client::{decode_body, FetchOutcome, RetryPolicy, ScopedClient};
pub use engine::{Crawler, FailureKind, FailureLedger};
pub use parser::extract_links;

use crate::config::{Config, Environment};
use crate::queue::CrawlTask;
use crate::robots::RobotsPolicy;
use crate::storage::GraphStore;
use crate::Result;

/// Runs one crawl task end to end: client setup, robots fetch, traversal,
/// and graph persistence.
///
/// A start URL that fails the pre-crawl probe aborts the task cleanly; the
/// empty graph is below the persistence threshold so nothing is written.
pub async fn process_task(
    task: &CrawlTask,
    config: &Config,
    environment: Environment,
    store: &GraphStore,
) -> Result<()> {
    let client = ScopedClient::for_origin(&task.url, config, environment)?;
    let robots = RobotsPolicy::fetch(&client).await;

    let mut crawler = Crawler::new(client, robots, task.crawl_depth, task.request_limit);

    if !crawler.pre_crawl_setup(&task.url).await {
        return Ok(());
    }

    tracing::info!("Crawling Website");
    crawler.build_graph(&task.url).await;

    tracing::info!("Compressing Graph");
    crawler.compress_graph(&task.host, store)?;

    Ok(())
}
