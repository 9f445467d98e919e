//! LinkAtlas main entry point
//!
//! This is the command-line interface for the LinkAtlas crawler daemon.

use clap::Parser;
use linkatlas::config::load_config;
use linkatlas::queue::EnqueueOutcome;
use linkatlas::state::AppState;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// LinkAtlas: a polite web cartographer
///
/// LinkAtlas crawls websites one origin at a time, honoring robots.txt, and
/// maps each site's link structure into a compressed undirected graph on
/// disk. A background watcher keeps graph metadata fresh and removes files
/// that turned out empty or malformed.
#[derive(Parser, Debug)]
#[command(name = "linkatlas")]
#[command(version = "0.4.2")]
#[command(about = "A polite web cartographer", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Enqueue a URL for crawling (repeatable)
    #[arg(short = 'u', long = "queue", value_name = "URL")]
    queue: Vec<String>,

    /// Keep running after the queue drains (daemon mode)
    #[arg(long, conflicts_with_all = ["list", "clean"])]
    watch: bool,

    /// List persisted graphs with their metadata and exit
    #[arg(long, conflicts_with_all = ["watch", "clean"])]
    list: bool,

    /// Run one cleanup sweep over the graph directory and exit
    #[arg(long, conflicts_with_all = ["watch", "list"])]
    clean: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = match load_config(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    let state = AppState::initialize(config)?;

    if cli.list {
        handle_list(&state).await?;
    } else if cli.clean {
        handle_clean(&state).await;
    } else {
        handle_run(&state, &cli.queue, cli.watch).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("linkatlas=info,warn"),
            1 => EnvFilter::new("linkatlas=debug,info"),
            2 => EnvFilter::new("linkatlas=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --list mode: prints metadata for every persisted graph
async fn handle_list(state: &AppState) -> Result<(), Box<dyn std::error::Error>> {
    // the updater reloads a bounded number of files per call; iterate until
    // the listing stops growing so it reflects the whole directory
    let mut previous = usize::MAX;
    loop {
        state.info_updater().update_info().await;
        let count = state.info_updater().hosts().len();
        if count == previous {
            break;
        }
        previous = count;
    }

    let hosts = state.info_updater().hosts();
    if hosts.is_empty() {
        println!("No graphs persisted under {}", state.graph_root().display());
        return Ok(());
    }

    println!("Persisted graphs ({}):", hosts.len());
    for host in hosts {
        if let Some(info) = state.info_updater().get(&host) {
            println!(
                "  {} - {} nodes, {} edges, teleports: {}",
                info.host,
                info.node_count,
                info.edge_count,
                info.teleport_nodes.join(", ")
            );
        }
    }
    Ok(())
}

/// Handles the --clean mode: one cleanup sweep
async fn handle_clean(state: &AppState) {
    let removed = state.cleaner().sweep().await;
    println!("Removed {} dirty graph file(s)", removed);
}

/// Handles the default mode: enqueue URLs and run the worker loop
async fn handle_run(
    state: &AppState,
    urls: &[String],
    watch: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if urls.is_empty() && !watch {
        tracing::warn!("Nothing to do: no URLs queued and --watch not set");
        return Ok(());
    }

    let (worker, scheduler) = state.spawn_background();

    for url in urls {
        match state.queue().enqueue(url) {
            Ok(EnqueueOutcome::Accepted { position }) => {
                tracing::info!("Queued {} for crawling (position {})", url, position);
            }
            Ok(EnqueueOutcome::Duplicate) => {
                tracing::warn!("Skipping {}: already queued or in flight", url);
            }
            Ok(EnqueueOutcome::Full) => {
                tracing::warn!("Skipping {}: queue is full", url);
            }
            Err(e) => {
                tracing::error!("Rejected {}: {}", url, e);
            }
        }
    }

    if watch {
        tracing::info!("Running until interrupted (Ctrl-C to stop)");
        tokio::signal::ctrl_c().await?;
    } else {
        tokio::select! {
            _ = state.queue().wait_idle() => {
                tracing::info!("Queue drained");
            }
            result = tokio::signal::ctrl_c() => {
                result?;
                tracing::info!("Interrupted");
            }
        }
    }

    state.shutdown();
    worker.await?;
    scheduler.await?;

    Ok(())
}
