//! LinkAtlas: a polite web cartographer
//!
//! This crate implements an asynchronous, single-origin web crawler coupled to
//! an in-process task queue. Each crawl maps the link structure of one website
//! into an undirected graph, which is compressed and persisted to disk. A
//! background watcher keeps in-memory metadata about the persisted graphs
//! fresh and removes files that turned out empty or malformed.

pub mod config;
pub mod crawler;
pub mod graph;
pub mod manager;
pub mod queue;
pub mod robots;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for LinkAtlas operations
#[derive(Debug, Error)]
pub enum AtlasError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("HTTP error for {url}: status {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("Graph serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Graph not found for host: {0}")]
    GraphNotFound(String),

    #[error("Task queue is shut down")]
    QueueClosed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unknown compressor: {0}")]
    UnknownCompressor(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL: {0}")]
    MissingHost(String),
}

/// Result type alias for LinkAtlas operations
pub type Result<T> = std::result::Result<T, AtlasError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use graph::{GraphInfo, LinkGraph};
pub use queue::{CrawlTask, EnqueueOutcome, TaskQueue};
pub use state::AppState;
pub use storage::{Compressor, GraphStore};
