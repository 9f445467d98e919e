use serde::Deserialize;
use std::path::PathBuf;

use crate::storage::Compressor;

/// Main configuration structure for LinkAtlas
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub queue: QueueConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub watcher: WatcherConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// How deep to follow links from the start URL
    #[serde(rename = "crawl-depth", default)]
    pub crawl_depth: CrawlDepth,

    /// How many requests a single crawl may keep in flight
    #[serde(rename = "request-limit", default)]
    pub request_limit: RequestLimit,

    /// Accept-Language header sent with every request
    #[serde(rename = "accept-language", default = "default_accept_language")]
    pub accept_language: String,
}

/// Named crawl depth tiers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrawlDepth {
    Shallow,
    #[default]
    Average,
    Deep,
}

impl CrawlDepth {
    /// The maximum link depth this tier allows.
    pub fn depth(&self) -> u32 {
        match self {
            Self::Shallow => 5,
            Self::Average => 8,
            Self::Deep => 12,
        }
    }
}

/// Named concurrency tiers for in-flight requests per crawl
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestLimit {
    Gentle,
    #[default]
    Average,
    Aggressive,
}

impl RequestLimit {
    /// The number of semaphore permits this tier grants.
    pub fn permits(&self) -> usize {
        match self {
            Self::Gentle => 10,
            Self::Average => 20,
            Self::Aggressive => 30,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,
}

impl UserAgentConfig {
    /// Formats the User-Agent header value.
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{})",
            self.crawler_name, self.crawler_version, self.contact_url
        )
    }
}

/// Task queue configuration
#[derive(Debug, Clone, Deserialize)]
pub struct QueueConfig {
    /// Maximum number of concurrent crawls
    pub capacity: usize,

    /// Maximum number of tasks waiting for a slot
    #[serde(default = "default_backlog")]
    pub backlog: usize,

    /// Seconds to wait for in-flight crawls on shutdown
    #[serde(rename = "grace-period-secs", default = "default_grace_period")]
    pub grace_period_secs: u64,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory holding the persisted graph files
    #[serde(rename = "graph-root")]
    pub graph_root: PathBuf,

    /// Compression codec for persisted graphs
    pub compressor: Compressor,
}

/// Background watcher configuration
#[derive(Debug, Clone, Deserialize)]
pub struct WatcherConfig {
    /// Seconds between scheduler ticks
    #[serde(rename = "interval-secs", default = "default_watch_interval")]
    pub interval_secs: u64,

    /// Maximum graph files reloaded per info-updater tick
    #[serde(rename = "max-files-per-sweep", default = "default_files_per_sweep")]
    pub max_files_per_sweep: usize,

    /// How many long-range jump candidates to keep per graph
    #[serde(rename = "teleport-count", default = "default_teleport_count")]
    pub teleport_count: usize,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_watch_interval(),
            max_files_per_sweep: default_files_per_sweep(),
            teleport_count: default_teleport_count(),
        }
    }
}

/// Deployment profile, selected by the `ENV` environment variable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    /// Reads the profile from `ENV`, defaulting to development.
    pub fn from_env() -> Self {
        match std::env::var("ENV").as_deref() {
            Ok("production") => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }
}

fn default_accept_language() -> String {
    "en, el-GR;q=0.9".to_string()
}

fn default_backlog() -> usize {
    16
}

fn default_grace_period() -> u64 {
    30
}

fn default_watch_interval() -> u64 {
    30
}

fn default_files_per_sweep() -> usize {
    8
}

fn default_teleport_count() -> usize {
    3
}
