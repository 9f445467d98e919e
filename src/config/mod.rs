//! Configuration module for LinkAtlas
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files, plus the environment overrides (`ENV`, `GRAPH_ROOT`) applied on
//! top of them.

mod parser;
mod types;
mod validation;

pub use parser::load_config;
pub use types::{
    Config, CrawlDepth, CrawlerConfig, Environment, OutputConfig, QueueConfig, RequestLimit,
    UserAgentConfig, WatcherConfig,
};
