use crate::config::types::Config;
use crate::ConfigError;

/// Validates a parsed configuration
///
/// Catches the mistakes TOML parsing cannot: zero-sized pools, empty
/// identification fields, and a blank graph root.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.queue.capacity == 0 {
        return Err(ConfigError::Validation(
            "queue.capacity must be at least 1".to_string(),
        ));
    }

    if config.queue.backlog == 0 {
        return Err(ConfigError::Validation(
            "queue.backlog must be at least 1".to_string(),
        ));
    }

    if config.user_agent.crawler_name.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent.crawler-name must not be empty".to_string(),
        ));
    }

    if config.user_agent.contact_url.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent.contact-url must not be empty".to_string(),
        ));
    }

    if config.output.graph_root.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "output.graph-root must not be empty".to_string(),
        ));
    }

    if config.watcher.max_files_per_sweep == 0 {
        return Err(ConfigError::Validation(
            "watcher.max-files-per-sweep must be at least 1".to_string(),
        ));
    }

    Ok(())
}
