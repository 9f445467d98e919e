use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// After parsing, environment overrides are applied: `GRAPH_ROOT` replaces
/// the configured graph directory when set.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use linkatlas::config::load_config;
///
/// let config = load_config(Path::new("config.toml")).unwrap();
/// println!("Queue capacity: {}", config.queue.capacity);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut config: Config = toml::from_str(&content)?;

    apply_env_overrides(&mut config);
    validate(&config)?;

    Ok(config)
}

/// Applies environment-variable overrides to a parsed configuration
fn apply_env_overrides(config: &mut Config) {
    if let Ok(root) = std::env::var("GRAPH_ROOT") {
        if !root.is_empty() {
            config.output.graph_root = root.into();
        }
    }
}
