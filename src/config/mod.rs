mod types;

pub use types::*;

use crate::{Error, Result};
use std::env;
use std::path::Path;
use tracing::debug;

const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// Loads the configuration named by `CONFIG_PATH`.
///
/// Without `CONFIG_PATH`, a missing `config.yaml` falls back to the built-in
/// defaults. An explicitly named file must exist.
pub async fn load() -> Result<Config> {
    load_with(|key| env::var(key).ok()).await
}

/// [`load`] with environment lookups routed through `lookup`.
pub async fn load_with(lookup: impl Fn(&str) -> Option<String>) -> Result<Config> {
    let mut config = match lookup("CONFIG_PATH") {
        Some(path) => load_from(&path).await?,
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
            load_from(DEFAULT_CONFIG_PATH).await?
        }
        None => {
            debug!("No {} found, using defaults", DEFAULT_CONFIG_PATH);
            Config::default()
        }
    };

    apply_env_overrides(&mut config, lookup);
    config.validate()?;
    Ok(config)
}

/// Applies `MODEL_PATH` and `CHAT_LOG_PATH` on top of the file values.
pub fn apply_env_overrides(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(path) = lookup("MODEL_PATH") {
        config.model.path = path;
    }
    if let Some(path) = lookup("CHAT_LOG_PATH") {
        config.server.chat_log_path = path;
    }
}

pub async fn load_from(path: &str) -> Result<Config> {
    debug!("Loading configuration from: {}", path);

    let config_str = tokio::fs::read_to_string(path).await?;
    let config: Config = serde_yaml::from_str(&config_str)?;

    Ok(config)
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.model.path.trim().is_empty() {
            return Err(Error::config("model.path must not be empty"));
        }
        if self.model.context_size == 0 {
            return Err(Error::config("model.context_size must be positive"));
        }
        if self.model.threads == 0 {
            return Err(Error::config("model.threads must be positive"));
        }
        if self.generation.max_tokens == 0 {
            return Err(Error::config("generation.max_tokens must be positive"));
        }
        if self.generation.max_tokens >= self.model.context_size {
            return Err(Error::config(format!(
                "generation.max_tokens ({}) must be smaller than model.context_size ({})",
                self.generation.max_tokens, self.model.context_size
            )));
        }
        if self.generation.stop.iter().any(|s| s.is_empty()) {
            return Err(Error::config("generation.stop entries must not be empty"));
        }
        Ok(())
    }
}
