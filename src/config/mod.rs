//! Configuration loading.
//!
//! Precedence, highest first:
//!   1. explicit `--config` path
//!   2. `./sidekick.toml` in the working directory
//!   3. `~/.config/sidekick/sidekick.toml`
//!   4. built-in defaults
//!
//! After file loading, `SIDEKICK_API_KEY`, `SIDEKICK_BASE_URL`, and
//! `SIDEKICK_MODEL` environment variables override the resolved API settings.

mod defaults;
mod types;

pub use types::{
    AgentConfig, ApiConfig, ClassifierConfig, Config, DisplayConfig, ModelConfig, NetworkConfig,
    SafetyConfig, ToolsConfig,
};

use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Config file name searched for in the working directory and config home.
pub const CONFIG_FILE_NAME: &str = "sidekick.toml";

/// Load configuration with standard precedence and env overrides applied.
pub fn load_config(explicit_path: Option<&Path>) -> Result<Config, ConfigError> {
    let mut config = match resolve_config_path(explicit_path)? {
        Some(path) => parse_config_file(&path)?,
        None => Config::default(),
    };
    apply_env_overrides(&mut config);
    validate(&config)?;
    Ok(config)
}

/// Parse a config file into a [`Config`], filling omitted fields with defaults.
pub fn parse_config_file(path: &Path) -> Result<Config, ConfigError> {
    let text = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&text)?;
    Ok(config)
}

/// Re-resolve `config.api` from a named profile in `config.models`.
pub fn select_model_profile(config: &mut Config, name: &str) -> Result<(), ConfigError> {
    let profile = config
        .models
        .get(name)
        .ok_or_else(|| ConfigError::Invalid(format!("unknown model profile: {name}")))?
        .clone();
    config.api = ApiConfig::from_profile(name, &profile);
    Ok(())
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Result<Option<PathBuf>, ConfigError> {
    if let Some(path) = explicit_path {
        if !path.exists() {
            return Err(ConfigError::Invalid(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        return Ok(Some(path.to_path_buf()));
    }

    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return Ok(Some(local));
    }

    if let Some(config_home) = dirs::config_dir() {
        let user = config_home.join("sidekick").join(CONFIG_FILE_NAME);
        if user.exists() {
            return Ok(Some(user));
        }
    }

    Ok(None)
}

fn apply_env_overrides(config: &mut Config) {
    if let Ok(key) = std::env::var("SIDEKICK_API_KEY") {
        if !key.is_empty() {
            config.api.api_key = key;
        }
    }
    if let Ok(url) = std::env::var("SIDEKICK_BASE_URL") {
        if !url.is_empty() {
            config.api.base_url = url;
        }
    }
    if let Ok(model) = std::env::var("SIDEKICK_MODEL") {
        if !model.is_empty() {
            config.api.model = model;
        }
    }
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.agent.max_iterations == 0 {
        return Err(ConfigError::Invalid(
            "agent.max_iterations must be at least 1".to_string(),
        ));
    }
    if config.tools.shell_timeout_secs > config.tools.shell_timeout_max_secs {
        return Err(ConfigError::Invalid(
            "tools.shell_timeout_secs exceeds tools.shell_timeout_max_secs".to_string(),
        ));
    }
    if config.api.base_url.is_empty() {
        return Err(ConfigError::Invalid("api.base_url is empty".to_string()));
    }
    Ok(())
}
