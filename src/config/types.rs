//! Configuration data structures.
//!
//! Every struct derives `Deserialize` with `#[serde(default)]` so a config
//! file can specify only the fields it wants to override; everything else
//! falls back to the built-in defaults.

use std::collections::BTreeMap;

use serde::Deserialize;

use super::defaults;

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Active API endpoint settings, resolved from the selected profile.
    pub api: ApiConfig,
    /// Named model profiles switchable at runtime with `/model`.
    pub models: BTreeMap<String, ModelConfig>,
    /// Orchestration loop settings.
    pub agent: AgentConfig,
    /// Confirmation and destructive-operation policy.
    pub safety: SafetyConfig,
    /// Per-tool settings.
    pub tools: ToolsConfig,
    /// Provider failure classification tables.
    pub classifier: ClassifierConfig,
    /// HTTP transport settings.
    pub network: NetworkConfig,
    /// Terminal output settings.
    pub display: DisplayConfig,
}

impl Default for Config {
    fn default() -> Self {
        let models = defaults::default_models_map();
        let api = ApiConfig::from_profile(
            defaults::DEFAULT_MODEL_PROFILE_NAME,
            &models[defaults::DEFAULT_MODEL_PROFILE_NAME],
        );
        Self {
            api,
            models,
            agent: AgentConfig::default(),
            safety: SafetyConfig::default(),
            tools: ToolsConfig::default(),
            classifier: ClassifierConfig::default(),
            network: NetworkConfig::default(),
            display: DisplayConfig::default(),
        }
    }
}

/// Resolved API endpoint settings for the active model.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub api_key: String,
    /// Provider model identifier sent in requests.
    pub model: String,
    /// Name of the profile this config was resolved from.
    pub profile: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::DEFAULT_API_BASE_URL.to_string(),
            api_key: String::new(),
            model: defaults::DEFAULT_MODEL_ID.to_string(),
            profile: defaults::DEFAULT_MODEL_PROFILE_NAME.to_string(),
        }
    }
}

impl ApiConfig {
    /// Resolve an [`ApiConfig`] from a named profile entry.
    ///
    /// An empty `api_key` falls back to the profile's `api_key_env`
    /// environment variable when one is named.
    pub fn from_profile(name: &str, profile: &ModelConfig) -> Self {
        let mut api_key = profile.api_key.clone();
        if api_key.is_empty() {
            if let Some(env_name) = &profile.api_key_env {
                api_key = std::env::var(env_name).unwrap_or_default();
            }
        }
        Self {
            base_url: profile.api_base_url.clone(),
            api_key,
            model: profile
                .model
                .clone()
                .unwrap_or_else(|| defaults::DEFAULT_MODEL_ID.to_string()),
            profile: name.to_string(),
        }
    }
}

/// One switchable model profile.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub api_base_url: String,
    /// Key in plain text. Prefer `api_key_env` for anything committed.
    pub api_key: String,
    /// Environment variable consulted when `api_key` is empty.
    pub api_key_env: Option<String>,
    pub model: Option<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_base_url: defaults::DEFAULT_API_BASE_URL.to_string(),
            api_key: String::new(),
            api_key_env: None,
            model: None,
        }
    }
}

/// Orchestration loop settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Cap on model round-trips within a single user turn.
    pub max_iterations: u32,
    /// Extra text appended to the built-in system prompt.
    pub system_prompt: Option<String>,
    pub temperature: Option<f32>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: defaults::DEFAULT_MAX_ITERATIONS,
            system_prompt: None,
            temperature: None,
        }
    }
}

/// Confirmation policy settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SafetyConfig {
    /// Skip confirmation for everything except extremely dangerous operations.
    pub auto_confirm: bool,
    /// Confirm every destructive operation; overrides `auto_confirm`.
    pub safe_mode: bool,
    /// Shell substrings that are always treated as extremely dangerous.
    pub deny_patterns: Vec<String>,
    /// Branches `git_push` refuses to force-push to.
    pub protected_branches: Vec<String>,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            auto_confirm: false,
            safe_mode: false,
            deny_patterns: defaults::default_deny_patterns(),
            protected_branches: defaults::default_protected_branches(),
        }
    }
}

/// Per-tool settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Default shell command timeout in seconds.
    pub shell_timeout_secs: u64,
    /// Ceiling on per-call timeout overrides.
    pub shell_timeout_max_secs: u64,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            shell_timeout_secs: defaults::DEFAULT_SHELL_TIMEOUT_SECS,
            shell_timeout_max_secs: defaults::DEFAULT_SHELL_TIMEOUT_MAX_SECS,
        }
    }
}

/// Substring tables that map provider error text to failure categories.
/// Matching is case-insensitive; first category with a hit wins, checked in
/// field order.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub rate_limit: Vec<String>,
    pub model_unavailable: Vec<String>,
    pub auth_error: Vec<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            rate_limit: defaults::default_rate_limit_markers(),
            model_unavailable: defaults::default_model_unavailable_markers(),
            auth_error: defaults::default_auth_error_markers(),
        }
    }
}

/// HTTP transport settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub api_timeout_secs: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            api_timeout_secs: defaults::DEFAULT_API_TIMEOUT_SECS,
        }
    }
}

/// Terminal output settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub color: bool,
    /// Print a line for each tool call the model makes.
    pub show_tool_calls: bool,
    /// Print token usage after each turn.
    pub show_tokens: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            color: true,
            show_tool_calls: true,
            show_tokens: false,
        }
    }
}
