//! Default configuration constants and profile templates.
//!
//! Keeping defaults in one module lets callers share the same constants
//! without duplicating literals.

use std::collections::BTreeMap;

use super::ModelConfig;

/// Default profile key selected when no profile is specified.
pub(super) const DEFAULT_MODEL_PROFILE_NAME: &str = "gpt";
/// Default provider model ID used by the default profile.
pub(super) const DEFAULT_MODEL_ID: &str = "gpt-4o";
/// Default OpenAI-compatible API base URL.
pub(super) const DEFAULT_API_BASE_URL: &str = "https://api.openai.com/v1";
/// Default timeout for model API requests.
pub(super) const DEFAULT_API_TIMEOUT_SECS: u64 = 120;
/// Default cap on model/tool iterations within a single user turn.
pub(super) const DEFAULT_MAX_ITERATIONS: u32 = 10;
/// Default per-call shell command timeout.
pub(super) const DEFAULT_SHELL_TIMEOUT_SECS: u64 = 120;
/// Hard ceiling a shell call may request for its timeout.
pub(super) const DEFAULT_SHELL_TIMEOUT_MAX_SECS: u64 = 600;

/// Catastrophic shell patterns that always require confirmation and are
/// rejected outright by the shell tool before any process is spawned.
pub(super) fn default_deny_patterns() -> Vec<String> {
    [
        "rm -rf /",
        "rm -fr /",
        "rm -rf /*",
        "rm -rf ~",
        "mkfs",
        "dd if=/dev/zero of=/dev/",
        "dd of=/dev/sd",
        "> /dev/sda",
        ":(){ :|:& };:",
    ]
    .iter()
    .map(ToString::to_string)
    .collect()
}

/// Branches that `git_push` refuses to force-push to.
pub(super) fn default_protected_branches() -> Vec<String> {
    vec!["main".to_string(), "master".to_string()]
}

/// Substrings (matched case-insensitively) that classify provider failures
/// as rate limiting.
pub(super) fn default_rate_limit_markers() -> Vec<String> {
    ["429", "rate limit", "too many requests"]
        .iter()
        .map(ToString::to_string)
        .collect()
}

/// Substrings that classify provider failures as model unavailability.
pub(super) fn default_model_unavailable_markers() -> Vec<String> {
    ["model_not_found", "does not exist", "unavailable", "overloaded", "503"]
        .iter()
        .map(ToString::to_string)
        .collect()
}

/// Substrings that classify provider failures as authentication problems.
pub(super) fn default_auth_error_markers() -> Vec<String> {
    ["401", "403", "api key", "unauthorized", "authentication"]
        .iter()
        .map(ToString::to_string)
        .collect()
}

/// Built-in model profiles available without any config file.
pub(super) fn default_models_map() -> BTreeMap<String, ModelConfig> {
    let mut models = BTreeMap::new();
    models.insert(
        DEFAULT_MODEL_PROFILE_NAME.to_string(),
        ModelConfig {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_key: String::new(),
            api_key_env: Some("OPENAI_API_KEY".to_string()),
            model: Some(DEFAULT_MODEL_ID.to_string()),
        },
    );
    // OpenRouter profile with env-based key lookup.
    models.insert(
        "openrouter-deepseek".to_string(),
        ModelConfig {
            api_base_url: "https://openrouter.ai/api/v1".to_string(),
            api_key: String::new(),
            api_key_env: Some("OPENROUTER_API_KEY".to_string()),
            model: Some("deepseek/deepseek-chat".to_string()),
        },
    );
    // Local Ollama profile; no key required.
    models.insert(
        "ollama".to_string(),
        ModelConfig {
            api_base_url: "http://localhost:11434/v1".to_string(),
            api_key: String::new(),
            api_key_env: None,
            model: Some("qwen2.5-coder".to_string()),
        },
    );
    models
}
