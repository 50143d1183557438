//! Confirmation policy for destructive operations.
//!
//! Policy tiers, checked strictly in order:
//!   1. `auto_confirm` without `safe_mode`: only extremely dangerous
//!      operations are confirmed.
//!   2. `safe_mode`: every destructive operation is confirmed.
//!   3. default: each tool's own `requires_confirmation` decides.

use async_trait::async_trait;
use serde_json::Value;

use crate::tools::Tool;

/// User-level confirmation preferences, resolved from config and CLI flags.
#[derive(Debug, Clone, Copy, Default)]
pub struct SafetyPreferences {
    pub auto_confirm: bool,
    pub safe_mode: bool,
}

/// What the user is asked to approve.
#[derive(Debug, Clone)]
pub struct ConfirmationRequest {
    pub tool_name: String,
    /// Human-readable one-liner from the tool's `describe_call`.
    pub summary: String,
}

/// The user's answer to a confirmation request.
#[derive(Debug, Clone, Copy)]
pub struct ConfirmationReply {
    pub proceed: bool,
    /// Skip future prompts for the identical call this session.
    pub remember: bool,
}

impl ConfirmationReply {
    pub fn approved(remember: bool) -> Self {
        Self {
            proceed: true,
            remember,
        }
    }

    pub fn declined() -> Self {
        Self {
            proceed: false,
            remember: false,
        }
    }
}

/// Asks the user whether a tool call may proceed.
#[async_trait]
pub trait ConfirmationPrompt: Send + Sync {
    async fn confirm(&self, request: &ConfirmationRequest) -> ConfirmationReply;
}

/// Decide whether this call needs user confirmation.
pub fn should_confirm(
    prefs: SafetyPreferences,
    tool: &dyn Tool,
    args: &Value,
    deny_patterns: &[String],
) -> bool {
    if prefs.auto_confirm && !prefs.safe_mode {
        return is_extremely_dangerous(tool.name(), args, deny_patterns);
    }
    if prefs.safe_mode {
        return tool.destructive();
    }
    tool.requires_confirmation()
}

/// Operations confirmed even under `auto_confirm`.
pub fn is_extremely_dangerous(tool_name: &str, args: &Value, deny_patterns: &[String]) -> bool {
    match tool_name {
        "git_push" => args
            .get("force")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        "git_branch" => args
            .get("action")
            .and_then(Value::as_str)
            .is_some_and(|action| action == "delete"),
        "run_shell" => args
            .get("command")
            .and_then(Value::as_str)
            .and_then(|command| matched_deny_pattern(command, deny_patterns))
            .is_some(),
        _ => false,
    }
}

/// First deny pattern the command matches, lowercase substring semantics.
pub fn matched_deny_pattern<'a>(command: &str, patterns: &'a [String]) -> Option<&'a str> {
    let lowered = command.to_lowercase();
    patterns
        .iter()
        .find(|pattern| !pattern.is_empty() && lowered.contains(&pattern.to_lowercase()))
        .map(String::as_str)
}

/// Interpret a typed yes/no answer. Empty input means no.
pub fn parse_decision(input: &str) -> bool {
    matches!(input.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Interactive stdin prompt used by the REPL.
#[derive(Debug, Default)]
pub struct TerminalPrompt;

#[async_trait]
impl ConfirmationPrompt for TerminalPrompt {
    async fn confirm(&self, request: &ConfirmationRequest) -> ConfirmationReply {
        println!("{} wants to: {}", request.tool_name, request.summary);
        let proceed = ask("Proceed? [y/N] ").await;
        if !proceed {
            return ConfirmationReply::declined();
        }
        let remember = ask("Don't ask again for this exact call? [y/N] ").await;
        ConfirmationReply::approved(remember)
    }
}

async fn ask(question: &str) -> bool {
    use std::io::Write;
    print!("{question}");
    let _ = std::io::stdout().flush();
    let answer = tokio::task::spawn_blocking(|| {
        let mut line = String::new();
        match std::io::stdin().read_line(&mut line) {
            Ok(_) => line,
            Err(_) => String::new(),
        }
    })
    .await
    .unwrap_or_default();
    parse_decision(&answer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_decision_accepts_yes_variants() {
        assert!(parse_decision("y"));
        assert!(parse_decision("YES"));
        assert!(parse_decision("  yes \n"));
        assert!(!parse_decision(""));
        assert!(!parse_decision("n"));
        assert!(!parse_decision("sure"));
    }

    #[test]
    fn force_push_is_extremely_dangerous() {
        assert!(is_extremely_dangerous(
            "git_push",
            &json!({"force": true}),
            &[]
        ));
        assert!(!is_extremely_dangerous(
            "git_push",
            &json!({"force": false}),
            &[]
        ));
        assert!(!is_extremely_dangerous("git_push", &json!({}), &[]));
    }

    #[test]
    fn branch_delete_is_extremely_dangerous() {
        assert!(is_extremely_dangerous(
            "git_branch",
            &json!({"action": "delete", "name": "old"}),
            &[]
        ));
        assert!(!is_extremely_dangerous(
            "git_branch",
            &json!({"action": "create", "name": "new"}),
            &[]
        ));
    }

    #[test]
    fn shell_deny_pattern_matches_case_insensitively() {
        let patterns = vec!["rm -rf /".to_string()];
        assert!(is_extremely_dangerous(
            "run_shell",
            &json!({"command": "sudo RM -RF / --no-preserve-root"}),
            &patterns
        ));
        assert!(!is_extremely_dangerous(
            "run_shell",
            &json!({"command": "ls -la"}),
            &patterns
        ));
    }
}
