//! Tool call execution with confirmation policy.
//!
//! The executor is the single boundary between the orchestration loop and
//! tools. Every failure mode (unknown tool, bad arguments, declined
//! confirmation, tool defect) is normalized into a failed
//! [`ToolResult`] so the loop can always hand the model something to read.

use std::collections::HashSet;

use serde_json::Value;
use tracing::debug;

use crate::error::ToolError;
use crate::safety::{
    should_confirm, ConfirmationPrompt, ConfirmationReply, ConfirmationRequest, SafetyPreferences,
};
use crate::tools::{parse_arguments, Tool, ToolRegistry};
use crate::types::{ToolCall, ToolResult};

/// Result text returned when the user declines a confirmation.
pub const CANCELLED_BY_USER: &str = "Operation cancelled by user";

/// Executes tool calls under the configured safety policy.
pub struct ToolExecutor {
    prefs: SafetyPreferences,
    deny_patterns: Vec<String>,
    prompt: Box<dyn ConfirmationPrompt>,
    /// Confirmation keys the user opted to remember this session.
    remembered: HashSet<String>,
}

impl ToolExecutor {
    pub fn new(
        prefs: SafetyPreferences,
        deny_patterns: Vec<String>,
        prompt: Box<dyn ConfirmationPrompt>,
    ) -> Self {
        Self {
            prefs,
            deny_patterns,
            prompt,
            remembered: HashSet::new(),
        }
    }

    /// Executor that approves everything without prompting. For one-shot
    /// mode with `--yes` and for tests.
    pub fn auto_approving() -> Self {
        Self::new(
            SafetyPreferences {
                auto_confirm: true,
                safe_mode: false,
            },
            Vec::new(),
            Box::new(ApproveAll),
        )
    }

    /// Execute a batch of tool calls sequentially.
    ///
    /// Always returns one result per call, in order; a failing call never
    /// aborts the rest of the batch.
    pub async fn execute_batch(
        &mut self,
        registry: &ToolRegistry,
        calls: &[ToolCall],
    ) -> Vec<ToolResult> {
        let mut results = Vec::with_capacity(calls.len());
        for call in calls {
            results.push(self.execute_single(registry, call).await);
        }
        results
    }

    /// Execute one tool call, applying the confirmation policy.
    pub async fn execute_single(&mut self, registry: &ToolRegistry, call: &ToolCall) -> ToolResult {
        let name = call.function.name.as_str();
        // Unknown tools fail without any confirmation round-trip.
        let Some(tool) = registry.get(name) else {
            return ToolResult::fail(format!("unknown tool: {name}"));
        };

        let args = match parse_arguments(&call.function.arguments) {
            Ok(args) => args,
            Err(e) => return ToolResult::fail(e.to_string()),
        };

        if should_confirm(self.prefs, tool, &args, &self.deny_patterns) {
            let key = confirmation_key(name, &args);
            if self.remembered.contains(&key) {
                debug!(tool = name, "confirmation remembered, skipping prompt");
            } else {
                let request = ConfirmationRequest {
                    tool_name: name.to_string(),
                    summary: tool.describe_call(&args),
                };
                let reply = self.prompt.confirm(&request).await;
                if !reply.proceed {
                    debug!(tool = name, "user declined tool call");
                    return ToolResult::fail(CANCELLED_BY_USER);
                }
                if reply.remember {
                    self.remembered.insert(key);
                }
            }
        }

        match tool.execute(&args).await {
            Ok(result) => result,
            Err(ToolError::InvalidArguments(msg)) => {
                ToolResult::fail(format!("invalid arguments: {msg}"))
            }
            Err(ToolError::ExecutionFailed(msg)) => {
                ToolResult::fail(format!("execution failed: {msg}"))
            }
        }
    }
}

/// Session-memory key for a confirmed call: tool name plus canonical
/// arguments, so the same call expressed with different key order maps to
/// the same key.
pub fn confirmation_key(tool_name: &str, args: &Value) -> String {
    format!("{tool_name}:{}", canonical_json(args))
}

/// Serialize JSON with object keys sorted recursively.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            // serde_json's default map is ordered, but sort explicitly so
            // canonical form does not depend on build features.
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String((*key).clone()).to_string());
                out.push(':');
                write_canonical(&map[*key], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        other => out.push_str(&other.to_string()),
    }
}

/// Prompt that approves every request. Test and `--yes` helper.
pub struct ApproveAll;

#[async_trait::async_trait]
impl ConfirmationPrompt for ApproveAll {
    async fn confirm(&self, _request: &ConfirmationRequest) -> ConfirmationReply {
        ConfirmationReply::approved(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct EchoTool {
        destructive: bool,
    }

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &'static str {
            "echo"
        }
        fn description(&self) -> &'static str {
            "echoes arguments"
        }
        fn schema(&self) -> Value {
            json!({"type": "object", "properties": {"text": {"type": "string"}}})
        }
        fn destructive(&self) -> bool {
            self.destructive
        }
        fn requires_confirmation(&self) -> bool {
            self.destructive
        }
        fn describe_call(&self, args: &Value) -> String {
            format!("echo {args}")
        }
        async fn execute(&self, args: &Value) -> Result<ToolResult, ToolError> {
            Ok(ToolResult::ok(args.to_string()))
        }
    }

    /// Scripted prompt that counts how often it is consulted.
    struct CountingPrompt {
        reply: ConfirmationReply,
        asked: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ConfirmationPrompt for CountingPrompt {
        async fn confirm(&self, _request: &ConfirmationRequest) -> ConfirmationReply {
            self.asked.fetch_add(1, Ordering::SeqCst);
            self.reply
        }
    }

    fn registry(destructive: bool) -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool { destructive }));
        registry
    }

    fn executor_with(
        prefs: SafetyPreferences,
        reply: ConfirmationReply,
        asked: Arc<AtomicUsize>,
    ) -> ToolExecutor {
        ToolExecutor::new(
            prefs,
            Vec::new(),
            Box::new(CountingPrompt { reply, asked }),
        )
    }

    fn call(arguments: &str) -> ToolCall {
        ToolCall::function("call_1", "echo", arguments)
    }

    #[tokio::test]
    async fn unknown_tool_fails_without_prompting() {
        let asked = Arc::new(AtomicUsize::new(0));
        let mut executor = executor_with(
            SafetyPreferences {
                safe_mode: true,
                ..Default::default()
            },
            ConfirmationReply::approved(false),
            asked.clone(),
        );
        let registry = ToolRegistry::new();
        let result = executor
            .execute_single(&registry, &ToolCall::function("c1", "nope", "{}"))
            .await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("unknown tool: nope"));
        assert_eq!(asked.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn invalid_json_arguments_fail_without_prompting() {
        let asked = Arc::new(AtomicUsize::new(0));
        let mut executor = executor_with(
            SafetyPreferences::default(),
            ConfirmationReply::approved(false),
            asked.clone(),
        );
        let result = executor
            .execute_single(&registry(true), &call("{broken"))
            .await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("not valid JSON"));
        assert_eq!(asked.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn declined_confirmation_cancels_without_remembering() {
        let asked = Arc::new(AtomicUsize::new(0));
        let mut executor = executor_with(
            SafetyPreferences::default(),
            ConfirmationReply::declined(),
            asked.clone(),
        );
        let registry = registry(true);

        let result = executor.execute_single(&registry, &call("{}")).await;
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some(CANCELLED_BY_USER));

        // The identical call prompts again: declines are not remembered.
        executor.execute_single(&registry, &call("{}")).await;
        assert_eq!(asked.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn remembered_approval_skips_future_prompts() {
        let asked = Arc::new(AtomicUsize::new(0));
        let mut executor = executor_with(
            SafetyPreferences::default(),
            ConfirmationReply::approved(true),
            asked.clone(),
        );
        let registry = registry(true);

        executor
            .execute_single(&registry, &call(r#"{"a":1,"b":2}"#))
            .await;
        assert_eq!(asked.load(Ordering::SeqCst), 1);

        // Same arguments in a different key order hit the same memory key.
        executor
            .execute_single(&registry, &call(r#"{"b":2,"a":1}"#))
            .await;
        assert_eq!(asked.load(Ordering::SeqCst), 1);

        // Different arguments prompt again.
        executor
            .execute_single(&registry, &call(r#"{"a":9}"#))
            .await;
        assert_eq!(asked.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn safe_mode_confirms_destructive_tools() {
        let asked = Arc::new(AtomicUsize::new(0));
        let mut executor = executor_with(
            SafetyPreferences {
                auto_confirm: true,
                safe_mode: true,
            },
            ConfirmationReply::approved(false),
            asked.clone(),
        );
        executor.execute_single(&registry(true), &call("{}")).await;
        // safe_mode wins over auto_confirm.
        assert_eq!(asked.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn auto_confirm_skips_ordinary_destructive_tools() {
        let asked = Arc::new(AtomicUsize::new(0));
        let mut executor = executor_with(
            SafetyPreferences {
                auto_confirm: true,
                safe_mode: false,
            },
            ConfirmationReply::approved(false),
            asked.clone(),
        );
        let result = executor.execute_single(&registry(true), &call("{}")).await;
        assert!(result.success);
        assert_eq!(asked.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn batch_continues_past_failures() {
        let mut executor = ToolExecutor::auto_approving();
        let registry = registry(false);
        let calls = vec![
            ToolCall::function("c1", "echo", "{}"),
            ToolCall::function("c2", "missing", "{}"),
            ToolCall::function("c3", "echo", "{}"),
        ];
        let results = executor.execute_batch(&registry, &calls).await;
        assert_eq!(results.len(), 3);
        assert!(results[0].success);
        assert!(!results[1].success);
        assert!(results[2].success);
    }

    #[test]
    fn canonical_json_sorts_keys_recursively() {
        let a = json!({"b": {"y": 2, "x": 1}, "a": [1, {"k": true}]});
        let b = json!({"a": [1, {"k": true}], "b": {"x": 1, "y": 2}});
        assert_eq!(canonical_json(&a), canonical_json(&b));
        assert_eq!(
            canonical_json(&json!({"b": 2, "a": 1})),
            r#"{"a":1,"b":2}"#
        );
    }

    #[test]
    fn confirmation_key_includes_tool_name() {
        let args = json!({"path": "x"});
        assert_ne!(
            confirmation_key("write_file", &args),
            confirmation_key("edit_file", &args)
        );
    }
}
