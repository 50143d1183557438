//! Shell command execution tool.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::process::Command;

use crate::error::ToolError;
use crate::safety::matched_deny_pattern;
use crate::textutil::{clip_output, clip_summary};
use crate::types::ToolResult;

use super::Tool;

/// Byte cap applied to each captured stream.
const OUTPUT_LIMIT_BYTES: usize = 4_000;

#[derive(Debug, Deserialize)]
struct RunShellArgs {
    command: String,
    /// Per-call timeout override in seconds, clamped to the configured max.
    #[serde(default)]
    timeout_secs: Option<u64>,
}

/// Run a shell command via `sh -c`.
pub struct RunShellTool {
    deny_patterns: Vec<String>,
    default_timeout_secs: u64,
    max_timeout_secs: u64,
}

impl RunShellTool {
    pub fn new(deny_patterns: Vec<String>, default_timeout_secs: u64, max_timeout_secs: u64) -> Self {
        Self {
            deny_patterns,
            default_timeout_secs,
            max_timeout_secs,
        }
    }

    fn effective_timeout(&self, requested: Option<u64>) -> Duration {
        let secs = requested
            .unwrap_or(self.default_timeout_secs)
            .clamp(1, self.max_timeout_secs);
        Duration::from_secs(secs)
    }
}

#[async_trait]
impl Tool for RunShellTool {
    fn name(&self) -> &'static str {
        "run_shell"
    }

    fn description(&self) -> &'static str {
        "Run a shell command and return its output and exit code"
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "command": {"type": "string", "description": "Shell command to run"},
                "timeout_secs": {
                    "type": "integer",
                    "description": "Timeout in seconds for this command"
                }
            },
            "required": ["command"]
        })
    }

    fn destructive(&self) -> bool {
        true
    }

    fn requires_confirmation(&self) -> bool {
        true
    }

    fn describe_call(&self, args: &Value) -> String {
        match args.get("command").and_then(Value::as_str) {
            Some(command) => format!("Run shell command: {}", clip_summary(command, 80)),
            None => "Run shell command".to_string(),
        }
    }

    async fn execute(&self, args: &Value) -> Result<ToolResult, ToolError> {
        let args: RunShellArgs =
            RunShellArgs::deserialize(args).map_err(|e| ToolError::InvalidArguments(e.to_string()))?;
        if args.command.trim().is_empty() {
            return Err(ToolError::InvalidArguments(
                "command must not be empty".to_string(),
            ));
        }

        // Denied commands never reach a process spawn.
        if let Some(pattern) = matched_deny_pattern(&args.command, &self.deny_patterns) {
            return Ok(ToolResult::fail(format!(
                "command blocked by safety policy (matched \"{pattern}\")"
            )));
        }

        let timeout = self.effective_timeout(args.timeout_secs);
        let child = Command::new("sh")
            .arg("-c")
            .arg(&args.command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(timeout, child).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Ok(ToolResult::fail(format!("could not spawn command: {e}")))
            }
            Err(_) => {
                return Ok(ToolResult::fail(format!(
                    "command timed out after {} seconds",
                    timeout.as_secs()
                )))
            }
        };

        let stdout = clip_output(&String::from_utf8_lossy(&output.stdout), OUTPUT_LIMIT_BYTES);
        let stderr = clip_output(&String::from_utf8_lossy(&output.stderr), OUTPUT_LIMIT_BYTES);
        let code = output.status.code();
        let code_text = code
            .map(|c| c.to_string())
            .unwrap_or_else(|| "terminated by signal".to_string());
        let formatted = format_command_output(&code_text, &stdout, &stderr);

        if output.status.success() {
            Ok(ToolResult::ok_with_metadata(
                formatted,
                json!({"exit_code": code}),
            ))
        } else {
            Ok(ToolResult {
                success: false,
                output: String::new(),
                error: Some(formatted),
                metadata: Some(json!({"exit_code": code})),
            })
        }
    }
}

fn format_command_output(code: &str, stdout: &str, stderr: &str) -> String {
    let mut out = format!("exit code: {code}");
    if !stdout.trim().is_empty() {
        out.push_str("\nstdout:\n");
        out.push_str(stdout.trim_end());
    }
    if !stderr.trim().is_empty() {
        out.push_str("\nstderr:\n");
        out.push_str(stderr.trim_end());
    }
    out
}
