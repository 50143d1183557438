//! Git tools.
//!
//! All git operations shell out to the `git` binary in the working directory
//! rather than linking a git library; output comes back exactly as git
//! prints it, which the model understands well.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::process::Command;

use crate::error::ToolError;
use crate::textutil::clip_output;
use crate::types::ToolResult;

use super::Tool;

const OUTPUT_LIMIT_BYTES: usize = 8_000;

fn parse_args<'a, T: Deserialize<'a>>(args: &'a Value) -> Result<T, ToolError> {
    T::deserialize(args).map_err(|e| ToolError::InvalidArguments(e.to_string()))
}

/// Run `git` with the given arguments and map the outcome to a [`ToolResult`].
async fn run_git(args: &[&str]) -> ToolResult {
    let output = match Command::new("git").args(args).output().await {
        Ok(output) => output,
        Err(e) => return ToolResult::fail(format!("could not run git: {e}")),
    };
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    if output.status.success() {
        let text = if stdout.trim().is_empty() {
            stderr.trim().to_string()
        } else {
            stdout.trim_end().to_string()
        };
        ToolResult::ok(clip_output(&text, OUTPUT_LIMIT_BYTES))
    } else {
        let code = output
            .status
            .code()
            .map(|c| c.to_string())
            .unwrap_or_else(|| "signal".to_string());
        let detail = if stderr.trim().is_empty() {
            stdout.trim().to_string()
        } else {
            stderr.trim().to_string()
        };
        ToolResult::fail(clip_output(
            &format!("git exited with code {code}: {detail}"),
            OUTPUT_LIMIT_BYTES,
        ))
    }
}

// ---------------------------------------------------------------------------
// git_status
// ---------------------------------------------------------------------------

/// Show working tree status.
pub struct GitStatusTool;

#[async_trait]
impl Tool for GitStatusTool {
    fn name(&self) -> &'static str {
        "git_status"
    }

    fn description(&self) -> &'static str {
        "Show the working tree status"
    }

    fn schema(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    fn describe_call(&self, _args: &Value) -> String {
        "Show git status".to_string()
    }

    async fn execute(&self, _args: &Value) -> Result<ToolResult, ToolError> {
        let result = run_git(&["status", "--porcelain=v1", "--branch"]).await;
        if result.success && result.output.lines().count() <= 1 {
            // Only the branch header: nothing changed.
            let mut clean = result;
            clean.output.push_str("\nworking tree clean");
            return Ok(clean);
        }
        Ok(result)
    }
}

// ---------------------------------------------------------------------------
// git_add
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct GitAddArgs {
    /// Paths to stage. Empty stages everything.
    #[serde(default)]
    paths: Vec<String>,
}

/// Stage files.
pub struct GitAddTool;

#[async_trait]
impl Tool for GitAddTool {
    fn name(&self) -> &'static str {
        "git_add"
    }

    fn description(&self) -> &'static str {
        "Stage files for commit; stages all changes when no paths are given"
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "paths": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "Paths to stage; omit to stage all changes"
                }
            }
        })
    }

    fn destructive(&self) -> bool {
        true
    }

    fn requires_confirmation(&self) -> bool {
        true
    }

    fn describe_call(&self, args: &Value) -> String {
        let paths = args
            .get("paths")
            .and_then(Value::as_array)
            .map(|paths| {
                paths
                    .iter()
                    .filter_map(Value::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_default();
        if paths.is_empty() {
            "Stage all changes".to_string()
        } else {
            format!("Stage files: {paths}")
        }
    }

    async fn execute(&self, args: &Value) -> Result<ToolResult, ToolError> {
        let args: GitAddArgs = parse_args(args)?;
        let result = if args.paths.is_empty() {
            run_git(&["add", "-A"]).await
        } else {
            let mut git_args = vec!["add", "--"];
            git_args.extend(args.paths.iter().map(String::as_str));
            run_git(&git_args).await
        };
        if !result.success {
            return Ok(result);
        }
        // Report what is now staged so the model sees the effect.
        let staged = run_git(&["diff", "--cached", "--name-only"]).await;
        if staged.success {
            let count = staged.output.lines().filter(|l| !l.is_empty()).count();
            return Ok(ToolResult::ok_with_metadata(
                format!("Staged {count} file(s):\n{}", staged.output),
                json!({"staged": count}),
            ));
        }
        Ok(result)
    }
}

// ---------------------------------------------------------------------------
// git_diff
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct GitDiffArgs {
    /// Show staged changes instead of unstaged ones.
    #[serde(default)]
    staged: bool,
    #[serde(default)]
    path: Option<String>,
}

/// Show changes.
pub struct GitDiffTool;

#[async_trait]
impl Tool for GitDiffTool {
    fn name(&self) -> &'static str {
        "git_diff"
    }

    fn description(&self) -> &'static str {
        "Show unstaged changes, or staged changes with staged=true"
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "staged": {"type": "boolean", "description": "Show staged changes"},
                "path": {"type": "string", "description": "Limit the diff to one path"}
            }
        })
    }

    fn describe_call(&self, args: &Value) -> String {
        let staged = args.get("staged").and_then(Value::as_bool).unwrap_or(false);
        if staged {
            "Show staged diff".to_string()
        } else {
            "Show diff".to_string()
        }
    }

    async fn execute(&self, args: &Value) -> Result<ToolResult, ToolError> {
        let args: GitDiffArgs = parse_args(args)?;
        let mut git_args = vec!["diff"];
        if args.staged {
            git_args.push("--cached");
        }
        if let Some(path) = &args.path {
            git_args.push("--");
            git_args.push(path);
        }
        let mut result = run_git(&git_args).await;
        if result.success && result.output.trim().is_empty() {
            result.output = "no changes".to_string();
        }
        Ok(result)
    }
}

// ---------------------------------------------------------------------------
// git_log
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct GitLogArgs {
    #[serde(default = "default_log_count")]
    count: u32,
}

fn default_log_count() -> u32 {
    10
}

/// Show recent commits.
pub struct GitLogTool;

#[async_trait]
impl Tool for GitLogTool {
    fn name(&self) -> &'static str {
        "git_log"
    }

    fn description(&self) -> &'static str {
        "Show recent commits, one line each"
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "count": {"type": "integer", "description": "Number of commits to show (default 10)"}
            }
        })
    }

    fn describe_call(&self, _args: &Value) -> String {
        "Show git log".to_string()
    }

    async fn execute(&self, args: &Value) -> Result<ToolResult, ToolError> {
        let args: GitLogArgs = parse_args(args)?;
        let count = args.count.clamp(1, 100).to_string();
        Ok(run_git(&["log", "--oneline", "-n", &count]).await)
    }
}

// ---------------------------------------------------------------------------
// git_commit
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct GitCommitArgs {
    message: String,
}

/// Commit staged changes.
pub struct GitCommitTool;

#[async_trait]
impl Tool for GitCommitTool {
    fn name(&self) -> &'static str {
        "git_commit"
    }

    fn description(&self) -> &'static str {
        "Commit staged changes with the given message"
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "message": {"type": "string", "description": "Commit message"}
            },
            "required": ["message"]
        })
    }

    fn destructive(&self) -> bool {
        true
    }

    fn requires_confirmation(&self) -> bool {
        true
    }

    fn describe_call(&self, args: &Value) -> String {
        match args.get("message").and_then(Value::as_str) {
            Some(message) => {
                let first = message.lines().next().unwrap_or(message);
                format!("Commit: {first}")
            }
            None => "Commit staged changes".to_string(),
        }
    }

    async fn execute(&self, args: &Value) -> Result<ToolResult, ToolError> {
        let args: GitCommitArgs = parse_args(args)?;
        if args.message.trim().is_empty() {
            return Err(ToolError::InvalidArguments(
                "commit message must not be empty".to_string(),
            ));
        }
        Ok(run_git(&["commit", "-m", &args.message]).await)
    }
}

// ---------------------------------------------------------------------------
// git_branch
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct GitBranchArgs {
    /// One of: list, create, switch, delete.
    #[serde(default = "default_branch_action")]
    action: String,
    #[serde(default)]
    name: Option<String>,
}

fn default_branch_action() -> String {
    "list".to_string()
}

/// List, create, switch, or delete branches.
pub struct GitBranchTool;

#[async_trait]
impl Tool for GitBranchTool {
    fn name(&self) -> &'static str {
        "git_branch"
    }

    fn description(&self) -> &'static str {
        "List, create, switch to, or delete branches"
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "action": {
                    "type": "string",
                    "enum": ["list", "create", "switch", "delete"],
                    "description": "Branch operation to perform (default list)"
                },
                "name": {"type": "string", "description": "Branch name for create/switch/delete"}
            }
        })
    }

    fn destructive(&self) -> bool {
        true
    }

    fn requires_confirmation(&self) -> bool {
        true
    }

    fn describe_call(&self, args: &Value) -> String {
        let action = args
            .get("action")
            .and_then(Value::as_str)
            .unwrap_or("list");
        let name = args.get("name").and_then(Value::as_str).unwrap_or("");
        match action {
            "create" => format!("Create branch: {name}"),
            "switch" => format!("Switch to branch: {name}"),
            "delete" => format!("DELETE branch: {name}"),
            _ => "List branches".to_string(),
        }
    }

    async fn execute(&self, args: &Value) -> Result<ToolResult, ToolError> {
        let args: GitBranchArgs = parse_args(args)?;
        let name = args.name.as_deref().unwrap_or("");
        let needs_name = matches!(args.action.as_str(), "create" | "switch" | "delete");
        if needs_name && name.is_empty() {
            return Err(ToolError::InvalidArguments(format!(
                "branch action '{}' requires a name",
                args.action
            )));
        }
        let result = match args.action.as_str() {
            "list" => run_git(&["branch", "--list", "-v"]).await,
            "create" => run_git(&["switch", "-c", name]).await,
            "switch" => run_git(&["switch", name]).await,
            "delete" => run_git(&["branch", "-D", name]).await,
            other => {
                return Err(ToolError::InvalidArguments(format!(
                    "unknown branch action: {other}"
                )))
            }
        };
        Ok(result)
    }
}

// ---------------------------------------------------------------------------
// git_push
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct GitPushArgs {
    #[serde(default)]
    remote: Option<String>,
    #[serde(default)]
    branch: Option<String>,
    #[serde(default)]
    force: bool,
}

/// Push to a remote.
pub struct GitPushTool {
    protected_branches: Vec<String>,
}

impl GitPushTool {
    pub fn new(protected_branches: Vec<String>) -> Self {
        Self { protected_branches }
    }

    async fn current_branch() -> Option<String> {
        let result = run_git(&["rev-parse", "--abbrev-ref", "HEAD"]).await;
        if result.success {
            Some(result.output.trim().to_string())
        } else {
            None
        }
    }
}

#[async_trait]
impl Tool for GitPushTool {
    fn name(&self) -> &'static str {
        "git_push"
    }

    fn description(&self) -> &'static str {
        "Push the current or named branch to a remote"
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "remote": {"type": "string", "description": "Remote name (default origin)"},
                "branch": {"type": "string", "description": "Branch to push (default current)"},
                "force": {"type": "boolean", "description": "Force push"}
            }
        })
    }

    fn destructive(&self) -> bool {
        true
    }

    fn requires_confirmation(&self) -> bool {
        true
    }

    fn describe_call(&self, args: &Value) -> String {
        let branch = args
            .get("branch")
            .and_then(Value::as_str)
            .unwrap_or("current branch");
        let force = args.get("force").and_then(Value::as_bool).unwrap_or(false);
        if force {
            format!("Push to remote (FORCE): {branch}")
        } else {
            format!("Push to remote: {branch}")
        }
    }

    async fn execute(&self, args: &Value) -> Result<ToolResult, ToolError> {
        let args: GitPushArgs = parse_args(args)?;
        let remote = args.remote.as_deref().unwrap_or("origin").to_string();
        let branch = match args.branch {
            Some(branch) => branch,
            None => match Self::current_branch().await {
                Some(branch) => branch,
                None => {
                    return Ok(ToolResult::fail(
                        "could not determine current branch".to_string(),
                    ))
                }
            },
        };

        // Force pushes to protected branches are refused before git runs.
        if args.force && self.protected_branches.iter().any(|p| p == &branch) {
            return Ok(ToolResult::fail(format!(
                "force push to protected branch '{branch}' is blocked"
            )));
        }

        let mut git_args = vec!["push"];
        if args.force {
            git_args.push("--force-with-lease");
        }
        git_args.push(&remote);
        git_args.push(&branch);
        Ok(run_git(&git_args).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn force_push_to_protected_branch_is_blocked_without_running_git() {
        let tool = GitPushTool::new(vec!["main".to_string(), "master".to_string()]);
        let result = tool
            .execute(&json!({"branch": "main", "force": true}))
            .await
            .unwrap();
        assert!(!result.success);
        assert!(result.error.unwrap().contains("blocked"));
    }

    #[test]
    fn unprotected_branch_is_not_in_protected_set() {
        let tool = GitPushTool::new(vec!["main".to_string()]);
        assert!(!tool.protected_branches.iter().any(|p| p == "feature/x"));
    }

    #[tokio::test]
    async fn branch_action_requires_name() {
        let err = GitBranchTool
            .execute(&json!({"action": "delete"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[tokio::test]
    async fn unknown_branch_action_is_rejected() {
        let err = GitBranchTool
            .execute(&json!({"action": "rename", "name": "x"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[tokio::test]
    async fn empty_commit_message_is_rejected() {
        let err = GitCommitTool
            .execute(&json!({"message": "  "}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[test]
    fn describe_call_marks_force_pushes() {
        let tool = GitPushTool::new(Vec::new());
        let summary = tool.describe_call(&json!({"branch": "main", "force": true}));
        assert_eq!(summary, "Push to remote (FORCE): main");
    }

    #[test]
    fn git_tools_are_flagged_destructive() {
        assert!(!GitStatusTool.destructive());
        assert!(!GitDiffTool.destructive());
        assert!(!GitLogTool.destructive());
        assert!(GitAddTool.destructive());
        assert!(GitCommitTool.destructive());
        assert!(GitBranchTool.destructive());
        assert!(GitPushTool::new(Vec::new()).destructive());
    }
}
