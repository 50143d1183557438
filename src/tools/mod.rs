//! Tool trait and registry.
//!
//! Tools receive JSON arguments from the model and return a
//! [`ToolResult`]. Expected failures (file missing, command exited non-zero)
//! come back as failed results so the model can read the error and recover;
//! `Err(ToolError)` is reserved for argument contract violations and defects.

mod files;
mod find;
mod git;
mod shell;
mod todo;

pub use files::{EditFileTool, ReadFileTool, WriteFileTool};
pub use find::{FindFilesTool, SearchContentTool};
pub use git::{
    GitAddTool, GitBranchTool, GitCommitTool, GitDiffTool, GitLogTool, GitPushTool, GitStatusTool,
};
pub use shell::RunShellTool;
pub use todo::ManageTodosTool;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::Config;
use crate::error::ToolError;
use crate::types::{FunctionDefinition, ToolDefinition, ToolResult};

/// A capability the model can invoke.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Stable tool name sent to the model.
    fn name(&self) -> &'static str;

    /// One-line description for the tool schema and manifest.
    fn description(&self) -> &'static str;

    /// JSON Schema for the tool's parameters.
    fn schema(&self) -> Value;

    /// Whether this tool can modify state outside the conversation.
    fn destructive(&self) -> bool {
        false
    }

    /// Whether the default policy tier confirms this tool.
    fn requires_confirmation(&self) -> bool {
        false
    }

    /// Human-readable one-liner describing a specific call, shown in
    /// confirmation prompts and tool-call notices.
    fn describe_call(&self, args: &Value) -> String;

    /// Execute the tool.
    async fn execute(&self, args: &Value) -> Result<ToolResult, ToolError>;

    /// Provider-format definition for the chat request.
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            tool_type: "function".to_string(),
            function: FunctionDefinition {
                name: self.name().to_string(),
                description: self.description().to_string(),
                parameters: self.schema(),
            },
        }
    }
}

/// Registry of available tools, iterated in registration order.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the full built-in tool set.
    pub fn builtin(config: &Config) -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(ReadFileTool));
        registry.register(Box::new(WriteFileTool));
        registry.register(Box::new(EditFileTool));
        registry.register(Box::new(FindFilesTool));
        registry.register(Box::new(SearchContentTool));
        registry.register(Box::new(RunShellTool::new(
            config.safety.deny_patterns.clone(),
            config.tools.shell_timeout_secs,
            config.tools.shell_timeout_max_secs,
        )));
        registry.register(Box::new(GitStatusTool));
        registry.register(Box::new(GitAddTool));
        registry.register(Box::new(GitDiffTool));
        registry.register(Box::new(GitLogTool));
        registry.register(Box::new(GitCommitTool));
        registry.register(Box::new(GitBranchTool));
        registry.register(Box::new(GitPushTool::new(
            config.safety.protected_branches.clone(),
        )));
        registry.register(Box::new(ManageTodosTool::new(std::path::PathBuf::from(
            ".sidekick/todos.json",
        ))));
        registry
    }

    /// Register a tool. A tool with the same name replaces the old one.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        match self
            .tools
            .iter()
            .position(|existing| existing.name() == tool.name())
        {
            Some(index) => self.tools[index] = tool,
            None => self.tools.push(tool),
        }
    }

    /// Look up a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools
            .iter()
            .find(|tool| tool.name() == name)
            .map(Box::as_ref)
    }

    /// Definitions for every registered tool, in registration order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|tool| tool.definition()).collect()
    }

    pub fn count(&self) -> usize {
        self.tools.len()
    }

    /// Iterate over registered tools in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Tool> {
        self.tools.iter().map(Box::as_ref)
    }

    /// One `name(params): description` line per tool, for the system prompt.
    ///
    /// Parameter order comes from the schema's `properties` keys; serde_json
    /// maps are sorted, so the manifest is deterministic.
    pub fn manifest(&self) -> String {
        self.tools
            .iter()
            .map(|tool| {
                let schema = tool.schema();
                let params = schema
                    .get("properties")
                    .and_then(Value::as_object)
                    .map(|props| props.keys().cloned().collect::<Vec<_>>().join(", "))
                    .unwrap_or_default();
                format!("- {}({}): {}", tool.name(), params, tool.description())
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Parse tool arguments from the raw JSON string a model sends.
///
/// An empty string is treated as an empty object since some providers send
/// that for zero-argument calls.
pub fn parse_arguments(raw: &str) -> Result<Value, ToolError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Value::Object(serde_json::Map::new()));
    }
    serde_json::from_str(trimmed)
        .map_err(|e| ToolError::InvalidArguments(format!("arguments are not valid JSON: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct DummyTool {
        name: &'static str,
        desc: &'static str,
    }

    #[async_trait]
    impl Tool for DummyTool {
        fn name(&self) -> &'static str {
            self.name
        }
        fn description(&self) -> &'static str {
            self.desc
        }
        fn schema(&self) -> Value {
            serde_json::json!({
                "type": "object",
                "properties": {
                    "path": {"type": "string"},
                    "count": {"type": "integer"}
                },
                "required": ["path"]
            })
        }
        fn describe_call(&self, _args: &Value) -> String {
            self.name.to_string()
        }
        async fn execute(&self, _args: &Value) -> Result<ToolResult, ToolError> {
            Ok(ToolResult::ok("dummy"))
        }
    }

    #[test]
    fn register_and_lookup_round_trip() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(DummyTool {
            name: "alpha",
            desc: "first",
        }));
        registry.register(Box::new(DummyTool {
            name: "beta",
            desc: "second",
        }));
        assert_eq!(registry.count(), 2);
        assert!(registry.get("alpha").is_some());
        assert!(registry.get("beta").is_some());
        assert!(registry.get("gamma").is_none());

        // Every enumerated tool resolves back to itself by name.
        for tool in registry.iter() {
            let looked_up = registry.get(tool.name()).unwrap();
            assert_eq!(looked_up.description(), tool.description());
        }
    }

    #[test]
    fn reregistering_same_name_replaces() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(DummyTool {
            name: "alpha",
            desc: "first",
        }));
        registry.register(Box::new(DummyTool {
            name: "alpha",
            desc: "replacement",
        }));
        assert_eq!(registry.count(), 1);
        assert_eq!(registry.get("alpha").unwrap().description(), "replacement");
    }

    #[test]
    fn manifest_lists_params_from_schema() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(DummyTool {
            name: "alpha",
            desc: "does alpha things",
        }));
        let manifest = registry.manifest();
        assert_eq!(manifest, "- alpha(count, path): does alpha things");
    }

    #[test]
    fn builtin_registry_has_expected_tools() {
        let config = Config::default();
        let registry = ToolRegistry::builtin(&config);
        for name in [
            "read_file",
            "write_file",
            "edit_file",
            "find_files",
            "search_content",
            "run_shell",
            "git_status",
            "git_add",
            "git_diff",
            "git_log",
            "git_commit",
            "git_branch",
            "git_push",
            "manage_todos",
        ] {
            assert!(registry.get(name).is_some(), "missing tool: {name}");
        }
        assert_eq!(registry.count(), 14);
    }

    #[test]
    fn parse_arguments_accepts_empty_and_rejects_junk() {
        assert!(parse_arguments("").unwrap().is_object());
        assert!(parse_arguments("  ").unwrap().is_object());
        assert_eq!(
            parse_arguments(r#"{"path": "x"}"#).unwrap()["path"],
            "x"
        );
        assert!(parse_arguments("{not json").is_err());
    }
}
