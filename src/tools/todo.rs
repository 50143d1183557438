//! Task list tool.
//!
//! The model uses `manage_todos` to track multi-step work. Items live in
//! memory and are mirrored to `.sidekick/todos.json` on a best-effort basis
//! so a crashed session leaves a readable trail.

use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::error::ToolError;
use crate::types::ToolResult;

use super::Tool;

/// Lifecycle of one todo item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TodoStatus {
    Pending,
    InProgress,
    Completed,
}

impl TodoStatus {
    fn marker(self) -> &'static str {
        match self {
            Self::Pending => "[ ]",
            Self::InProgress => "[~]",
            Self::Completed => "[x]",
        }
    }
}

/// One tracked task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TodoItem {
    pub id: u64,
    /// Imperative description, e.g. "Add error handling".
    pub content: String,
    /// Present-continuous form shown while in progress, e.g. "Adding error
    /// handling".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_form: Option<String>,
    pub status: TodoStatus,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct TodoState {
    items: Vec<TodoItem>,
    next_id: u64,
}

#[derive(Debug, Deserialize)]
struct ManageTodosArgs {
    /// One of: create, update, complete, list, clear.
    action: String,
    #[serde(default)]
    id: Option<u64>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    active_form: Option<String>,
    #[serde(default)]
    status: Option<TodoStatus>,
}

/// Manage the session task list.
pub struct ManageTodosTool {
    state: Mutex<TodoState>,
    path: PathBuf,
}

impl ManageTodosTool {
    pub fn new(path: PathBuf) -> Self {
        Self {
            state: Mutex::new(TodoState {
                items: Vec::new(),
                next_id: 1,
            }),
            path,
        }
    }

    fn persist(&self, state: &TodoState) {
        if let Some(parent) = self.path.parent() {
            if std::fs::create_dir_all(parent).is_err() {
                return;
            }
        }
        match serde_json::to_string_pretty(state) {
            Ok(text) => {
                if let Err(e) = std::fs::write(&self.path, text) {
                    debug!(error = %e, "could not persist todo list");
                }
            }
            Err(e) => debug!(error = %e, "could not serialize todo list"),
        }
    }

    fn render(items: &[TodoItem]) -> String {
        if items.is_empty() {
            return "No todos.".to_string();
        }
        items
            .iter()
            .map(|item| {
                let text = match (&item.status, &item.active_form) {
                    (TodoStatus::InProgress, Some(active)) => active,
                    _ => &item.content,
                };
                format!("{} #{} {}", item.status.marker(), item.id, text)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[async_trait]
impl Tool for ManageTodosTool {
    fn name(&self) -> &'static str {
        "manage_todos"
    }

    fn description(&self) -> &'static str {
        "Track multi-step tasks: create, update, complete, list, or clear todos"
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "action": {
                    "type": "string",
                    "enum": ["create", "update", "complete", "list", "clear"],
                    "description": "Operation to perform"
                },
                "id": {"type": "integer", "description": "Todo id for update/complete"},
                "content": {"type": "string", "description": "Todo text for create/update"},
                "active_form": {
                    "type": "string",
                    "description": "Present-continuous label shown while in progress"
                },
                "status": {
                    "type": "string",
                    "enum": ["pending", "in_progress", "completed"],
                    "description": "New status for update"
                }
            },
            "required": ["action"]
        })
    }

    fn describe_call(&self, args: &Value) -> String {
        match args.get("action").and_then(Value::as_str) {
            Some(action) => format!("Manage todos: {action}"),
            None => "Manage todos".to_string(),
        }
    }

    async fn execute(&self, args: &Value) -> Result<ToolResult, ToolError> {
        let args: ManageTodosArgs =
            ManageTodosArgs::deserialize(args).map_err(|e| ToolError::InvalidArguments(e.to_string()))?;
        let mut state = self
            .state
            .lock()
            .map_err(|_| ToolError::ExecutionFailed("todo state poisoned".to_string()))?;

        let result = match args.action.as_str() {
            "create" => {
                let content = args.content.unwrap_or_default();
                if content.trim().is_empty() {
                    return Err(ToolError::InvalidArguments(
                        "create requires non-empty content".to_string(),
                    ));
                }
                let id = state.next_id;
                state.next_id += 1;
                state.items.push(TodoItem {
                    id,
                    content,
                    active_form: args.active_form,
                    status: TodoStatus::Pending,
                });
                ToolResult::ok_with_metadata(Self::render(&state.items), json!({"id": id}))
            }
            "update" => {
                let id = args.id.ok_or_else(|| {
                    ToolError::InvalidArguments("update requires an id".to_string())
                })?;
                let Some(item) = state.items.iter_mut().find(|item| item.id == id) else {
                    return Ok(ToolResult::fail(format!("no todo with id {id}")));
                };
                if let Some(content) = args.content {
                    item.content = content;
                }
                if let Some(active_form) = args.active_form {
                    item.active_form = Some(active_form);
                }
                if let Some(status) = args.status {
                    item.status = status;
                }
                ToolResult::ok(Self::render(&state.items))
            }
            "complete" => {
                let id = args.id.ok_or_else(|| {
                    ToolError::InvalidArguments("complete requires an id".to_string())
                })?;
                let Some(item) = state.items.iter_mut().find(|item| item.id == id) else {
                    return Ok(ToolResult::fail(format!("no todo with id {id}")));
                };
                item.status = TodoStatus::Completed;
                ToolResult::ok(Self::render(&state.items))
            }
            "list" => ToolResult::ok(Self::render(&state.items)),
            "clear" => {
                state.items.clear();
                ToolResult::ok("Todos cleared.")
            }
            other => {
                return Err(ToolError::InvalidArguments(format!(
                    "unknown todo action: {other}"
                )))
            }
        };

        self.persist(&state);
        Ok(result)
    }
}
