//! Data model for the OpenAI Chat Completions API and tool results.
//!
//! These types serialize/deserialize directly to/from the JSON payloads
//! expected by any OpenAI-compatible endpoint, plus the crate's own
//! tool-result envelope.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Message roles
// ---------------------------------------------------------------------------

/// Conversation participant role.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instruction message.
    System,
    /// End-user message.
    User,
    /// Assistant/model message.
    Assistant,
    /// Tool execution result message.
    Tool,
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// A single message in the conversation history.
///
/// Ordering is append-only and significant: the provider interprets the
/// transcript positionally, and tool-result messages must directly follow the
/// assistant message that requested them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Author role for this conversation turn.
    pub role: Role,

    /// Text content. Null when the assistant message is purely tool calls.
    pub content: Option<String>,

    /// Tool calls requested by the assistant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,

    /// When role == Tool, the id of the tool_call this result corresponds to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,

    /// When role == Tool, the name of the tool that produced this result.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Message {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
            name: None,
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
            name: None,
        }
    }

    /// Create an assistant message, optionally carrying pending tool calls.
    pub fn assistant(content: Option<String>, tool_calls: Option<Vec<ToolCall>>) -> Self {
        Self {
            role: Role::Assistant,
            content,
            tool_calls,
            tool_call_id: None,
            name: None,
        }
    }

    /// Create a tool result message, sent back after executing a tool call.
    pub fn tool_result(
        tool_call_id: impl Into<String>,
        name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            role: Role::Tool,
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: Some(tool_call_id.into()),
            name: Some(name.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tool calls (in assistant responses)
// ---------------------------------------------------------------------------

/// A tool invocation requested by the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolCall {
    /// Unique id used to correlate tool call and tool result.
    pub id: String,
    /// Tool call type; currently expected to be `"function"`.
    #[serde(rename = "type")]
    pub call_type: String,
    /// Function metadata and arguments for this tool invocation.
    pub function: FunctionCall,
}

impl ToolCall {
    /// Build a function-type tool call.
    pub fn function(id: impl Into<String>, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            call_type: "function".to_string(),
            function: FunctionCall {
                name: name.into(),
                arguments: arguments.into(),
            },
        }
    }
}

/// The function name and JSON-encoded arguments within a tool call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FunctionCall {
    /// Function/tool name to execute.
    pub name: String,
    /// JSON-encoded string of the arguments object.
    pub arguments: String,
}

// ---------------------------------------------------------------------------
// Tool definitions (sent in requests)
// ---------------------------------------------------------------------------

/// Tool definition included in the API request so the model knows what's available.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool definition type; currently expected to be `"function"`.
    #[serde(rename = "type")]
    pub tool_type: String,
    /// Function schema published to the model.
    pub function: FunctionDefinition,
}

/// The schema of a callable function.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDefinition {
    /// Exposed function/tool name.
    pub name: String,
    /// Natural-language description of tool behavior.
    pub description: String,
    /// JSON Schema object describing the parameters.
    pub parameters: serde_json::Value,
}

// ---------------------------------------------------------------------------
// Chat completion request
// ---------------------------------------------------------------------------

/// Request body for POST /chat/completions.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    /// Model identifier used for request routing.
    pub model: String,
    /// Conversation history sent to the model.
    pub messages: Vec<Message>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolDefinition>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,

    /// Request server-sent-event streaming.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
}

/// Token usage reported by the API.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct Usage {
    /// Input tokens consumed by the request.
    pub prompt_tokens: u64,
    /// Output tokens generated by the model.
    pub completion_tokens: u64,
    /// Total tokens (`prompt + completion`).
    #[serde(default)]
    pub total_tokens: u64,
}

// ---------------------------------------------------------------------------
// Streamed response chunks
// ---------------------------------------------------------------------------

/// One chunk of a streamed model response.
///
/// Text arrives incrementally; tool calls arrive as one finalized list once
/// the stream has ended (the SSE assembler buffers partial fragments until
/// then, so consumers never see a half-built call).
#[derive(Debug, Clone, PartialEq)]
pub enum StreamChunk {
    /// Incremental assistant text.
    TextDelta(String),
    /// Complete list of tool calls requested by this response.
    ToolCalls(Vec<ToolCall>),
    /// Token usage metadata, typically emitted once near the end.
    Usage(Usage),
}

/// Static identity information for the active model client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelInfo {
    /// Provider-facing model identifier.
    pub id: String,
    /// Human-readable provider label (derived from the base URL host).
    pub provider: String,
    /// Capability labels, e.g. "streaming", "tools".
    pub capabilities: Vec<String>,
    /// Short description for `/model` output.
    pub description: String,
}

// ---------------------------------------------------------------------------
// Tool results
// ---------------------------------------------------------------------------

/// Outcome of one tool execution.
///
/// Exactly one of `output`/`error` carries the payload: `success == false`
/// implies `output` is empty and `error` is set.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResult {
    /// Whether the tool completed its operation.
    pub success: bool,
    /// Model-facing output text; empty on failure.
    pub output: String,
    /// Failure description; present iff `!success`.
    pub error: Option<String>,
    /// Optional structured side-channel (byte counts etc.), not sent to the model.
    pub metadata: Option<serde_json::Value>,
}

impl ToolResult {
    /// Build a successful result.
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
            error: None,
            metadata: None,
        }
    }

    /// Build a successful result carrying structured metadata.
    pub fn ok_with_metadata(output: impl Into<String>, metadata: serde_json::Value) -> Self {
        Self {
            success: true,
            output: output.into(),
            error: None,
            metadata: Some(metadata),
        }
    }

    /// Build a failed result.
    pub fn fail(error: impl Into<String>) -> Self {
        Self {
            success: false,
            output: String::new(),
            error: Some(error.into()),
            metadata: None,
        }
    }

    /// Render this result as tool-message content for the model.
    pub fn message_content(&self) -> String {
        if self.success {
            self.output.clone()
        } else {
            format!("Error: {}", self.error.as_deref().unwrap_or("unknown error"))
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // Verifies optional fields are omitted when absent during request serialization.
    #[test]
    fn serialize_chat_request() {
        let req = ChatRequest {
            model: "gpt-4o".into(),
            messages: vec![Message::system("You are helpful."), Message::user("Hi")],
            tools: None,
            temperature: Some(0.7),
            stream: Some(true),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["model"], "gpt-4o");
        assert_eq!(json["messages"].as_array().unwrap().len(), 2);
        assert_eq!(json["temperature"], 0.7);
        assert_eq!(json["stream"], true);
        // tools should be omitted
        assert!(json.get("tools").is_none());
    }

    // Verifies tool-result messages serialize with correlation fields.
    #[test]
    fn tool_result_message_carries_correlation_fields() {
        let msg = Message::tool_result("call_1", "read_file", "file text");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "tool");
        assert_eq!(json["tool_call_id"], "call_1");
        assert_eq!(json["name"], "read_file");
        assert_eq!(json["content"], "file text");
    }

    #[test]
    fn message_constructors() {
        let sys = Message::system("hello");
        assert_eq!(sys.role, Role::System);
        assert_eq!(sys.content.as_deref(), Some("hello"));

        let usr = Message::user("world");
        assert_eq!(usr.role, Role::User);

        let asst = Message::assistant(None, Some(vec![ToolCall::function("c1", "run_shell", "{}")]));
        assert_eq!(asst.role, Role::Assistant);
        assert!(asst.content.is_none());
        assert_eq!(asst.tool_calls.as_ref().unwrap().len(), 1);
    }

    // Verifies the output/error exclusivity invariant on constructors.
    #[test]
    fn tool_result_invariant() {
        let ok = ToolResult::ok("done");
        assert!(ok.success);
        assert!(ok.error.is_none());
        assert_eq!(ok.message_content(), "done");

        let err = ToolResult::fail("file missing");
        assert!(!err.success);
        assert!(err.output.is_empty());
        assert_eq!(err.message_content(), "Error: file missing");
    }

    #[test]
    fn usage_deserializes_without_total() {
        let usage: Usage = serde_json::from_str(r#"{"prompt_tokens":3,"completion_tokens":4}"#).unwrap();
        assert_eq!(usage.prompt_tokens, 3);
        assert_eq!(usage.total_tokens, 0);
    }
}
