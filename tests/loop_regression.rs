//! End-to-end regression for the public agent surface.
//!
//! Drives a real tool registry through the orchestration loop with a
//! scripted model client, touching only a scratch directory.

use std::collections::VecDeque;
use std::sync::Mutex as StdMutex;

use async_trait::async_trait;

use sidekick::agent::Agent;
use sidekick::api::{ChatStream, ModelClient};
use sidekick::config::Config;
use sidekick::error::ApiError;
use sidekick::executor::ToolExecutor;
use sidekick::session::SessionLog;
use sidekick::tools::ToolRegistry;
use sidekick::types::{ChatRequest, ModelInfo, Role, StreamChunk, ToolCall};

struct ScriptedClient {
    responses: StdMutex<VecDeque<Vec<StreamChunk>>>,
}

impl ScriptedClient {
    fn new(responses: Vec<Vec<StreamChunk>>) -> Self {
        Self {
            responses: StdMutex::new(responses.into()),
        }
    }
}

#[async_trait]
impl ModelClient for ScriptedClient {
    async fn stream_chat(&self, _request: &ChatRequest) -> Result<ChatStream, ApiError> {
        let chunks = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| vec![StreamChunk::TextDelta("done".into())]);
        Ok(ChatStream::from_chunks(chunks))
    }

    fn info(&self) -> ModelInfo {
        ModelInfo {
            id: "scripted".into(),
            provider: "test".into(),
            capabilities: vec!["tools".into()],
            description: "scripted test client".into(),
        }
    }
}

fn quiet_config() -> Config {
    let mut config = Config::default();
    config.display.color = false;
    config.display.show_tool_calls = false;
    config
}

fn scratch_file(name: &str, content: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "sidekick-regression-{}-{}",
        std::process::id(),
        name
    ));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

// The model reads a real file through the built-in registry and then answers;
// the transcript must interleave roles in request order.
#[tokio::test]
async fn read_file_round_trip_through_builtin_registry() {
    let path = scratch_file("notes.txt", "the answer is 42");
    let arguments = format!(r#"{{"path": "{}"}}"#, path.display());

    let client = ScriptedClient::new(vec![
        vec![StreamChunk::ToolCalls(vec![ToolCall::function(
            "call_1",
            "read_file",
            arguments,
        )])],
        vec![StreamChunk::TextDelta("It says 42.".into())],
    ]);

    let config = quiet_config();
    let tools = ToolRegistry::builtin(&config);
    let mut agent = Agent::with_client(
        Box::new(client),
        config,
        tools,
        ToolExecutor::auto_approving(),
        SessionLog::disabled(),
    );

    let answer = agent.send("what do my notes say?").await.unwrap();
    assert_eq!(answer, "It says 42.");

    let roles: Vec<Role> = agent.history().iter().map(|m| m.role.clone()).collect();
    assert_eq!(
        roles,
        vec![Role::System, Role::User, Role::Assistant, Role::Tool, Role::Assistant]
    );
    let tool_message = &agent.history()[3];
    assert_eq!(tool_message.content.as_deref(), Some("the answer is 42"));
}

// An unknown tool comes back as an error tool-message, and the loop recovers
// on the next iteration instead of crashing.
#[tokio::test]
async fn unknown_tool_surfaces_as_error_message() {
    let client = ScriptedClient::new(vec![
        vec![StreamChunk::ToolCalls(vec![ToolCall::function(
            "call_1",
            "teleport",
            "{}",
        )])],
        vec![StreamChunk::TextDelta("never mind".into())],
    ]);

    let config = quiet_config();
    let tools = ToolRegistry::builtin(&config);
    let mut agent = Agent::with_client(
        Box::new(client),
        config,
        tools,
        ToolExecutor::auto_approving(),
        SessionLog::disabled(),
    );

    let answer = agent.send("try something weird").await.unwrap();
    assert_eq!(answer, "never mind");
    let tool_message = &agent.history()[3];
    assert!(tool_message
        .content
        .as_deref()
        .unwrap()
        .contains("unknown tool: teleport"));
}
