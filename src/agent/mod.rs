//! Orchestration loop.
//!
//! A user turn is one call to [`Agent::send`]: the input (plus a workspace
//! context note) is appended to the transcript, then the loop alternates
//! between model requests and tool execution until the model answers with
//! plain text or the iteration cap is reached.

mod context;

pub use context::{context_note, related_paths};

use std::path::Path;
use std::time::Duration;

use tracing::{debug, warn};

use crate::api::{ApiClient, AssembledTurn, ChatStream, ModelClient};
use crate::config::{select_model_profile, Config};
use crate::error::{AgentError, ApiError, ProviderFailureKind};
use crate::executor::ToolExecutor;
use crate::prompt::render_system_prompt;
use crate::render::Renderer;
use crate::session::{SessionEvent, SessionLog};
use crate::tokens::TokenTracker;
use crate::tools::{parse_arguments, ToolRegistry};
use crate::types::{ChatRequest, Message, ModelInfo, Role, StreamChunk, ToolCall, ToolResult};

/// Returned by [`Agent::send`] when the iteration cap stops a turn. The
/// transcript stays intact, so the user can simply ask to continue.
pub const ITERATION_LIMIT_NOTICE: &str =
    "Stopped: the model kept requesting tools past the iteration limit. \
     Say \"continue\" to let it keep going.";

/// Interactive coding agent bound to one model client and tool set.
pub struct Agent {
    client: Box<dyn ModelClient>,
    config: Config,
    tools: ToolRegistry,
    executor: ToolExecutor,
    messages: Vec<Message>,
    tracker: TokenTracker,
    renderer: Renderer,
    log: SessionLog,
}

impl Agent {
    /// Create an agent backed by the configured HTTP endpoint.
    pub fn new(
        config: Config,
        tools: ToolRegistry,
        executor: ToolExecutor,
        log: SessionLog,
    ) -> Result<Self, AgentError> {
        let timeout = Duration::from_secs(config.network.api_timeout_secs);
        let client = ApiClient::new(&config.api, timeout)
            .map_err(|e| AgentError::Provider {
                kind: ProviderFailureKind::Unknown,
                message: e.to_string(),
            })?;
        Ok(Self::with_client(Box::new(client), config, tools, executor, log))
    }

    /// Create an agent with an injected model client.
    pub fn with_client(
        client: Box<dyn ModelClient>,
        config: Config,
        tools: ToolRegistry,
        executor: ToolExecutor,
        log: SessionLog,
    ) -> Self {
        let renderer = Renderer::new(config.display.color);
        let messages = initial_messages(&config, &tools);
        Self {
            client,
            config,
            tools,
            executor,
            messages,
            tracker: TokenTracker::new(),
            renderer,
            log,
        }
    }

    /// Run one user turn to completion.
    ///
    /// On a provider failure the transcript is rolled back to its state
    /// before this turn, so a retry starts clean.
    pub async fn send(&mut self, input: &str) -> Result<String, AgentError> {
        let turn_start = self.messages.len();

        let mut content = input.to_string();
        let paths = related_paths(input, Path::new("."));
        if let Some(note) = context_note(&paths) {
            debug!(count = paths.len(), "attached workspace context");
            content.push_str("\n\n");
            content.push_str(&note);
        }
        self.messages.push(Message::user(content));
        self.log.append(&SessionEvent::UserTurn { content: input });

        for iteration in 0..self.config.agent.max_iterations {
            debug!(iteration, "requesting completion");
            let request = self.build_request();
            self.tracker.record_request();

            let turn = match self.run_request(&request).await {
                Ok(turn) => turn,
                Err(e) => {
                    let message = e.to_string();
                    let kind = classify_provider_failure(&self.config.classifier, &message);
                    self.messages.truncate(turn_start);
                    self.log.append(&SessionEvent::ProviderFailure {
                        kind: kind.as_str(),
                        message: &message,
                    });
                    return Err(AgentError::Provider { kind, message });
                }
            };

            if let Some(usage) = &turn.usage {
                self.tracker.record(usage.prompt_tokens, usage.completion_tokens);
            }

            if turn.tool_calls.is_empty() {
                self.messages.push(Message::assistant(Some(turn.text.clone()), None));
                self.log.append(&SessionEvent::AssistantTurn { content: &turn.text });
                return Ok(turn.text);
            }

            let text = if turn.text.is_empty() {
                None
            } else {
                Some(turn.text.clone())
            };
            self.messages
                .push(Message::assistant(text, Some(turn.tool_calls.clone())));

            for call in &turn.tool_calls {
                if self.config.display.show_tool_calls {
                    self.renderer.tool_call(&self.describe(call));
                }
                self.log.append(&SessionEvent::ToolCall {
                    tool: &call.function.name,
                    arguments: &call.function.arguments,
                });
            }

            let results = self.executor.execute_batch(&self.tools, &turn.tool_calls).await;
            for (call, result) in turn.tool_calls.iter().zip(&results) {
                if self.config.display.show_tool_calls {
                    self.renderer.tool_result(call, result);
                }
                self.log.append(&SessionEvent::ToolResult {
                    tool: &call.function.name,
                    success: result.success,
                    output: &result.message_content(),
                });
            }
            self.messages
                .extend(tool_result_messages(&turn.tool_calls, &results));
        }

        warn!(cap = self.config.agent.max_iterations, "iteration cap reached");
        self.renderer.warn(ITERATION_LIMIT_NOTICE);
        Ok(ITERATION_LIMIT_NOTICE.to_string())
    }

    /// Drop everything except the system message.
    pub fn clear_history(&mut self) {
        self.messages.retain(|m| m.role == Role::System);
        self.log.append(&SessionEvent::HistoryCleared);
    }

    /// Switch to another configured model profile. History is preserved.
    pub fn switch_model(&mut self, profile: &str) -> Result<(), AgentError> {
        select_model_profile(&mut self.config, profile)?;
        let timeout = Duration::from_secs(self.config.network.api_timeout_secs);
        let client = ApiClient::new(&self.config.api, timeout)
            .map_err(|e| AgentError::Provider {
                kind: ProviderFailureKind::Unknown,
                message: e.to_string(),
            })?;
        self.client = Box::new(client);
        Ok(())
    }

    pub fn model_info(&self) -> ModelInfo {
        self.client.info()
    }

    pub fn tracker(&self) -> &TokenTracker {
        &self.tracker
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Current transcript. Exposed for tests and the REPL.
    pub fn history(&self) -> &[Message] {
        &self.messages
    }

    fn build_request(&self) -> ChatRequest {
        ChatRequest {
            model: self.config.api.model.clone(),
            messages: self.messages.clone(),
            tools: Some(self.tools.definitions()),
            temperature: self.config.agent.temperature.map(f64::from),
            stream: Some(true),
        }
    }

    /// Drain one model response, echoing text deltas as they arrive.
    async fn run_request(&mut self, request: &ChatRequest) -> Result<AssembledTurn, ApiError> {
        let mut stream: ChatStream = self.client.stream_chat(request).await?;
        let mut turn = AssembledTurn::default();
        let mut printed = false;
        while let Some(chunk) = stream.next().await {
            match chunk? {
                StreamChunk::TextDelta(delta) => {
                    self.renderer.assistant_delta(&delta);
                    printed = true;
                    turn.text.push_str(&delta);
                }
                StreamChunk::ToolCalls(calls) => turn.tool_calls = calls,
                StreamChunk::Usage(usage) => turn.usage = Some(usage),
            }
        }
        if printed {
            self.renderer.assistant_done();
        }
        Ok(turn)
    }

    fn describe(&self, call: &ToolCall) -> String {
        match (
            self.tools.get(&call.function.name),
            parse_arguments(&call.function.arguments),
        ) {
            (Some(tool), Ok(args)) => tool.describe_call(&args),
            _ => call.function.name.clone(),
        }
    }
}

/// Transcript seeded with the system prompt.
pub fn initial_messages(config: &Config, tools: &ToolRegistry) -> Vec<Message> {
    let prompt = render_system_prompt(&tools.manifest(), config.agent.system_prompt.as_deref());
    vec![Message::system(prompt)]
}

/// One tool-result message per call, preserving call order and correlating
/// each result to its call id.
pub fn tool_result_messages(calls: &[ToolCall], results: &[ToolResult]) -> Vec<Message> {
    calls
        .iter()
        .zip(results)
        .map(|(call, result)| {
            Message::tool_result(&call.id, &call.function.name, result.message_content())
        })
        .collect()
}

/// Map provider error text onto the failure taxonomy using the configured
/// substring tables. Categories are checked in a fixed order.
pub fn classify_provider_failure(
    classifier: &crate::config::ClassifierConfig,
    message: &str,
) -> ProviderFailureKind {
    let lowered = message.to_lowercase();
    let hit = |table: &[String]| {
        table
            .iter()
            .any(|marker| !marker.is_empty() && lowered.contains(&marker.to_lowercase()))
    };
    if hit(&classifier.rate_limit) {
        ProviderFailureKind::RateLimit
    } else if hit(&classifier.model_unavailable) {
        ProviderFailureKind::ModelUnavailable
    } else if hit(&classifier.auth_error) {
        ProviderFailureKind::AuthError
    } else {
        ProviderFailureKind::Unknown
    }
}
