//! Server-sent-events assembler for streamed chat completions.
//!
//! Providers stream `data:` lines carrying JSON deltas. Text deltas are
//! forwarded as they arrive; tool-call fragments are accumulated by index and
//! released as one finalized list so the loop never sees a half-built call.

use serde_json::Value;

use crate::types::{FunctionCall, StreamChunk, ToolCall, Usage};

/// Incrementally parses SSE bytes into [`StreamChunk`]s.
#[derive(Debug, Default)]
pub struct SseAssembler {
    buffer: String,
    partial_calls: Vec<PartialToolCall>,
    done: bool,
}

#[derive(Debug, Default)]
struct PartialToolCall {
    id: Option<String>,
    name: String,
    arguments: String,
}

impl SseAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes; returns chunks that became complete.
    ///
    /// Invalid UTF-8 at a chunk boundary cannot occur in practice because
    /// providers emit ASCII SSE framing, but lossy decoding keeps a bad
    /// payload from aborting the stream.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<StreamChunk> {
        self.buffer.push_str(&String::from_utf8_lossy(bytes));
        let mut out = Vec::new();
        while let Some(newline) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=newline).collect();
            self.handle_line(line.trim_end(), &mut out);
        }
        out
    }

    /// Flush buffered state at end of stream.
    pub fn finish(&mut self) -> Vec<StreamChunk> {
        let mut out = Vec::new();
        if !self.buffer.trim().is_empty() {
            let line = std::mem::take(&mut self.buffer);
            self.handle_line(line.trim_end(), &mut out);
        }
        if let Some(calls) = self.take_tool_calls() {
            out.push(StreamChunk::ToolCalls(calls));
        }
        out
    }

    /// Whether the provider signalled `[DONE]`.
    pub fn is_done(&self) -> bool {
        self.done
    }

    fn handle_line(&mut self, line: &str, out: &mut Vec<StreamChunk>) {
        let Some(payload) = line.strip_prefix("data:") else {
            // Comments, event names, and blank keep-alive lines.
            return;
        };
        let payload = payload.trim();
        if payload == "[DONE]" {
            self.done = true;
            if let Some(calls) = self.take_tool_calls() {
                out.push(StreamChunk::ToolCalls(calls));
            }
            return;
        }
        let Ok(value) = serde_json::from_str::<Value>(payload) else {
            return;
        };
        self.handle_event(&value, out);
    }

    fn handle_event(&mut self, value: &Value, out: &mut Vec<StreamChunk>) {
        if let Some(usage) = value.get("usage").filter(|u| !u.is_null()) {
            if let Ok(usage) = serde_json::from_value::<Usage>(usage.clone()) {
                out.push(StreamChunk::Usage(usage));
            }
        }

        let Some(choice) = value
            .get("choices")
            .and_then(Value::as_array)
            .and_then(|choices| choices.first())
        else {
            return;
        };

        if let Some(delta) = choice.get("delta") {
            if let Some(text) = delta.get("content").and_then(Value::as_str) {
                if !text.is_empty() {
                    out.push(StreamChunk::TextDelta(text.to_string()));
                }
            }
            if let Some(fragments) = delta.get("tool_calls").and_then(Value::as_array) {
                for fragment in fragments {
                    self.accumulate_fragment(fragment);
                }
            }
        }

        let finished = choice
            .get("finish_reason")
            .and_then(Value::as_str)
            .is_some();
        if finished {
            if let Some(calls) = self.take_tool_calls() {
                out.push(StreamChunk::ToolCalls(calls));
            }
        }
    }

    fn accumulate_fragment(&mut self, fragment: &Value) {
        let index = fragment
            .get("index")
            .and_then(Value::as_u64)
            .unwrap_or(self.partial_calls.len().saturating_sub(1) as u64)
            as usize;
        while self.partial_calls.len() <= index {
            self.partial_calls.push(PartialToolCall::default());
        }
        let partial = &mut self.partial_calls[index];

        if let Some(id) = fragment.get("id").and_then(Value::as_str) {
            if !id.is_empty() {
                partial.id = Some(id.to_string());
            }
        }
        if let Some(function) = fragment.get("function") {
            if let Some(name) = function.get("name").and_then(Value::as_str) {
                partial.name.push_str(name);
            }
            if let Some(arguments) = function.get("arguments").and_then(Value::as_str) {
                partial.arguments.push_str(arguments);
            }
        }
    }

    fn take_tool_calls(&mut self) -> Option<Vec<ToolCall>> {
        if self.partial_calls.is_empty() {
            return None;
        }
        let calls = std::mem::take(&mut self.partial_calls)
            .into_iter()
            .enumerate()
            .map(|(index, partial)| ToolCall {
                // Some providers omit ids in stream fragments.
                id: partial.id.unwrap_or_else(|| format!("call_{index}")),
                call_type: "function".to_string(),
                function: FunctionCall {
                    name: partial.name,
                    arguments: partial.arguments,
                },
            })
            .collect();
        Some(calls)
    }
}
