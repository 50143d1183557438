//! Model API client layer.

mod client;
mod sse;

pub use client::{ApiClient, RetryPolicy};
pub use sse::SseAssembler;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::ApiError;
use crate::types::{ChatRequest, ModelInfo, StreamChunk, ToolCall, Usage};

/// Abstraction over a chat-completions provider.
///
/// The orchestration loop depends only on this trait; tests substitute a
/// scripted client.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Start a streaming chat completion.
    async fn stream_chat(&self, request: &ChatRequest) -> Result<ChatStream, ApiError>;

    /// Identity of the backing model, for display.
    fn info(&self) -> ModelInfo;
}

/// Stream of chunks from one chat completion.
///
/// Wraps a bounded channel fed by a producer task; dropping the stream
/// cancels the producer via channel closure.
pub struct ChatStream {
    rx: mpsc::Receiver<Result<StreamChunk, ApiError>>,
}

/// Channel capacity for live streams.
const STREAM_BUFFER: usize = 64;

impl ChatStream {
    /// Create a stream plus the sender half for a producer task.
    pub fn channel() -> (mpsc::Sender<Result<StreamChunk, ApiError>>, Self) {
        let (tx, rx) = mpsc::channel(STREAM_BUFFER);
        (tx, Self { rx })
    }

    /// Stream over a fixed chunk list. For scripted clients in tests.
    pub fn from_chunks(chunks: Vec<StreamChunk>) -> Self {
        let (tx, rx) = mpsc::channel(chunks.len().max(1));
        for chunk in chunks {
            // Capacity covers every chunk, so try_send cannot fail here.
            let _ = tx.try_send(Ok(chunk));
        }
        Self { rx }
    }

    /// Stream that yields a single error.
    pub fn from_error(error: ApiError) -> Self {
        let (tx, rx) = mpsc::channel(1);
        let _ = tx.try_send(Err(error));
        Self { rx }
    }

    /// Next chunk, or `None` when the stream is finished.
    pub async fn next(&mut self) -> Option<Result<StreamChunk, ApiError>> {
        self.rx.recv().await
    }

    /// Drain the stream into an assembled turn.
    pub async fn collect(mut self) -> Result<AssembledTurn, ApiError> {
        let mut turn = AssembledTurn::default();
        while let Some(chunk) = self.next().await {
            match chunk? {
                StreamChunk::TextDelta(delta) => turn.text.push_str(&delta),
                StreamChunk::ToolCalls(calls) => turn.tool_calls = calls,
                StreamChunk::Usage(usage) => turn.usage = Some(usage),
            }
        }
        Ok(turn)
    }
}

/// Fully drained content of one model response.
#[derive(Debug, Default)]
pub struct AssembledTurn {
    pub text: String,
    pub tool_calls: Vec<ToolCall>,
    pub usage: Option<Usage>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn from_chunks_yields_in_order() {
        let mut stream = ChatStream::from_chunks(vec![
            StreamChunk::TextDelta("hel".into()),
            StreamChunk::TextDelta("lo".into()),
        ]);
        assert!(matches!(
            stream.next().await,
            Some(Ok(StreamChunk::TextDelta(d))) if d == "hel"
        ));
        assert!(matches!(
            stream.next().await,
            Some(Ok(StreamChunk::TextDelta(d))) if d == "lo"
        ));
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn collect_assembles_text_calls_and_usage() {
        let stream = ChatStream::from_chunks(vec![
            StreamChunk::TextDelta("working".into()),
            StreamChunk::ToolCalls(vec![ToolCall::function("c1", "read_file", "{}")]),
            StreamChunk::Usage(Usage {
                prompt_tokens: 5,
                completion_tokens: 2,
                total_tokens: 7,
            }),
        ]);
        let turn = stream.collect().await.unwrap();
        assert_eq!(turn.text, "working");
        assert_eq!(turn.tool_calls.len(), 1);
        assert_eq!(turn.usage.unwrap().total_tokens, 7);
    }

    #[tokio::test]
    async fn error_stream_propagates() {
        let stream = ChatStream::from_error(ApiError::InvalidResponse("boom".into()));
        assert!(stream.collect().await.is_err());
    }
}
