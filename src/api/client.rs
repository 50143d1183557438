//! HTTP client for OpenAI-compatible chat completion endpoints.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Response;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::types::{ChatRequest, ModelInfo, StreamChunk, ToolCall, Usage};

use super::{ChatStream, ModelClient, SseAssembler};

// ---------------------------------------------------------------------------
// Retry policy
// ---------------------------------------------------------------------------

/// Retry policy for establishing an API request.
///
/// Only request establishment retries; once a stream has started delivering
/// chunks, a failure surfaces to the caller instead.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    /// Whether a status code is worth retrying.
    pub fn retryable_status(status: u16) -> bool {
        status == 429 || (500..=599).contains(&status)
    }

    /// Exponential backoff delay for a zero-based attempt index, honoring a
    /// server-provided Retry-After when present.
    pub fn delay_for(&self, attempt: u32, retry_after_secs: Option<u64>) -> Duration {
        if let Some(secs) = retry_after_secs {
            // Trust the server but keep the wait within sane bounds.
            return Duration::from_secs(secs.clamp(1, 300));
        }
        let exp = self.base_delay.saturating_mul(1u32 << attempt.min(16));
        exp.min(self.max_delay)
    }
}

// ---------------------------------------------------------------------------
// ApiClient
// ---------------------------------------------------------------------------

/// Streaming client for one configured endpoint.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    provider_label: String,
    retry: RetryPolicy,
}

impl ApiClient {
    pub fn new(config: &ApiConfig, timeout: Duration) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            provider_label: provider_label(&config.base_url),
            retry: RetryPolicy::default(),
        })
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if !self.api_key.is_empty() {
            if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", self.api_key)) {
                headers.insert(AUTHORIZATION, value);
            }
        }
        headers
    }

    /// Issue the POST with retries for transient failures.
    async fn post_with_retry(&self, body: &ChatRequest) -> Result<Response, ApiError> {
        let url = format!("{}/chat/completions", self.base_url);
        let mut attempt = 0u32;
        loop {
            let outcome = self
                .http
                .post(&url)
                .headers(self.headers())
                .json(body)
                .send()
                .await;

            match outcome {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) => {
                    let status = response.status();
                    let retry_after = parse_retry_after(&response);
                    let text = response.text().await.unwrap_or_default();
                    let error = ApiError::status(status.as_u16(), text, retry_after);
                    if attempt + 1 >= self.retry.max_attempts
                        || !RetryPolicy::retryable_status(status.as_u16())
                    {
                        return Err(error);
                    }
                    let delay = self.retry.delay_for(attempt, retry_after);
                    warn!(status = status.as_u16(), attempt, delay_ms = delay.as_millis() as u64, "retrying request");
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    if attempt + 1 >= self.retry.max_attempts || !is_retryable_transport(&e) {
                        return Err(ApiError::Http(e));
                    }
                    let delay = self.retry.delay_for(attempt, None);
                    warn!(error = %e, attempt, "retrying after transport error");
                    tokio::time::sleep(delay).await;
                }
            }
            attempt += 1;
        }
    }
}

#[async_trait]
impl ModelClient for ApiClient {
    async fn stream_chat(&self, request: &ChatRequest) -> Result<ChatStream, ApiError> {
        let mut body = request.clone();
        body.model = self.model.clone();
        body.stream = Some(true);

        let response = self.post_with_retry(&body).await?;
        let is_sse = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("text/event-stream"));

        if !is_sse {
            // Some endpoints ignore stream=true and return one JSON body.
            let text = response.text().await?;
            return non_streaming_fallback(&text);
        }

        let (tx, stream) = ChatStream::channel();
        tokio::spawn(async move {
            let mut response = response;
            let mut assembler = SseAssembler::new();
            loop {
                match response.chunk().await {
                    Ok(Some(bytes)) => {
                        for chunk in assembler.feed(&bytes) {
                            if tx.send(Ok(chunk)).await.is_err() {
                                return; // consumer dropped the stream
                            }
                        }
                        if assembler.is_done() {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        let _ = tx.send(Err(ApiError::Http(e))).await;
                        return;
                    }
                }
            }
            for chunk in assembler.finish() {
                if tx.send(Ok(chunk)).await.is_err() {
                    return;
                }
            }
            debug!("stream complete");
        });
        Ok(stream)
    }

    fn info(&self) -> ModelInfo {
        ModelInfo {
            id: self.model.clone(),
            provider: self.provider_label.clone(),
            capabilities: vec!["streaming".to_string(), "tools".to_string()],
            description: format!("{} via {}", self.model, self.provider_label),
        }
    }
}

/// Convert a complete (non-streamed) completion body into a chunk stream.
fn non_streaming_fallback(text: &str) -> Result<ChatStream, ApiError> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| ApiError::InvalidResponse(format!("not JSON: {e}")))?;
    let message = value
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("message"))
        .ok_or_else(|| ApiError::InvalidResponse("response has no choices".to_string()))?;

    let mut chunks = Vec::new();
    if let Some(content) = message.get("content").and_then(Value::as_str) {
        if !content.is_empty() {
            chunks.push(StreamChunk::TextDelta(content.to_string()));
        }
    }
    if let Some(calls) = message.get("tool_calls") {
        if let Ok(calls) = serde_json::from_value::<Vec<ToolCall>>(calls.clone()) {
            if !calls.is_empty() {
                chunks.push(StreamChunk::ToolCalls(calls));
            }
        }
    }
    if let Some(usage) = value.get("usage").filter(|u| !u.is_null()) {
        if let Ok(usage) = serde_json::from_value::<Usage>(usage.clone()) {
            chunks.push(StreamChunk::Usage(usage));
        }
    }
    Ok(ChatStream::from_chunks(chunks))
}

fn parse_retry_after(response: &Response) -> Option<u64> {
    response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
}

fn is_retryable_transport(e: &reqwest::Error) -> bool {
    e.is_timeout() || e.is_connect()
}

/// Short provider label from the endpoint host.
fn provider_label(base_url: &str) -> String {
    base_url
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .split('/')
        .next()
        .unwrap_or("unknown")
        .to_string()
}
