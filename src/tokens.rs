//! Session token accounting.
//!
//! Tracks exact counts from the API's `usage` stream chunks. Counters are
//! mutated only by the orchestration loop and read by the `/usage` command.

/// Tracks token usage across a conversation session.
#[derive(Debug, Clone, Default)]
pub struct TokenTracker {
    /// Running total of prompt tokens sent.
    pub total_prompt_tokens: u64,
    /// Running total of completion tokens received.
    pub total_completion_tokens: u64,
    /// Prompt tokens in the most recent request.
    pub last_prompt_tokens: u64,
    /// Completion tokens in the most recent response.
    pub last_completion_tokens: u64,
    /// Number of provider requests issued this session.
    pub requests: u64,
}

impl TokenTracker {
    /// Create a fresh tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record token counts from a response's `usage` field.
    pub fn record(&mut self, prompt_tokens: u64, completion_tokens: u64) {
        self.last_prompt_tokens = prompt_tokens;
        self.last_completion_tokens = completion_tokens;
        self.total_prompt_tokens = self.total_prompt_tokens.saturating_add(prompt_tokens);
        self.total_completion_tokens = self
            .total_completion_tokens
            .saturating_add(completion_tokens);
    }

    /// Record that one provider request was issued.
    pub fn record_request(&mut self) {
        self.requests = self.requests.saturating_add(1);
    }

    /// Total tokens consumed across the entire session.
    pub fn session_total(&self) -> u64 {
        self.total_prompt_tokens
            .saturating_add(self.total_completion_tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_accumulates_and_tracks_last() {
        let mut tracker = TokenTracker::new();
        tracker.record(10, 5);
        tracker.record(7, 3);
        assert_eq!(tracker.total_prompt_tokens, 17);
        assert_eq!(tracker.total_completion_tokens, 8);
        assert_eq!(tracker.last_prompt_tokens, 7);
        assert_eq!(tracker.last_completion_tokens, 3);
        assert_eq!(tracker.session_total(), 25);
    }

    #[test]
    fn request_counter_increments() {
        let mut tracker = TokenTracker::new();
        tracker.record_request();
        tracker.record_request();
        assert_eq!(tracker.requests, 2);
    }
}
