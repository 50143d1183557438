//! Terminal output rendering.
//!
//! All user-facing printing goes through [`Renderer`] so color handling and
//! prefixes stay in one place. Formatting functions are pure and separately
//! testable; the printing methods just add color when enabled.

use crossterm::style::Stylize;

use crate::tokens::TokenTracker;
use crate::types::{ToolCall, ToolResult};

/// Renders agent output to the terminal.
#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    /// Print the startup banner.
    pub fn header(&self, model: &str, profile: &str) {
        let line = format!("sidekick | profile: {profile} | model: {model}");
        if self.color {
            println!("{}", line.as_str().dark_cyan());
        } else {
            println!("{line}");
        }
        println!("Type a request, or /help for commands.");
    }

    /// Print a chunk of streamed assistant text without a trailing newline.
    pub fn assistant_delta(&self, delta: &str) {
        use std::io::Write;
        print!("{delta}");
        let _ = std::io::stdout().flush();
    }

    /// Terminate the streamed assistant block.
    pub fn assistant_done(&self) {
        println!();
    }

    pub fn info(&self, message: &str) {
        if self.color {
            println!("{}", message.dark_grey());
        } else {
            println!("{message}");
        }
    }

    pub fn warn(&self, message: &str) {
        let line = format!("warning: {message}");
        if self.color {
            eprintln!("{}", line.as_str().yellow());
        } else {
            eprintln!("{line}");
        }
    }

    pub fn error(&self, message: &str) {
        let line = format!("error: {message}");
        if self.color {
            eprintln!("{}", line.as_str().red());
        } else {
            eprintln!("{line}");
        }
    }

    /// Print a one-line notice for a tool call the model requested.
    pub fn tool_call(&self, summary: &str) {
        let line = format_tool_call_line(summary);
        if self.color {
            println!("{}", line.as_str().dark_yellow());
        } else {
            println!("{line}");
        }
    }

    /// Print the outcome of an executed tool call.
    pub fn tool_result(&self, call: &ToolCall, result: &ToolResult) {
        let line = format_tool_result_line(&call.function.name, result);
        if self.color {
            if result.success {
                println!("{}", line.as_str().dark_green());
            } else {
                println!("{}", line.as_str().red());
            }
        } else {
            println!("{line}");
        }
    }

    /// Print session token usage.
    pub fn token_usage(&self, tracker: &TokenTracker) {
        self.info(&format_token_usage(tracker));
    }
}

/// One-line notice for a requested tool call.
pub fn format_tool_call_line(summary: &str) -> String {
    format!("[tool] {summary}")
}

/// One-line outcome summary for an executed tool call.
pub fn format_tool_result_line(tool_name: &str, result: &ToolResult) -> String {
    if result.success {
        format!("[tool] {tool_name}: ok")
    } else {
        let reason = result.error.as_deref().unwrap_or("failed");
        format!("[tool] {tool_name}: {reason}")
    }
}

/// Usage summary shown by `/usage` and the per-turn token line.
pub fn format_token_usage(tracker: &TokenTracker) -> String {
    format!(
        "tokens: last {}+{} | session {}+{} = {} | requests {}",
        tracker.last_prompt_tokens,
        tracker.last_completion_tokens,
        tracker.total_prompt_tokens,
        tracker.total_completion_tokens,
        tracker.session_total(),
        tracker.requests,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_result_line_shows_error_reason() {
        let ok = ToolResult::ok("done");
        assert_eq!(format_tool_result_line("read_file", &ok), "[tool] read_file: ok");

        let failed = ToolResult::fail("file not found: /tmp/x");
        assert_eq!(
            format_tool_result_line("read_file", &failed),
            "[tool] read_file: file not found: /tmp/x"
        );
    }

    #[test]
    fn token_usage_totals_are_formatted() {
        let mut tracker = TokenTracker::new();
        tracker.record(100, 20);
        tracker.record_request();
        let line = format_token_usage(&tracker);
        assert!(line.contains("last 100+20"), "got: {line}");
        assert!(line.contains("= 120"), "got: {line}");
        assert!(line.contains("requests 1"), "got: {line}");
    }
}
