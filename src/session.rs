//! Session transcript logging.
//!
//! Each session appends JSON-lines events to `.sidekick/logs/<id>.jsonl`.
//! Logging is best-effort: an unwritable directory downgrades to a warning
//! rather than failing the session.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use rand::Rng;
use serde::Serialize;
use tracing::warn;

/// One logged session event.
#[derive(Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent<'a> {
    UserTurn { content: &'a str },
    AssistantTurn { content: &'a str },
    ToolCall { tool: &'a str, arguments: &'a str },
    ToolResult { tool: &'a str, success: bool, output: &'a str },
    ProviderFailure { kind: &'a str, message: &'a str },
    HistoryCleared,
}

/// Append-only JSONL session log.
#[derive(Debug)]
pub struct SessionLog {
    file: Option<File>,
    path: Option<PathBuf>,
}

impl SessionLog {
    /// Open a new session log under `root/.sidekick/logs/`.
    ///
    /// Falls back to a disabled log when the directory or file cannot be
    /// created.
    pub fn create(root: &Path) -> Self {
        let dir = root.join(".sidekick").join("logs");
        if let Err(e) = std::fs::create_dir_all(&dir) {
            warn!(error = %e, "could not create session log directory");
            return Self::disabled();
        }
        let id = new_session_id();
        let path = dir.join(format!("{id}.jsonl"));
        match OpenOptions::new().create_new(true).append(true).open(&path) {
            Ok(file) => Self {
                file: Some(file),
                path: Some(path),
            },
            Err(e) => {
                warn!(error = %e, path = %path.display(), "could not open session log");
                Self::disabled()
            }
        }
    }

    /// A log that drops every event. Used by tests and one-shot mode.
    pub fn disabled() -> Self {
        Self {
            file: None,
            path: None,
        }
    }

    /// Path of the log file, when logging is active.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Append one event. IO failures are logged and swallowed.
    pub fn append(&mut self, event: &SessionEvent<'_>) {
        let Some(file) = self.file.as_mut() else {
            return;
        };
        let line = match serde_json::to_string(event) {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "could not serialize session event");
                return;
            }
        };
        if let Err(e) = writeln!(file, "{line}").and_then(|_| file.flush()) {
            warn!(error = %e, "could not write session event");
        }
    }
}

/// Random lowercase hex session identifier with a timestamp prefix.
fn new_session_id() -> String {
    let secs = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    let nonce: u32 = rand::thread_rng().gen();
    format!("{secs}-{nonce:08x}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testsupport::ScratchDir;

    #[test]
    fn events_are_appended_as_json_lines() {
        let dir = ScratchDir::new("session");
        let mut log = SessionLog::create(dir.root());
        log.append(&SessionEvent::UserTurn { content: "hello" });
        log.append(&SessionEvent::ToolResult {
            tool: "read_file",
            success: true,
            output: "ok",
        });

        let path = log.path().expect("log should be active").to_path_buf();
        let text = std::fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["event"], "user_turn");
        assert_eq!(first["content"], "hello");

        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["event"], "tool_result");
        assert_eq!(second["success"], true);
    }

    #[test]
    fn disabled_log_drops_events() {
        let mut log = SessionLog::disabled();
        log.append(&SessionEvent::HistoryCleared);
        assert!(log.path().is_none());
    }
}
