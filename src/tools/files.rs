//! File reading and editing tools.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ToolError;
use crate::textutil::clip_output;
use crate::types::ToolResult;

use super::Tool;

/// Byte cap on file content returned to the model.
const READ_LIMIT_BYTES: usize = 8_000;

fn parse_args<'a, T: Deserialize<'a>>(args: &'a Value) -> Result<T, ToolError> {
    T::deserialize(args).map_err(|e| ToolError::InvalidArguments(e.to_string()))
}

// ---------------------------------------------------------------------------
// read_file
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ReadFileArgs {
    path: String,
}

/// Read a file's contents.
pub struct ReadFileTool;

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &'static str {
        "read_file"
    }

    fn description(&self) -> &'static str {
        "Read the contents of a file"
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {"type": "string", "description": "Path to the file to read"}
            },
            "required": ["path"]
        })
    }

    fn describe_call(&self, args: &Value) -> String {
        match args.get("path").and_then(Value::as_str) {
            Some(path) => format!("Read file: {path}"),
            None => "Read file".to_string(),
        }
    }

    async fn execute(&self, args: &Value) -> Result<ToolResult, ToolError> {
        let args: ReadFileArgs = parse_args(args)?;
        match tokio::fs::read_to_string(&args.path).await {
            Ok(content) => {
                let shown = clip_output(&content, READ_LIMIT_BYTES);
                Ok(ToolResult::ok_with_metadata(
                    shown,
                    json!({"path": args.path, "bytes": content.len()}),
                ))
            }
            Err(e) => Ok(ToolResult::fail(format!(
                "could not read {}: {e}",
                args.path
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// write_file
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct WriteFileArgs {
    path: String,
    content: String,
}

/// Create or overwrite a file.
pub struct WriteFileTool;

#[async_trait]
impl Tool for WriteFileTool {
    fn name(&self) -> &'static str {
        "write_file"
    }

    fn description(&self) -> &'static str {
        "Create or overwrite a file with the given content"
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {"type": "string", "description": "Path to write"},
                "content": {"type": "string", "description": "Full file content"}
            },
            "required": ["path", "content"]
        })
    }

    fn destructive(&self) -> bool {
        true
    }

    fn requires_confirmation(&self) -> bool {
        true
    }

    fn describe_call(&self, args: &Value) -> String {
        match args.get("path").and_then(Value::as_str) {
            Some(path) => format!("Write to file: {path}"),
            None => "Write to file".to_string(),
        }
    }

    async fn execute(&self, args: &Value) -> Result<ToolResult, ToolError> {
        let args: WriteFileArgs = parse_args(args)?;
        if let Some(parent) = std::path::Path::new(&args.path).parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(e) = tokio::fs::create_dir_all(parent).await {
                    return Ok(ToolResult::fail(format!(
                        "could not create parent directories for {}: {e}",
                        args.path
                    )));
                }
            }
        }
        match tokio::fs::write(&args.path, args.content.as_bytes()).await {
            Ok(()) => Ok(ToolResult::ok_with_metadata(
                format!("Wrote {} bytes to {}", args.content.len(), args.path),
                json!({"path": args.path, "bytes": args.content.len()}),
            )),
            Err(e) => Ok(ToolResult::fail(format!(
                "could not write {}: {e}",
                args.path
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// edit_file
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct EditFileArgs {
    path: String,
    old_text: String,
    new_text: String,
    #[serde(default)]
    replace_all: bool,
}

/// Replace text within an existing file.
pub struct EditFileTool;

#[async_trait]
impl Tool for EditFileTool {
    fn name(&self) -> &'static str {
        "edit_file"
    }

    fn description(&self) -> &'static str {
        "Replace an exact text snippet in an existing file"
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {"type": "string", "description": "Path to the file to edit"},
                "old_text": {"type": "string", "description": "Exact text to find"},
                "new_text": {"type": "string", "description": "Replacement text"},
                "replace_all": {
                    "type": "boolean",
                    "description": "Replace every occurrence instead of the first"
                }
            },
            "required": ["path", "old_text", "new_text"]
        })
    }

    fn destructive(&self) -> bool {
        true
    }

    fn requires_confirmation(&self) -> bool {
        true
    }

    fn describe_call(&self, args: &Value) -> String {
        match args.get("path").and_then(Value::as_str) {
            Some(path) => format!("Edit file: {path}"),
            None => "Edit file".to_string(),
        }
    }

    async fn execute(&self, args: &Value) -> Result<ToolResult, ToolError> {
        let args: EditFileArgs = parse_args(args)?;
        if args.old_text.is_empty() {
            return Err(ToolError::InvalidArguments(
                "old_text must not be empty".to_string(),
            ));
        }
        let content = match tokio::fs::read_to_string(&args.path).await {
            Ok(content) => content,
            Err(e) => {
                return Ok(ToolResult::fail(format!(
                    "could not read {}: {e}",
                    args.path
                )))
            }
        };
        let occurrences = content.matches(&args.old_text).count();
        if occurrences == 0 {
            return Ok(ToolResult::fail(format!(
                "old_text not found in {}",
                args.path
            )));
        }
        let (updated, replaced) = if args.replace_all {
            (content.replace(&args.old_text, &args.new_text), occurrences)
        } else {
            (content.replacen(&args.old_text, &args.new_text, 1), 1)
        };
        match tokio::fs::write(&args.path, updated.as_bytes()).await {
            Ok(()) => Ok(ToolResult::ok_with_metadata(
                format!("Replaced {replaced} occurrence(s) in {}", args.path),
                json!({"path": args.path, "replaced": replaced}),
            )),
            Err(e) => Ok(ToolResult::fail(format!(
                "could not write {}: {e}",
                args.path
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testsupport::ScratchDir;
    use serde_json::json;

    #[tokio::test]
    async fn read_file_returns_content() {
        let dir = ScratchDir::new("files");
        let path = dir.file("a.txt", "hello world");
        let result = ReadFileTool
            .execute(&json!({"path": path.to_string_lossy()}))
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.output, "hello world");
    }

    #[tokio::test]
    async fn read_file_missing_is_business_failure() {
        let dir = ScratchDir::new("files");
        let path = dir.path("missing.txt");
        let result = ReadFileTool
            .execute(&json!({"path": path.to_string_lossy()}))
            .await
            .unwrap();
        assert!(!result.success);
        assert!(result.error.unwrap().contains("could not read"));
    }

    #[tokio::test]
    async fn read_file_truncates_long_content() {
        let dir = ScratchDir::new("files");
        let path = dir.file("big.txt", &"x".repeat(10_000));
        let result = ReadFileTool
            .execute(&json!({"path": path.to_string_lossy()}))
            .await
            .unwrap();
        assert!(result.success);
        assert!(result.output.ends_with("...[truncated]"));
        assert!(result.output.len() < 10_000);
    }

    #[tokio::test]
    async fn write_file_creates_parents() {
        let dir = ScratchDir::new("files");
        let path = dir.path("nested/deep/out.txt");
        let result = WriteFileTool
            .execute(&json!({"path": path.to_string_lossy(), "content": "data"}))
            .await
            .unwrap();
        assert!(result.success, "{:?}", result.error);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "data");
    }

    #[tokio::test]
    async fn write_file_missing_args_is_contract_error() {
        let err = WriteFileTool
            .execute(&json!({"path": "x.txt"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[tokio::test]
    async fn edit_file_replaces_first_occurrence_by_default() {
        let dir = ScratchDir::new("files");
        let path = dir.file("code.rs", "foo bar foo");
        let result = EditFileTool
            .execute(&json!({
                "path": path.to_string_lossy(),
                "old_text": "foo",
                "new_text": "baz"
            }))
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "baz bar foo");
    }

    #[tokio::test]
    async fn edit_file_replace_all_replaces_every_occurrence() {
        let dir = ScratchDir::new("files");
        let path = dir.file("code.rs", "foo bar foo");
        let result = EditFileTool
            .execute(&json!({
                "path": path.to_string_lossy(),
                "old_text": "foo",
                "new_text": "baz",
                "replace_all": true
            }))
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "baz bar baz");
    }

    #[tokio::test]
    async fn edit_file_not_found_text_is_business_failure() {
        let dir = ScratchDir::new("files");
        let path = dir.file("code.rs", "foo");
        let result = EditFileTool
            .execute(&json!({
                "path": path.to_string_lossy(),
                "old_text": "missing",
                "new_text": "x"
            }))
            .await
            .unwrap();
        assert!(!result.success);
        assert!(result.error.unwrap().contains("not found"));
    }

    #[test]
    fn destructive_flags_are_set() {
        assert!(!ReadFileTool.destructive());
        assert!(WriteFileTool.destructive());
        assert!(WriteFileTool.requires_confirmation());
        assert!(EditFileTool.destructive());
    }
}
