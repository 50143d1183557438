//! File discovery and content search tools.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ToolError;
use crate::types::ToolResult;

use super::Tool;

/// Cap on file paths returned by `find_files`.
const FIND_LIMIT: usize = 200;
/// Cap on matching lines returned by `search_content`.
const SEARCH_LIMIT: usize = 100;

fn parse_args<'a, T: Deserialize<'a>>(args: &'a Value) -> Result<T, ToolError> {
    T::deserialize(args).map_err(|e| ToolError::InvalidArguments(e.to_string()))
}

// ---------------------------------------------------------------------------
// find_files
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct FindFilesArgs {
    pattern: String,
}

/// Find files by glob pattern.
pub struct FindFilesTool;

#[async_trait]
impl Tool for FindFilesTool {
    fn name(&self) -> &'static str {
        "find_files"
    }

    fn description(&self) -> &'static str {
        "Find files matching a glob pattern, e.g. src/**/*.rs"
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "pattern": {"type": "string", "description": "Glob pattern to match"}
            },
            "required": ["pattern"]
        })
    }

    fn describe_call(&self, args: &Value) -> String {
        match args.get("pattern").and_then(Value::as_str) {
            Some(pattern) => format!("Find files: {pattern}"),
            None => "Find files".to_string(),
        }
    }

    async fn execute(&self, args: &Value) -> Result<ToolResult, ToolError> {
        let args: FindFilesArgs = parse_args(args)?;
        let paths = match glob::glob(&args.pattern) {
            Ok(paths) => paths,
            Err(e) => return Ok(ToolResult::fail(format!("invalid glob pattern: {e}"))),
        };

        let mut matches: Vec<String> = paths
            .filter_map(Result::ok)
            .map(|path| path.to_string_lossy().into_owned())
            .collect();
        matches.sort();

        let total = matches.len();
        matches.truncate(FIND_LIMIT);

        if matches.is_empty() {
            return Ok(ToolResult::ok(format!(
                "No files match pattern: {}",
                args.pattern
            )));
        }
        let mut output = matches.join("\n");
        if total > FIND_LIMIT {
            output.push_str(&format!("\n...[{} more matches omitted]", total - FIND_LIMIT));
        }
        Ok(ToolResult::ok_with_metadata(output, json!({"matches": total})))
    }
}

// ---------------------------------------------------------------------------
// search_content
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct SearchContentArgs {
    pattern: String,
    /// Glob restricting which files are searched. Defaults to the whole tree.
    #[serde(default)]
    path_glob: Option<String>,
}

/// Search file contents by regular expression.
pub struct SearchContentTool;

#[async_trait]
impl Tool for SearchContentTool {
    fn name(&self) -> &'static str {
        "search_content"
    }

    fn description(&self) -> &'static str {
        "Search file contents with a regular expression"
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "pattern": {"type": "string", "description": "Regular expression to search for"},
                "path_glob": {
                    "type": "string",
                    "description": "Glob restricting which files to search, e.g. src/**/*.rs"
                }
            },
            "required": ["pattern"]
        })
    }

    fn describe_call(&self, args: &Value) -> String {
        match args.get("pattern").and_then(Value::as_str) {
            Some(pattern) => format!("Search content: {pattern}"),
            None => "Search content".to_string(),
        }
    }

    async fn execute(&self, args: &Value) -> Result<ToolResult, ToolError> {
        let args: SearchContentArgs = parse_args(args)?;
        let re = match regex::Regex::new(&args.pattern) {
            Ok(re) => re,
            Err(e) => return Ok(ToolResult::fail(format!("invalid regex: {e}"))),
        };
        let file_glob = args.path_glob.as_deref().unwrap_or("**/*");
        let paths = match glob::glob(file_glob) {
            Ok(paths) => paths,
            Err(e) => return Ok(ToolResult::fail(format!("invalid glob pattern: {e}"))),
        };

        let mut hits = Vec::new();
        let mut truncated = false;
        'files: for path in paths.filter_map(Result::ok) {
            if !path.is_file() {
                continue;
            }
            // Binary and non-UTF-8 files are skipped.
            let Ok(content) = std::fs::read_to_string(&path) else {
                continue;
            };
            for (index, line) in content.lines().enumerate() {
                if re.is_match(line) {
                    if hits.len() >= SEARCH_LIMIT {
                        truncated = true;
                        break 'files;
                    }
                    hits.push(format!("{}:{}: {}", path.display(), index + 1, line.trim()));
                }
            }
        }

        if hits.is_empty() {
            return Ok(ToolResult::ok(format!("No matches for: {}", args.pattern)));
        }
        let mut output = hits.join("\n");
        if truncated {
            output.push_str("\n...[more matches omitted]");
        }
        Ok(ToolResult::ok_with_metadata(
            output,
            json!({"matches": hits.len(), "truncated": truncated}),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testsupport::ScratchDir;
    use serde_json::json;

    #[tokio::test]
    async fn find_files_matches_glob() {
        let dir = ScratchDir::new("find");
        dir.file("src/a.rs", "");
        dir.file("src/b.rs", "");
        dir.file("src/c.txt", "");
        let pattern = format!("{}/src/*.rs", dir.root().display());
        let result = FindFilesTool
            .execute(&json!({"pattern": pattern}))
            .await
            .unwrap();
        assert!(result.success);
        assert!(result.output.contains("a.rs"));
        assert!(result.output.contains("b.rs"));
        assert!(!result.output.contains("c.txt"));
    }

    #[tokio::test]
    async fn find_files_reports_empty_result() {
        let dir = ScratchDir::new("find");
        let pattern = format!("{}/nothing/*.zig", dir.root().display());
        let result = FindFilesTool
            .execute(&json!({"pattern": pattern}))
            .await
            .unwrap();
        assert!(result.success);
        assert!(result.output.contains("No files match"));
    }

    #[tokio::test]
    async fn search_content_reports_path_line_and_text() {
        let dir = ScratchDir::new("search");
        dir.file("src/lib.rs", "fn alpha() {}\nfn beta() {}\n");
        let file_glob = format!("{}/**/*.rs", dir.root().display());
        let result = SearchContentTool
            .execute(&json!({"pattern": "fn beta", "path_glob": file_glob}))
            .await
            .unwrap();
        assert!(result.success);
        assert!(result.output.contains("lib.rs:2: fn beta() {}"), "got: {}", result.output);
    }

    #[tokio::test]
    async fn search_content_rejects_bad_regex_as_failure() {
        let result = SearchContentTool
            .execute(&json!({"pattern": "("}))
            .await
            .unwrap();
        assert!(!result.success);
        assert!(result.error.unwrap().contains("invalid regex"));
    }
}
