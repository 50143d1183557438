//! Workspace path matching for user input.
//!
//! Before a user turn goes to the model, the working tree is scanned for
//! files the input appears to mention, and their paths are attached as a
//! context note. Matching is deliberately dumb (literal substrings); the
//! model does the real interpretation.

use std::collections::BTreeSet;
use std::path::Path;

/// Entry cap for the workspace scan.
const MAX_ENTRIES: usize = 5_000;
/// Directory recursion depth cap.
const MAX_DEPTH: usize = 8;
/// Shortest basename considered; one- and two-letter names match everywhere.
const MIN_NAME_LEN: usize = 3;

const SKIPPED_DIRS: &[&str] = &["target", "node_modules", ".git", ".sidekick"];

/// Relative paths under `root` that `input` appears to reference, sorted and
/// deduplicated.
pub fn related_paths(input: &str, root: &Path) -> Vec<String> {
    let mut found = BTreeSet::new();
    let mut budget = MAX_ENTRIES;
    walk(input, root, root, 0, &mut budget, &mut found);
    found.into_iter().collect()
}

fn walk(
    input: &str,
    root: &Path,
    dir: &Path,
    depth: usize,
    budget: &mut usize,
    found: &mut BTreeSet<String>,
) {
    if depth > MAX_DEPTH || *budget == 0 {
        return;
    }
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        if *budget == 0 {
            return;
        }
        *budget -= 1;

        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.starts_with('.') {
            continue;
        }
        if path.is_dir() {
            if !SKIPPED_DIRS.contains(&name) {
                walk(input, root, &path, depth + 1, budget, found);
            }
            continue;
        }
        if !path.is_file() {
            continue;
        }

        let Ok(relative) = path.strip_prefix(root) else {
            continue;
        };
        let relative = relative.to_string_lossy().replace('\\', "/");
        if mentions(input, name, &relative) {
            found.insert(relative);
        }
    }
}

/// Whether the input mentions this file by name or relative path.
fn mentions(input: &str, file_name: &str, relative: &str) -> bool {
    // At the repo root the relative path is the bare basename, so the path
    // branch must not bypass the basename length floor.
    if relative != file_name && input.contains(relative) {
        return true;
    }
    file_name.len() >= MIN_NAME_LEN && input.contains(file_name)
}

/// Format matched paths as a context note appended to the user message.
pub fn context_note(paths: &[String]) -> Option<String> {
    if paths.is_empty() {
        return None;
    }
    Some(format!(
        "[Context: files in the workspace possibly relevant to this request: {}]",
        paths.join(", ")
    ))
}
