//! System prompt construction.

/// Base system prompt. `{tool_manifest}` is replaced with the registry's
/// manifest so the model knows exactly which tools this build exposes.
const SYSTEM_PROMPT_TEMPLATE: &str = "\
You are a coding assistant operating inside the user's terminal, in their \
current working directory. You help with reading, writing, and editing code, \
running shell commands, and managing git.

You have access to the following tools:
{tool_manifest}

Guidelines:
- Prefer tools over guessing. Read files before editing them.
- Make the smallest change that solves the problem.
- When a command or edit fails, report the failure honestly and adjust.
- Keep answers short; the user is in a terminal.";

/// Build the system prompt from the tool manifest plus an optional
/// user-configured addendum.
pub fn render_system_prompt(tool_manifest: &str, custom: Option<&str>) -> String {
    let mut prompt = SYSTEM_PROMPT_TEMPLATE.replace("{tool_manifest}", tool_manifest);
    if let Some(extra) = custom {
        let extra = extra.trim();
        if !extra.is_empty() {
            prompt.push_str("\n\n");
            prompt.push_str(extra);
        }
    }
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_is_substituted() {
        let prompt = render_system_prompt("read_file(path): Read a file", None);
        assert!(prompt.contains("read_file(path): Read a file"));
        assert!(!prompt.contains("{tool_manifest}"));
    }

    #[test]
    fn custom_addendum_is_appended() {
        let prompt = render_system_prompt("x", Some("Always answer in French."));
        assert!(prompt.ends_with("Always answer in French."));
    }

    #[test]
    fn blank_addendum_is_ignored() {
        let with_blank = render_system_prompt("x", Some("   "));
        let without = render_system_prompt("x", None);
        assert_eq!(with_blank, without);
    }
}
