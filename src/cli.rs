//! Command-line interface definition.

use std::path::PathBuf;

use clap::Parser;

/// Version string with build metadata injected by build.rs.
pub const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("SIDEKICK_BUILD_GIT_HASH"),
    ")"
);

/// Interactive coding assistant for your terminal.
#[derive(Debug, Parser)]
#[command(name = "sidekick", version = VERSION, about)]
pub struct Cli {
    /// One-shot prompt; runs a single turn and exits instead of the REPL.
    pub prompt: Option<String>,

    /// Path to a config file (default: ./sidekick.toml, then
    /// ~/.config/sidekick/sidekick.toml).
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Model profile to use (a key under [models] in the config).
    #[arg(short, long)]
    pub model: Option<String>,

    /// Override the API base URL.
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Disable colored output.
    #[arg(long)]
    pub no_color: bool,

    /// Confirm every destructive operation.
    #[arg(long)]
    pub safe: bool,

    /// Skip confirmations except for extremely dangerous operations.
    #[arg(short = 'y', long)]
    pub yes: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_one_shot_prompt_with_flags() {
        let cli = Cli::parse_from(["sidekick", "-y", "--no-color", "list the files here"]);
        assert_eq!(cli.prompt.as_deref(), Some("list the files here"));
        assert!(cli.yes);
        assert!(cli.no_color);
        assert!(!cli.safe);
    }

    #[test]
    fn parses_model_and_config_options() {
        let cli = Cli::parse_from(["sidekick", "-m", "ollama", "-c", "custom.toml"]);
        assert_eq!(cli.model.as_deref(), Some("ollama"));
        assert_eq!(cli.config.as_deref(), Some(std::path::Path::new("custom.toml")));
        assert!(cli.prompt.is_none());
    }
}
