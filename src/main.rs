use std::path::Path;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use sidekick::agent::Agent;
use sidekick::cli::Cli;
use sidekick::config::{load_config, select_model_profile, Config};
use sidekick::error::ProviderFailureKind;
use sidekick::executor::ToolExecutor;
use sidekick::render::Renderer;
use sidekick::safety::{SafetyPreferences, TerminalPrompt};
use sidekick::session::SessionLog;
use sidekick::tools::ToolRegistry;

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(code) = run(cli).await {
        std::process::exit(code);
    }
}

async fn run(cli: Cli) -> Result<(), i32> {
    let renderer_color = !cli.no_color;
    let renderer = Renderer::new(renderer_color);

    let mut config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            renderer.error(&e.to_string());
            return Err(2);
        }
    };
    if let Err(e) = apply_cli_overrides(&mut config, &cli) {
        renderer.error(&e);
        return Err(2);
    }

    let tools = ToolRegistry::builtin(&config);
    let prefs = SafetyPreferences {
        auto_confirm: config.safety.auto_confirm,
        safe_mode: config.safety.safe_mode,
    };
    let executor = ToolExecutor::new(
        prefs,
        config.safety.deny_patterns.clone(),
        Box::new(TerminalPrompt),
    );

    let one_shot = cli.prompt.is_some();
    let log = if one_shot {
        SessionLog::disabled()
    } else {
        SessionLog::create(Path::new("."))
    };

    let mut agent = match Agent::new(config, tools, executor, log) {
        Ok(agent) => agent,
        Err(e) => {
            renderer.error(&e.to_string());
            return Err(2);
        }
    };

    match cli.prompt {
        Some(prompt) => run_once(&mut agent, &renderer, &prompt).await,
        None => repl(&mut agent, &renderer).await,
    }
}

fn apply_cli_overrides(config: &mut Config, cli: &Cli) -> Result<(), String> {
    if let Some(profile) = &cli.model {
        select_model_profile(config, profile).map_err(|e| e.to_string())?;
    }
    if let Some(base_url) = &cli.base_url {
        config.api.base_url = base_url.clone();
    }
    if cli.no_color {
        config.display.color = false;
    }
    if cli.safe {
        config.safety.safe_mode = true;
    }
    if cli.yes {
        config.safety.auto_confirm = true;
    }
    Ok(())
}

async fn run_once(agent: &mut Agent, renderer: &Renderer, prompt: &str) -> Result<(), i32> {
    match agent.send(prompt).await {
        Ok(_) => Ok(()),
        Err(e) => {
            renderer.error(&e.to_string());
            Err(1)
        }
    }
}

async fn repl(agent: &mut Agent, renderer: &Renderer) -> Result<(), i32> {
    let info = agent.model_info();
    renderer.header(&info.id, &agent.config().api.profile);

    loop {
        let Some(line) = read_line("> ").await else {
            break; // EOF
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if let Some(command) = input.strip_prefix('/') {
            if !handle_command(agent, renderer, command).await {
                break;
            }
            continue;
        }

        match agent.send(input).await {
            Ok(_) => {
                if agent.config().display.show_tokens {
                    renderer.token_usage(agent.tracker());
                }
            }
            Err(e) => {
                renderer.error(&e.to_string());
                if let sidekick::error::AgentError::Provider { kind, .. } = &e {
                    if !matches!(kind, ProviderFailureKind::Unknown) {
                        renderer.info(
                            "Your message was not recorded. Try again, or switch with /model <profile>.",
                        );
                    }
                }
            }
        }
    }
    Ok(())
}

/// Handle a slash command; returns false when the REPL should exit.
async fn handle_command(agent: &mut Agent, renderer: &Renderer, command: &str) -> bool {
    let mut parts = command.split_whitespace();
    let name = parts.next().unwrap_or_default();
    let arg = parts.next();

    match name {
        "quit" | "exit" | "q" => return false,
        "clear" => {
            agent.clear_history();
            renderer.info("History cleared.");
        }
        "model" => match arg {
            Some(profile) => match agent.switch_model(profile) {
                Ok(()) => {
                    let info = agent.model_info();
                    renderer.info(&format!("Switched to {} ({})", profile, info.id));
                }
                Err(e) => renderer.error(&e.to_string()),
            },
            None => {
                let info = agent.model_info();
                renderer.info(&format!("Current model: {} via {}", info.id, info.provider));
                let profiles: Vec<&str> =
                    agent.config().models.keys().map(String::as_str).collect();
                renderer.info(&format!("Available profiles: {}", profiles.join(", ")));
            }
        },
        "usage" => renderer.token_usage(agent.tracker()),
        "tools" => renderer.info(&agent.tools().manifest()),
        "help" => {
            renderer.info(
                "Commands: /clear, /model [profile], /usage, /tools, /quit",
            );
        }
        other => renderer.error(&format!("unknown command: /{other}")),
    }
    true
}

async fn read_line(prompt: &str) -> Option<String> {
    use std::io::Write;
    print!("{prompt}");
    let _ = std::io::stdout().flush();
    tokio::task::spawn_blocking(|| {
        let mut line = String::new();
        match std::io::stdin().read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(line),
            Err(_) => None,
        }
    })
    .await
    .ok()
    .flatten()
}
