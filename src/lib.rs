//! Sidekick, an agentic coding assistant for the terminal.
//!
//! This crate provides a REPL-style agent that holds a conversation with any
//! OpenAI API-compatible endpoint, lets the model invoke a fixed catalog of
//! local tools (files, shell, git, todos), and gates side-effecting tool
//! calls behind a confirmation policy.
//!
//! # Quick start
//!
//! ```no_run
//! use sidekick::agent::Agent;
//! use sidekick::config::load_config;
//! use sidekick::executor::ToolExecutor;
//! use sidekick::session::SessionLog;
//! use sidekick::tools::ToolRegistry;
//!
//! # async fn example() {
//! let config = load_config(None).unwrap();
//! let tools = ToolRegistry::new();
//! let executor = ToolExecutor::auto_approving();
//! let mut agent = Agent::new(config, tools, executor, SessionLog::disabled()).unwrap();
//! let response = agent.send("Hello!").await.unwrap();
//! println!("{response}");
//! # }
//! ```

pub mod agent;
pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod executor;
pub mod prompt;
pub mod render;
pub mod safety;
pub mod session;
#[cfg(test)]
pub mod testsupport;
pub mod textutil;
pub mod tokens;
pub mod tools;
pub mod types;
