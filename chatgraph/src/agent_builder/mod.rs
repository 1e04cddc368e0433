//! Agent context builder: tool registry, checkpointer and remote tool sources from one config.
//!
//! Used by the CLI (or any caller holding an [`AgentBuildConfig`]) so the wiring of built-in and
//! remote tools lives in one place instead of in global state.

mod build;
mod config;

pub use build::{build_agent_context, build_chat_runner, AgentContext, BuildError};
pub use config::{AgentBuildConfig, HttpServerConfig, StdioServerConfig};
