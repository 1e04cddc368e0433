//! Chat agent graph: `chat → route → invoke_tool → chat`, ending when the model answers.
//!
//! - [`ChatNode`] calls the model and appends its reply.
//! - [`RouteNode`] enforces the per-turn tool-hop limit; its conditional edge picks
//!   `invoke_tool` when the last message requests tools and END otherwise.
//! - [`ToolNode`] runs the requested tools through the [`ToolRegistry`](crate::tools::ToolRegistry).
//! - [`ChatRunner`] loads and saves conversations around each turn.

mod chat_node;
mod parse;
mod prompt;
mod route_node;
mod runner;
mod tool_node;

pub use chat_node::ChatNode;
pub use parse::{parse_model_output, ParsedOutput};
pub use prompt::manual_json_system_prompt;
pub use route_node::{route_after_chat, RouteNode, ROUTE_END, ROUTE_TOOL};
pub use runner::{build_chat_graph, ChatRunner, ChatRunnerConfig, RunError, TurnOutcome};
pub use tool_node::ToolNode;

pub const NODE_CHAT: &str = "chat";
pub const NODE_ROUTE: &str = "route";
pub const NODE_INVOKE_TOOL: &str = "invoke_tool";

/// Tool dispatches allowed per user turn unless configured otherwise.
pub const DEFAULT_MAX_TOOL_HOPS: usize = 8;

/// Prefix of the final message written when the hop limit stops a turn.
pub const MAX_TOOL_HOPS_EXCEEDED: &str = "MaxToolHopsExceeded";

/// How the model asks for tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolCallMode {
    /// Native function calling: tools are offered with the request, calls come back structured.
    #[default]
    Native,
    /// The system prompt asks for one JSON object per reply and the reply text is parsed.
    ManualJson,
}

impl std::str::FromStr for ToolCallMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "native" => Ok(Self::Native),
            "json" | "manual" | "manual_json" => Ok(Self::ManualJson),
            _ => Err(format!("unknown tool call mode: {} (use native or json)", s)),
        }
    }
}
