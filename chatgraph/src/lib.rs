//! # chatgraph
//!
//! A conversational agent runtime: a small state graph that alternates between a model and
//! tools until the model gives a final answer, with the conversation checkpointed per thread.
//!
//! ## Flow of one turn
//!
//! `START → chat → route`, then `route → invoke_tool → chat` while the model requests tools and
//! `route → END` once it answers. The route node also stops a turn after a configured number of
//! tool hops. The runner saves the final state for the thread only after the graph finished.
//!
//! ## Main Modules
//!
//! - [`graph`]: `StateGraph`, `CompiledStateGraph`, `Node`, `Next`. Generic over the state type.
//! - [`agent`]: chat/route/tool nodes, the manual JSON contract parser and [`ChatRunner`].
//! - [`tools`]: [`ToolRegistry`] plus built-in tools (calculator, stock quote, search).
//! - [`tool_source`]: tool servers over stdio or HTTP JSON-RPC (`mcp` feature).
//! - [`llm`]: [`LlmClient`] trait, [`MockLlm`] and [`ChatOpenAI`] (`openai` feature).
//! - [`memory`]: checkpointers ([`MemorySaver`], [`SqliteSaver`] with `sqlite`).
//! - [`agent_builder`]: builds registry, checkpointer and remote sources from one config.
//!
//! ## Features
//!
//! - `mcp` (default): remote tool servers.
//! - `sqlite` (default): persistent checkpoints.
//! - `openai`: OpenAI-compatible chat client via `async-openai` (also works with Ollama's `/v1`).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use chatgraph::{ChatRunner, ChatRunnerConfig, CalculatorTool, MemorySaver, MockLlm, ToolRegistry};
//! use chatgraph::state::ChatState;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let registry = ToolRegistry::new();
//! registry.register(Arc::new(CalculatorTool::new()));
//! let llm = Arc::new(MockLlm::texts([r#"{"tool": null, "response": "Hi!"}"#]));
//! let runner = ChatRunner::new(
//!     llm,
//!     Arc::new(registry),
//!     Arc::new(MemorySaver::<ChatState>::new()),
//!     ChatRunnerConfig { mode: chatgraph::ToolCallMode::ManualJson, ..Default::default() },
//! )
//! .unwrap();
//! let outcome = runner.run_turn("t1", "hello").await.unwrap();
//! assert_eq!(outcome.answer, "Hi!");
//! # }
//! ```

pub mod agent;
pub mod agent_builder;
pub mod error;
pub mod graph;
pub mod llm;
pub mod memory;
pub mod message;
pub mod state;
pub mod stream;
pub mod tool_source;
pub mod tools;

pub use agent::{
    parse_model_output, ChatNode, ChatRunner, ChatRunnerConfig, ParsedOutput, RouteNode,
    RunError, ToolCallMode, ToolNode, TurnOutcome, DEFAULT_MAX_TOOL_HOPS, MAX_TOOL_HOPS_EXCEEDED,
};
pub use agent_builder::{build_agent_context, build_chat_runner, AgentBuildConfig, AgentContext};
pub use error::AgentError;
pub use graph::{CompilationError, CompiledStateGraph, Next, Node, StateGraph, END, START};
pub use llm::{LlmClient, LlmResponse, MockLlm, ToolChoiceMode};
#[cfg(feature = "openai")]
pub use llm::ChatOpenAI;
pub use memory::{Checkpoint, CheckpointError, Checkpointer, JsonSerializer, MemorySaver, RunnableConfig};
#[cfg(feature = "sqlite")]
pub use memory::SqliteSaver;
pub use message::{Message, Role, ToolCall};
pub use state::ChatState;
pub use stream::{GraphStream, StreamEvent, StreamMode};
pub use tool_source::{MockToolSource, ToolCallContent, ToolSource, ToolSourceError, ToolSpec};
#[cfg(feature = "mcp")]
pub use tool_source::{McpToolSource, StdioServerParams};
pub use tools::{
    CalculatorTool, DuplicateToolWarning, SearchTool, StockPriceTool, Tool, ToolError, ToolRegistry,
};
