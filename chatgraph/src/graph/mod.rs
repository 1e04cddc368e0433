//! State graph: nodes plus direct and conditional edges, compile and invoke.
//!
//! Build with [`StateGraph`], compile into a [`CompiledStateGraph`], then `invoke` or `stream`
//! with a state value. The chat agent in [`crate::agent`] is one such graph.

mod compile_error;
mod compiled;
pub mod logging;
mod next;
mod node;
mod run_context;
mod state_graph;

pub use compile_error::CompilationError;
pub use compiled::{CompiledStateGraph, DEFAULT_RECURSION_LIMIT};
pub use next::Next;
pub use node::Node;
pub use run_context::RunContext;
pub use state_graph::{Router, StateGraph, END, START};
