//! Node trait: one step of a state graph.

use async_trait::async_trait;

use crate::error::AgentError;

use super::Next;

/// One graph step: receives the state, returns the updated state and what to do next.
///
/// **Interaction**: Registered with [`StateGraph::add_node`](super::StateGraph::add_node);
/// executed by [`CompiledStateGraph`](super::CompiledStateGraph).
#[async_trait]
pub trait Node<S>: Send + Sync {
    /// Node id, used in logs and stream events.
    fn id(&self) -> &str;

    async fn run(&self, state: S) -> Result<(S, Next), AgentError>;
}
