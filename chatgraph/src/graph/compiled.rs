//! Compiled state graph: immutable, supports invoke and stream.
//!
//! Built by `StateGraph::compile` or `compile_with_checkpointer`. When a checkpointer is set and
//! `config.thread_id` is provided, the final state is saved when the run reaches END.

use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::error::AgentError;
use crate::memory::{Checkpoint, Checkpointer, RunnableConfig};
use crate::stream::{GraphStream, StreamEvent, StreamMode};

use super::logging::{log_graph_complete, log_graph_error, log_graph_start, log_node_complete, log_node_start};
use super::state_graph::{Router, END};
use super::{Next, Node, RunContext};

/// Node steps allowed per run when the config does not set `recursion_limit`.
pub const DEFAULT_RECURSION_LIMIT: usize = 25;

/// Outgoing edge of a node after compilation.
pub(super) enum Transition<S> {
    Direct(String),
    Conditional {
        router: Router<S>,
        path_map: HashMap<String, String>,
    },
}

/// Compiled graph: immutable structure.
///
/// Runs from the entry node; after each node uses the returned `Next` and the node's outgoing
/// edge to choose the next node.
pub struct CompiledStateGraph<S> {
    pub(super) nodes: HashMap<String, Arc<dyn Node<S>>>,
    pub(super) entry: String,
    pub(super) transitions: HashMap<String, Transition<S>>,
    pub(super) checkpointer: Option<Arc<dyn Checkpointer<S>>>,
}

impl<S> CompiledStateGraph<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    /// Resolves the node that follows `current_id` for `Next::Continue`; `None` means END.
    fn follow_edge(&self, current_id: &str, state: &S) -> Result<Option<String>, AgentError> {
        let target = match self.transitions.get(current_id) {
            None => return Ok(None),
            Some(Transition::Direct(to)) => to.clone(),
            Some(Transition::Conditional { router, path_map }) => {
                let key = router(state);
                path_map.get(&key).cloned().ok_or_else(|| {
                    AgentError::ExecutionFailed(format!(
                        "conditional edge from {} returned unmapped key {}",
                        current_id, key
                    ))
                })?
            }
        };
        Ok(if target == END { None } else { Some(target) })
    }

    /// Shared run loop used by invoke() and stream(): steps through nodes until END.
    async fn run_loop(&self, state: &mut S, ctx: &RunContext<S>) -> Result<usize, AgentError> {
        let limit = ctx
            .config
            .recursion_limit
            .unwrap_or(DEFAULT_RECURSION_LIMIT);
        let mut current_id = self.entry.clone();
        let mut step = 0usize;
        loop {
            if step >= limit {
                return Err(AgentError::RecursionLimit(limit));
            }
            let node = self
                .nodes
                .get(&current_id)
                .cloned()
                .ok_or_else(|| AgentError::ExecutionFailed(format!("node not found: {}", current_id)))?;

            log_node_start(&current_id, step);
            let (new_state, next) = node.run(state.clone()).await?;
            log_node_complete(&current_id, &next);
            *state = new_state;
            step += 1;
            ctx.emit(&current_id, state).await;

            let following = match next {
                Next::End => None,
                Next::Node(id) => Some(id),
                Next::Continue => self.follow_edge(&current_id, state)?,
            };
            match following {
                Some(id) => current_id = id,
                None => break,
            }
        }

        if let (Some(cp), Some(thread_id)) = (&self.checkpointer, ctx.config.thread_id.as_deref()) {
            let checkpoint = Checkpoint::from_state(state.clone(), step as u64);
            cp.save(thread_id, &checkpoint).await?;
        }
        Ok(step)
    }

    /// Runs the graph with the given state and returns the final state.
    ///
    /// When `config` has `thread_id` and the graph was compiled with a checkpointer, the final
    /// state is saved; a failed save is returned as `AgentError::Checkpoint`.
    pub async fn invoke(&self, state: S, config: Option<RunnableConfig>) -> Result<S, AgentError> {
        let ctx = RunContext::new(config.unwrap_or_default());
        let mut state = state;
        log_graph_start(ctx.config.thread_id.as_deref());
        match self.run_loop(&mut state, &ctx).await {
            Ok(steps) => {
                log_graph_complete(ctx.config.thread_id.as_deref(), steps);
                Ok(state)
            }
            Err(e) => {
                log_graph_error(&e);
                Err(e)
            }
        }
    }

    /// Streams graph execution, emitting events via a channel-backed Stream.
    ///
    /// A failed run emits one `StreamEvent::Error` as its last event. Dropping the returned
    /// stream aborts the run, including any node call still in flight.
    pub fn stream(
        self: &Arc<Self>,
        state: S,
        config: Option<RunnableConfig>,
        stream_mode: impl Into<HashSet<StreamMode>>,
    ) -> GraphStream<S> {
        let (tx, rx) = mpsc::channel(128);
        let graph = Arc::clone(self);
        let ctx = RunContext {
            config: config.unwrap_or_default(),
            stream_tx: Some(tx.clone()),
            stream_mode: stream_mode.into(),
        };

        let task = tokio::spawn(async move {
            let mut state = state;
            if let Err(e) = graph.run_loop(&mut state, &ctx).await {
                log_graph_error(&e);
                let _ = tx.send(StreamEvent::Error(Arc::new(e))).await;
            }
        });

        GraphStream::new(ReceiverStream::new(rx), task)
    }
}
