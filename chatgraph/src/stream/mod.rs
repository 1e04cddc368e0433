//! Streaming types for graph runs.
//!
//! Used by `CompiledStateGraph::stream` and `ChatRunner::stream_turn` to report progress
//! (e.g. "calling tool") before the final answer is ready.

use std::fmt::Debug;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::Stream;

use crate::error::AgentError;

/// Stream mode selector: which kinds of events to emit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StreamMode {
    /// Emit full state after each node completes.
    Values,
    /// Emit the node id together with the state after that node.
    Updates,
}

/// Event emitted while running a graph.
#[derive(Clone, Debug)]
pub enum StreamEvent<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    /// Full state snapshot after a node finishes.
    Values(S),
    /// Node id and the state after that node.
    Updates { node_id: String, state: S },
    /// The run failed; always the last event of a failed stream.
    Error(Arc<AgentError>),
}

/// Events of one graph run executing on a spawned task.
///
/// Dropping the stream aborts the task, so a caller that stops listening also stops the run.
pub struct GraphStream<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    events: ReceiverStream<StreamEvent<S>>,
    task: JoinHandle<()>,
}

impl<S> GraphStream<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    pub(crate) fn new(events: ReceiverStream<StreamEvent<S>>, task: JoinHandle<()>) -> Self {
        Self { events, task }
    }
}

impl<S> Unpin for GraphStream<S> where S: Clone + Send + Sync + Debug + 'static {}

impl<S> Stream for GraphStream<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    type Item = StreamEvent<S>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.events).poll_next(cx)
    }
}

impl<S> Drop for GraphStream<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    fn drop(&mut self) {
        self.task.abort();
    }
}
