//! Agent execution error types.
//!
//! Returned by graph nodes and model clients. Tool-level failures have their own
//! types ([`ToolError`](crate::tools::ToolError), [`ToolSourceError`](crate::tool_source::ToolSourceError))
//! because most of them are folded back into the transcript instead of aborting the turn.

use thiserror::Error;

use crate::memory::CheckpointError;

/// Agent execution error.
///
/// Any of these aborts the current turn; the runner commits nothing for a failed turn.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Execution failed with a message (e.g. a node received state it cannot handle).
    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    /// The model backend is unreachable or returned an unusable response.
    #[error("model unavailable: {0}")]
    ModelUnavailable(String),

    /// The graph ran more steps than the configured recursion limit.
    #[error("recursion limit of {0} steps reached")]
    RecursionLimit(usize),

    /// Saving the final checkpoint failed.
    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),
}
