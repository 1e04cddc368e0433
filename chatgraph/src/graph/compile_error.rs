//! Graph compilation error.
//!
//! Returned by `StateGraph::compile` when edges reference unknown nodes or the
//! entry/exit structure is invalid.

use thiserror::Error;

/// Error when compiling a state graph.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CompilationError {
    /// A node id in an edge or path map was not registered via `add_node` (and is not START/END).
    #[error("node not found: {0}")]
    NodeNotFound(String),

    /// No edge has from_id == START, or more than one such edge.
    #[error("graph must have exactly one edge from START")]
    MissingStart,

    /// Neither a direct edge nor a conditional path reaches END.
    #[error("graph has no path to END")]
    MissingEnd,

    /// A node has more than one outgoing edge (direct or conditional).
    #[error("node {0} has more than one outgoing edge")]
    DuplicateEdge(String),

    /// A conditional edge has an empty path map.
    #[error("conditional edge from {0} has no paths")]
    EmptyPathMap(String),
}
