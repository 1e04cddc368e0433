//! Control value returned by a node after it runs.

/// What the graph does after a node completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Next {
    /// Follow the node's outgoing edge (direct or conditional).
    Continue,
    /// Jump to the node with this id, ignoring outgoing edges.
    Node(String),
    /// Stop the run.
    End,
}
