//! Structured logging for graph execution events.

use tracing::{debug, error, info};

use crate::error::AgentError;
use crate::graph::Next;

pub fn log_node_start(node_id: &str, step: usize) {
    debug!(node_id, step, "node start");
}

pub fn log_node_complete(node_id: &str, next: &Next) {
    debug!(node_id, ?next, "node complete");
}

pub fn log_graph_start(thread_id: Option<&str>) {
    info!(thread_id, "graph start");
}

pub fn log_graph_complete(thread_id: Option<&str>, steps: usize) {
    info!(thread_id, steps, "graph complete");
}

pub fn log_graph_error(error: &AgentError) {
    error!(%error, "graph execution error");
}
