//! Route node: enforces the tool-hop guard; the conditional edge after it picks tool vs end.

use async_trait::async_trait;
use tracing::warn;

use crate::error::AgentError;
use crate::graph::{Next, Node};
use crate::message::Message;
use crate::state::ChatState;
use crate::tools::error_payload;

use super::{MAX_TOOL_HOPS_EXCEEDED, NODE_ROUTE};

/// Router key for "run the pending tool calls".
pub const ROUTE_TOOL: &str = "tool";
/// Router key for "the turn is over".
pub const ROUTE_END: &str = "end";

/// Route node.
///
/// When the last message still requests tools but `max_tool_hops` dispatches already happened
/// this turn, each pending call gets an error result and a final `MaxToolHopsExceeded` message is
/// appended, so the router sends the run to END.
pub struct RouteNode {
    max_tool_hops: usize,
}

impl RouteNode {
    pub fn new(max_tool_hops: usize) -> Self {
        Self { max_tool_hops }
    }
}

/// Router for the conditional edge out of the route node.
pub fn route_after_chat(state: &ChatState) -> String {
    if state.pending_tool_calls().is_empty() {
        ROUTE_END.to_string()
    } else {
        ROUTE_TOOL.to_string()
    }
}

#[async_trait]
impl Node<ChatState> for RouteNode {
    fn id(&self) -> &str {
        NODE_ROUTE
    }

    async fn run(&self, state: ChatState) -> Result<(ChatState, Next), AgentError> {
        let pending = state.pending_tool_calls().to_vec();
        if pending.is_empty() || state.turn.hops < self.max_tool_hops {
            return Ok((state, Next::Continue));
        }

        warn!(
            thread_id = %state.thread_id,
            hops = state.turn.hops,
            "tool hop limit reached; ending turn"
        );
        let mut state = state;
        for call in pending {
            state.push(Message::tool_result(
                call.id,
                call.name,
                error_payload(format!(
                    "{}: tool call skipped, limit of {} tool hops reached",
                    MAX_TOOL_HOPS_EXCEEDED, self.max_tool_hops
                )),
            ));
        }
        state.push(Message::assistant(format!(
            "{}: stopped after {} tool hops without reaching a final answer.",
            MAX_TOOL_HOPS_EXCEEDED, self.max_tool_hops
        )));
        Ok((state, Next::Continue))
    }
}
