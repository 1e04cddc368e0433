//! Invoke config: thread_id and recursion limit.

/// Config for a single invoke.
///
/// **Interaction**: Passed to `CompiledStateGraph::invoke(state, config)`; `thread_id` selects the
/// checkpoint slot written at END.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunnableConfig {
    /// Conversation id. Required for the final state to be saved.
    pub thread_id: Option<String>,
    /// Maximum node steps for this run; `None` uses `DEFAULT_RECURSION_LIMIT`.
    pub recursion_limit: Option<usize>,
}

impl RunnableConfig {
    pub fn for_thread(thread_id: impl Into<String>) -> Self {
        Self {
            thread_id: Some(thread_id.into()),
            recursion_limit: None,
        }
    }

    pub fn with_recursion_limit(mut self, limit: usize) -> Self {
        self.recursion_limit = Some(limit);
        self
    }
}
