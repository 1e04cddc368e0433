//! Chat runner: one user turn from loading the thread to saving it.
//!
//! Builds the chat graph once; each turn loads the latest checkpoint for the thread (or starts a
//! fresh conversation), appends the user message, runs the graph and saves the final state.
//! The checkpoint is written only after the graph finished, so a failed or cancelled turn leaves
//! the stored conversation as it was.

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::AgentError;
use crate::graph::{CompilationError, CompiledStateGraph, Router, StateGraph, END, START};
use crate::llm::LlmClient;
use crate::memory::{Checkpoint, CheckpointError, Checkpointer, RunnableConfig};
use crate::message::Message;
use crate::state::{ChatState, TurnScratch};
use crate::stream::{StreamEvent, StreamMode};
use crate::tools::ToolRegistry;

use super::route_node::{route_after_chat, ROUTE_END, ROUTE_TOOL};
use super::{
    ChatNode, RouteNode, ToolCallMode, ToolNode, DEFAULT_MAX_TOOL_HOPS, NODE_CHAT,
    NODE_INVOKE_TOOL, NODE_ROUTE,
};

/// Runner settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRunnerConfig {
    pub mode: ToolCallMode,
    /// Tool dispatches allowed per user turn.
    pub max_tool_hops: usize,
    /// Extra system instructions, sent on every model call and never stored.
    pub system_prompt: Option<String>,
    /// Graph step limit; `None` derives one from `max_tool_hops`.
    pub recursion_limit: Option<usize>,
}

impl Default for ChatRunnerConfig {
    fn default() -> Self {
        Self {
            mode: ToolCallMode::Native,
            max_tool_hops: DEFAULT_MAX_TOOL_HOPS,
            system_prompt: None,
            recursion_limit: None,
        }
    }
}

impl ChatRunnerConfig {
    /// Steps a turn needs at most: chat + route, then route, invoke_tool and chat per hop,
    /// plus the final route.
    fn effective_recursion_limit(&self) -> usize {
        let needed = 3 * self.max_tool_hops + 3;
        self.recursion_limit.map_or(needed, |l| l.max(needed))
    }
}

/// Result of one completed turn.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// Content of the final assistant message.
    pub answer: String,
    /// Conversation after the turn, as saved.
    pub state: ChatState,
}

/// Error type for runner operations.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("compilation failed: {0}")]
    Compilation(#[from] CompilationError),
    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),
    #[error("execution failed: {0}")]
    Execution(#[from] AgentError),
    #[error("turn cancelled")]
    Cancelled,
    /// A stream error whose event was still shared when the turn ended.
    #[error("stream failed: {0}")]
    Stream(Arc<AgentError>),
    #[error("stream ended without final state")]
    StreamEndedWithoutState,
}

impl RunError {
    /// Readable message for the end user.
    pub fn user_message(&self) -> String {
        match self {
            RunError::Execution(e) => agent_message(e),
            RunError::Stream(e) => agent_message(e),
            RunError::Cancelled => "The request was cancelled.".to_string(),
            RunError::Checkpoint(_) => {
                "The conversation could not be loaded or saved.".to_string()
            }
            other => format!("Something went wrong: {}", other),
        }
    }
}

fn agent_message(e: &AgentError) -> String {
    match e {
        AgentError::ModelUnavailable(_) => {
            "The language model is unavailable right now. Please try again later.".to_string()
        }
        AgentError::RecursionLimit(_) => "The request took too many steps and was stopped.".to_string(),
        AgentError::Checkpoint(_) => "The conversation could not be loaded or saved.".to_string(),
        other => format!("Something went wrong: {}", other),
    }
}

impl From<Arc<AgentError>> for RunError {
    fn from(e: Arc<AgentError>) -> Self {
        match Arc::try_unwrap(e) {
            Ok(e) => RunError::Execution(e),
            Err(shared) => RunError::Stream(shared),
        }
    }
}

/// Exclusive hold on one thread's turn lock.
///
/// On drop the guard is released and the map entry removed unless another turn holds or waits
/// on the same lock.
struct ThreadTurn<'a> {
    locks: &'a DashMap<String, Arc<Mutex<()>>>,
    thread_id: &'a str,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for ThreadTurn<'_> {
    fn drop(&mut self) {
        self.guard.take();
        self.locks
            .remove_if(self.thread_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

/// Builds `START → chat → route`, `route -(tool)-> invoke_tool → chat`, `route -(end)-> END`.
pub fn build_chat_graph(
    llm: Arc<dyn LlmClient>,
    registry: Arc<ToolRegistry>,
    config: &ChatRunnerConfig,
) -> Result<CompiledStateGraph<ChatState>, CompilationError> {
    let chat = ChatNode::new(llm, Arc::clone(&registry), config.mode)
        .with_system_prompt(config.system_prompt.clone());
    let router: Router<ChatState> = Arc::new(route_after_chat);

    let mut graph = StateGraph::<ChatState>::new();
    graph
        .add_node(NODE_CHAT, Arc::new(chat))
        .add_node(NODE_ROUTE, Arc::new(RouteNode::new(config.max_tool_hops)))
        .add_node(NODE_INVOKE_TOOL, Arc::new(ToolNode::new(registry)))
        .add_edge(START, NODE_CHAT)
        .add_edge(NODE_CHAT, NODE_ROUTE)
        .add_conditional_edges(
            NODE_ROUTE,
            router,
            [(ROUTE_TOOL, NODE_INVOKE_TOOL), (ROUTE_END, END)],
        )
        .add_edge(NODE_INVOKE_TOOL, NODE_CHAT);
    graph.compile()
}

/// Runs user turns against checkpointed conversations.
///
/// Turns on the same thread id are serialized; turns on different thread ids run independently.
///
/// # Example
///
/// ```ignore
/// let runner = ChatRunner::new(llm, registry, checkpointer, ChatRunnerConfig::default())?;
/// let outcome = runner.run_turn("t1", "What is 132354 mod 23?").await?;
/// println!("{}", outcome.answer);
/// ```
pub struct ChatRunner {
    graph: Arc<CompiledStateGraph<ChatState>>,
    checkpointer: Arc<dyn Checkpointer<ChatState>>,
    config: ChatRunnerConfig,
    thread_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl ChatRunner {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        registry: Arc<ToolRegistry>,
        checkpointer: Arc<dyn Checkpointer<ChatState>>,
        config: ChatRunnerConfig,
    ) -> Result<Self, CompilationError> {
        let graph = build_chat_graph(llm, registry, &config)?;
        Ok(Self {
            graph: Arc::new(graph),
            checkpointer,
            config,
            thread_locks: DashMap::new(),
        })
    }

    pub fn config(&self) -> &ChatRunnerConfig {
        &self.config
    }

    fn thread_lock(&self, thread_id: &str) -> Arc<Mutex<()>> {
        Arc::clone(self.thread_locks.entry(thread_id.to_string()).or_default().value())
    }

    /// Waits for the thread's turn lock, or returns `Cancelled` first.
    async fn lock_thread<'a>(
        &'a self,
        thread_id: &'a str,
        cancel: &CancellationToken,
    ) -> Result<ThreadTurn<'a>, RunError> {
        let mut turn = ThreadTurn {
            locks: &self.thread_locks,
            thread_id,
            guard: None,
        };
        let lock = self.thread_lock(thread_id);
        turn.guard = Some(tokio::select! {
            guard = lock.lock_owned() => guard,
            _ = cancel.cancelled() => return Err(RunError::Cancelled),
        });
        Ok(turn)
    }

    fn runnable_config(&self, thread_id: &str) -> RunnableConfig {
        RunnableConfig::for_thread(thread_id)
            .with_recursion_limit(self.config.effective_recursion_limit())
    }

    /// Latest saved conversation plus the new user message, with fresh turn scratch.
    async fn begin_turn(&self, thread_id: &str, text: &str) -> Result<ChatState, RunError> {
        if thread_id.is_empty() {
            return Err(CheckpointError::ThreadIdRequired.into());
        }
        let mut state = match self.checkpointer.load(thread_id).await? {
            Some(cp) => cp.state,
            None => {
                debug!(thread_id, "starting new conversation");
                ChatState::new(thread_id)
            }
        };
        state.turn = TurnScratch::default();
        state.push(Message::user(text));
        Ok(state)
    }

    async fn commit(&self, thread_id: &str, state: ChatState) -> Result<TurnOutcome, RunError> {
        let step = state.messages().len() as u64;
        self.checkpointer
            .save(thread_id, &Checkpoint::from_state(state.clone(), step))
            .await?;
        let answer = state.final_answer().unwrap_or_default().to_string();
        info!(thread_id, hops = state.turn.hops, "turn complete");
        Ok(TurnOutcome { answer, state })
    }

    /// Runs one turn and saves the resulting conversation.
    pub async fn run_turn(&self, thread_id: &str, text: &str) -> Result<TurnOutcome, RunError> {
        self.run_turn_with_cancel(thread_id, text, &CancellationToken::new())
            .await
    }

    /// Like [`run_turn`](Self::run_turn); cancelling `cancel` drops the in-flight model or tool
    /// call and returns [`RunError::Cancelled`] with nothing saved.
    pub async fn run_turn_with_cancel(
        &self,
        thread_id: &str,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<TurnOutcome, RunError> {
        let _turn = self.lock_thread(thread_id, cancel).await?;

        let state = self.begin_turn(thread_id, text).await?;
        let config = self.runnable_config(thread_id);
        let final_state = tokio::select! {
            result = self.graph.invoke(state, Some(config)) => result?,
            _ = cancel.cancelled() => {
                info!(thread_id, "turn cancelled");
                return Err(RunError::Cancelled);
            }
        };
        self.commit(thread_id, final_state).await
    }

    /// Runs one turn, passing every graph event to `on_event` before saving.
    pub async fn stream_turn<F>(
        &self,
        thread_id: &str,
        text: &str,
        on_event: F,
    ) -> Result<TurnOutcome, RunError>
    where
        F: FnMut(&StreamEvent<ChatState>),
    {
        self.stream_turn_with_cancel(thread_id, text, &CancellationToken::new(), on_event)
            .await
    }

    /// Like [`stream_turn`](Self::stream_turn); cancelling `cancel` aborts the graph run,
    /// including the in-flight model or tool call, and saves nothing.
    pub async fn stream_turn_with_cancel<F>(
        &self,
        thread_id: &str,
        text: &str,
        cancel: &CancellationToken,
        mut on_event: F,
    ) -> Result<TurnOutcome, RunError>
    where
        F: FnMut(&StreamEvent<ChatState>),
    {
        let _turn = self.lock_thread(thread_id, cancel).await?;

        let state = self.begin_turn(thread_id, text).await?;
        let modes = HashSet::from([StreamMode::Values, StreamMode::Updates]);
        let mut stream = self
            .graph
            .stream(state, Some(self.runnable_config(thread_id)), modes);

        let mut last = None;
        loop {
            let event = tokio::select! {
                event = stream.next() => event,
                _ = cancel.cancelled() => {
                    info!(thread_id, "turn cancelled");
                    return Err(RunError::Cancelled);
                }
            };
            let Some(event) = event else {
                break;
            };
            on_event(&event);
            match event {
                StreamEvent::Values(s) => last = Some(s),
                StreamEvent::Error(e) => return Err(e.into()),
                StreamEvent::Updates { .. } => {}
            }
        }
        let final_state = last.ok_or(RunError::StreamEndedWithoutState)?;
        self.commit(thread_id, final_state).await
    }

    /// Thread ids with a saved conversation, sorted.
    pub async fn list_threads(&self) -> Result<Vec<String>, RunError> {
        Ok(self.checkpointer.list_thread_ids().await?)
    }

    /// Saved transcript of a thread; empty when the thread is unknown.
    pub async fn history(&self, thread_id: &str) -> Result<Vec<Message>, RunError> {
        Ok(self
            .checkpointer
            .load(thread_id)
            .await?
            .map(|cp| cp.state.messages().to_vec())
            .unwrap_or_default())
    }
}
