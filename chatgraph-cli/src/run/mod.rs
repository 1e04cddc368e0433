//! Build a runner from [`RunConfig`] and drive it from the terminal.
//!
//! [`run`] is the binary's entry point; [`build_runner`] and the [`session`] functions take an
//! explicit model client so tests can drive them with `MockLlm`.

mod llm;
mod session;

use std::sync::Arc;

use chatgraph::{build_chat_runner, AgentContext, ChatRunner, LlmClient};
use tracing::info;

use crate::config::{Error, RunConfig};

pub use llm::build_llm;
pub use session::{chat_interruptible, chat_once, describe_error, print_history, print_threads, repl};

/// What the binary should do once the runner is built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    /// Run one turn with this message and exit.
    Message(String),
    /// Interactive loop on stdin.
    Repl,
    ListThreads,
    History,
}

/// Registry, checkpointer and remote tool servers from `config`, plus a runner using `llm`.
pub async fn build_runner(
    config: &RunConfig,
    llm: Arc<dyn LlmClient>,
) -> Result<(ChatRunner, AgentContext), Error> {
    let (runner, ctx) =
        build_chat_runner(&config.to_agent_build_config(), llm, config.to_runner_config()).await?;
    info!(tools = ?ctx.registry.names(), thread = %config.thread_id, "runner ready");
    Ok((runner, ctx))
}

/// Runs `action` against the model configured in `config`.
pub async fn run(config: RunConfig, action: Action) -> Result<(), Error> {
    if config.verbose {
        eprintln!("{}", config.summary());
    }
    let llm = build_llm(&config)?;
    let (runner, ctx) = build_runner(&config, llm).await?;
    let mut stdout = std::io::stdout();

    let result = match action {
        Action::Message(text) => chat_interruptible(&runner, &config.thread_id, &text, &mut stdout)
            .await
            .map(|_| ()),
        Action::Repl => {
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            repl(&runner, &config.thread_id, stdin, &mut stdout, true).await
        }
        Action::ListThreads => print_threads(&runner, &mut stdout).await,
        Action::History => print_history(&runner, &config.thread_id, &mut stdout).await,
    };
    ctx.shutdown().await;
    result
}
