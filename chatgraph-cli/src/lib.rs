//! chatgraph-cli library: env config and terminal sessions for the chatgraph agent.
//!
//! Reads config from env / `.env`, builds the tool registry, checkpointer and remote tool
//! servers, then runs one turn, an interactive loop, or lists saved threads.
//!
//! ## Usage
//!
//! ```rust,no_run,ignore
//! let mut config = chatgraph_cli::RunConfig::from_env()?;
//! config.apply_options(&chatgraph_cli::RunOptions { thread_id: Some("t1".into()), ..Default::default() });
//! chatgraph_cli::run(config, chatgraph_cli::Action::Message("What is 132354 mod 23?".into())).await?;
//! ```

mod config;
mod run;

pub use chatgraph::{Message, ToolCallMode};
pub use config::{Error, RunConfig, RunOptions, DEFAULT_DB_PATH, DEFAULT_THREAD_ID};
pub use run::{
    build_llm, build_runner, chat_interruptible, chat_once, describe_error, print_history, print_threads,
    repl, run, Action,
};

#[cfg(test)]
mod tests;
