//! Integration tests for whole chat turns through `ChatRunner`.
//!
//! Split into modules under `agent_turns/`:
//! - `common`: registry and runner helpers
//! - `tool_loop`: chat → tool → chat loops, fail-safe endings and the hop guard
//! - `concurrency`: independent threads and same-thread serialization
//! - `persistence`: SQLite checkpoints across runner instances

#[path = "agent_turns/common.rs"]
mod common;

#[path = "agent_turns/tool_loop.rs"]
mod tool_loop;

#[path = "agent_turns/concurrency.rs"]
mod concurrency;

#[cfg(feature = "sqlite")]
#[path = "agent_turns/persistence.rs"]
mod persistence;
