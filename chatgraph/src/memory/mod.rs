//! # Memory: Checkpointing
//!
//! Per-thread state snapshots so a conversation can be resumed after a restart.
//!
//! ## Config
//!
//! [`RunnableConfig`] is passed to `CompiledStateGraph::invoke`. When `thread_id` is set and the
//! graph was compiled with a checkpointer, the final state is saved at END.
//!
//! ## Checkpointer Implementations
//!
//! | Type             | Persistence | Use case               | Feature  |
//! |------------------|-------------|------------------------|----------|
//! | [`MemorySaver`]  | In-memory   | Dev, tests             | none     |
//! | [`SqliteSaver`]  | SQLite file | Single node, CLI       | `sqlite` |
//!
//! [`JsonSerializer`] is used by `SqliteSaver` (state must be `Serialize + DeserializeOwned`).

mod checkpoint;
mod checkpointer;
mod config;
mod memory_saver;
mod serializer;

#[cfg(feature = "sqlite")]
mod sqlite_saver;

pub use checkpoint::Checkpoint;
pub use checkpointer::{CheckpointError, Checkpointer};
pub use config::RunnableConfig;
pub use memory_saver::MemorySaver;
pub use serializer::{JsonSerializer, Serializer};

#[cfg(feature = "sqlite")]
pub use sqlite_saver::SqliteSaver;
