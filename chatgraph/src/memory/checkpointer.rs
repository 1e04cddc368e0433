//! Checkpointer trait and error type.

use async_trait::async_trait;
use thiserror::Error;

use super::Checkpoint;

/// Error from a checkpoint store.
#[derive(Debug, Error)]
pub enum CheckpointError {
    /// Thread id was empty.
    #[error("thread_id is required")]
    ThreadIdRequired,
    /// State could not be encoded or decoded.
    #[error("serialization: {0}")]
    Serialization(String),
    /// The backing store failed (I/O, SQL, lock poisoned).
    #[error("storage: {0}")]
    Storage(String),
}

/// Saves and loads the latest checkpoint per thread.
///
/// `save` overwrites whatever is stored for the thread, so saving the same state twice leaves the
/// store equivalent to saving it once. `list_thread_ids` is sorted.
///
/// **Interaction**: Used by `CompiledStateGraph` (save at END) and `ChatRunner` (load before a
/// turn, thread listing).
#[async_trait]
pub trait Checkpointer<S>: Send + Sync {
    async fn save(&self, thread_id: &str, checkpoint: &Checkpoint<S>) -> Result<(), CheckpointError>;

    async fn load(&self, thread_id: &str) -> Result<Option<Checkpoint<S>>, CheckpointError>;

    async fn list_thread_ids(&self) -> Result<Vec<String>, CheckpointError>;
}
