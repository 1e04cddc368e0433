//! Checkpoint: one saved state snapshot for a thread.

use std::time::SystemTime;

/// One checkpoint: state snapshot plus id, timestamp and the number of graph steps that produced it.
///
/// **Interaction**: Produced by `CompiledStateGraph` at END; consumed by `Checkpointer::save`,
/// returned by `Checkpointer::load`.
#[derive(Debug, Clone, PartialEq)]
pub struct Checkpoint<S> {
    pub id: String,
    /// Milliseconds since the Unix epoch, as a string.
    pub ts: String,
    pub state: S,
    pub step: u64,
}

impl<S> Checkpoint<S> {
    /// Creates a checkpoint from the current state. Uses current time for id/ts.
    pub fn from_state(state: S, step: u64) -> Self {
        let ts = format!(
            "{}",
            SystemTime::now()
                .duration_since(SystemTime::UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or(0)
        );
        Self {
            id: format!("{}-{}", ts, step),
            ts,
            state,
            step,
        }
    }
}
