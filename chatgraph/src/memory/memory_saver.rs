//! In-memory checkpointer backed by a sharded concurrent map.

use async_trait::async_trait;
use dashmap::DashMap;

use super::{Checkpoint, CheckpointError, Checkpointer};

/// In-memory checkpointer: one latest checkpoint per thread id.
///
/// Writes to different threads never contend on a global lock. Contents are lost on drop.
pub struct MemorySaver<S> {
    inner: DashMap<String, Checkpoint<S>>,
}

impl<S> Default for MemorySaver<S> {
    fn default() -> Self {
        Self {
            inner: DashMap::new(),
        }
    }
}

impl<S> MemorySaver<S> {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl<S> Checkpointer<S> for MemorySaver<S>
where
    S: Clone + Send + Sync + 'static,
{
    async fn save(&self, thread_id: &str, checkpoint: &Checkpoint<S>) -> Result<(), CheckpointError> {
        if thread_id.is_empty() {
            return Err(CheckpointError::ThreadIdRequired);
        }
        self.inner.insert(thread_id.to_string(), checkpoint.clone());
        Ok(())
    }

    async fn load(&self, thread_id: &str) -> Result<Option<Checkpoint<S>>, CheckpointError> {
        Ok(self.inner.get(thread_id).map(|e| e.value().clone()))
    }

    async fn list_thread_ids(&self) -> Result<Vec<String>, CheckpointError> {
        let mut ids: Vec<String> = self.inner.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;
    use crate::state::ChatState;

    fn sample_state() -> ChatState {
        let mut s = ChatState::new("t1");
        s.push(Message::user("What is 2+2?"));
        s.push(Message::assistant("4"));
        s
    }

    /// **Scenario**: Save then load for thread t1 returns the same ordered messages.
    #[tokio::test]
    async fn save_then_load_round_trip() {
        let saver = MemorySaver::new();
        let cp = Checkpoint::from_state(sample_state(), 2);
        saver.save("t1", &cp).await.unwrap();
        let loaded = saver.load("t1").await.unwrap().expect("saved");
        assert_eq!(loaded.state.messages(), cp.state.messages());
        assert!(saver.load("other").await.unwrap().is_none());
    }

    /// **Scenario**: Saving the same checkpoint twice is equivalent to saving it once.
    #[tokio::test]
    async fn save_twice_is_idempotent() {
        let saver = MemorySaver::new();
        let cp = Checkpoint::from_state(sample_state(), 2);
        saver.save("t1", &cp).await.unwrap();
        saver.save("t1", &cp).await.unwrap();
        assert_eq!(saver.list_thread_ids().await.unwrap(), vec!["t1".to_string()]);
        assert_eq!(saver.load("t1").await.unwrap(), Some(cp));
    }

    /// **Scenario**: list_thread_ids is sorted; empty thread id is rejected.
    #[tokio::test]
    async fn list_sorted_and_empty_id_rejected() {
        let saver = MemorySaver::new();
        for id in ["b", "a", "c"] {
            saver
                .save(id, &Checkpoint::from_state(ChatState::new(id), 1))
                .await
                .unwrap();
        }
        assert_eq!(saver.list_thread_ids().await.unwrap(), vec!["a", "b", "c"]);
        let err = saver
            .save("", &Checkpoint::from_state(ChatState::new(""), 1))
            .await
            .unwrap_err();
        assert!(matches!(err, CheckpointError::ThreadIdRequired));
    }
}
