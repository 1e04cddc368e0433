//! SQLite-backed checkpointer (feature `sqlite`).
//!
//! One row per thread; `save` upserts by primary key so repeated saves are idempotent.
//! Blocking rusqlite calls run on `spawn_blocking`.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};

use super::{Checkpoint, CheckpointError, Checkpointer, Serializer};

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS checkpoints (
    thread_id     TEXT PRIMARY KEY,
    checkpoint_id TEXT NOT NULL,
    ts            TEXT NOT NULL,
    step          INTEGER NOT NULL,
    payload       BLOB NOT NULL
)";

fn storage<E: std::fmt::Display>(e: E) -> CheckpointError {
    CheckpointError::Storage(e.to_string())
}

/// Persistent checkpointer storing the latest checkpoint of each thread in a SQLite file.
///
/// **Interaction**: Built by `build_agent_context` when `db_path` is set; shared across threads of
/// conversation behind one connection.
pub struct SqliteSaver<S> {
    conn: Arc<Mutex<Connection>>,
    serializer: Arc<dyn Serializer<S>>,
}

impl<S> SqliteSaver<S>
where
    S: Clone + Send + Sync + 'static,
{
    /// Opens (or creates) the database at `path` and ensures the table exists.
    pub fn new(
        path: impl AsRef<Path>,
        serializer: Arc<dyn Serializer<S>>,
    ) -> Result<Self, CheckpointError> {
        let conn = Connection::open(path).map_err(storage)?;
        Self::with_connection(conn, serializer)
    }

    /// In-memory database, for tests.
    pub fn in_memory(serializer: Arc<dyn Serializer<S>>) -> Result<Self, CheckpointError> {
        let conn = Connection::open_in_memory().map_err(storage)?;
        Self::with_connection(conn, serializer)
    }

    fn with_connection(
        conn: Connection,
        serializer: Arc<dyn Serializer<S>>,
    ) -> Result<Self, CheckpointError> {
        conn.execute(CREATE_TABLE, []).map_err(storage)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            serializer,
        })
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T, CheckpointError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, CheckpointError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock().map_err(storage)?;
            f(&guard)
        })
        .await
        .map_err(storage)?
    }
}

#[async_trait]
impl<S> Checkpointer<S> for SqliteSaver<S>
where
    S: Clone + Send + Sync + 'static,
{
    async fn save(&self, thread_id: &str, checkpoint: &Checkpoint<S>) -> Result<(), CheckpointError> {
        if thread_id.is_empty() {
            return Err(CheckpointError::ThreadIdRequired);
        }
        let payload = self.serializer.serialize(&checkpoint.state)?;
        let thread_id = thread_id.to_string();
        let id = checkpoint.id.clone();
        let ts = checkpoint.ts.clone();
        let step = checkpoint.step as i64;
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO checkpoints (thread_id, checkpoint_id, ts, step, payload)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(thread_id) DO UPDATE SET
                    checkpoint_id = excluded.checkpoint_id,
                    ts = excluded.ts,
                    step = excluded.step,
                    payload = excluded.payload",
                params![thread_id, id, ts, step, payload],
            )
            .map_err(storage)?;
            Ok(())
        })
        .await
    }

    async fn load(&self, thread_id: &str) -> Result<Option<Checkpoint<S>>, CheckpointError> {
        let thread_id = thread_id.to_string();
        let row = self
            .with_conn(move |conn| {
                conn.query_row(
                    "SELECT checkpoint_id, ts, step, payload FROM checkpoints WHERE thread_id = ?1",
                    params![thread_id],
                    |r| {
                        Ok((
                            r.get::<_, String>(0)?,
                            r.get::<_, String>(1)?,
                            r.get::<_, i64>(2)?,
                            r.get::<_, Vec<u8>>(3)?,
                        ))
                    },
                )
                .optional()
                .map_err(storage)
            })
            .await?;

        match row {
            None => Ok(None),
            Some((id, ts, step, payload)) => Ok(Some(Checkpoint {
                id,
                ts,
                state: self.serializer.deserialize(&payload)?,
                step: step as u64,
            })),
        }
    }

    async fn list_thread_ids(&self) -> Result<Vec<String>, CheckpointError> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT thread_id FROM checkpoints ORDER BY thread_id")
                .map_err(storage)?;
            let ids = stmt
                .query_map([], |r| r.get::<_, String>(0))
                .map_err(storage)?
                .collect::<Result<Vec<_>, _>>()
                .map_err(storage)?;
            Ok(ids)
        })
        .await
    }
}
