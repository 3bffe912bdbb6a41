use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use rusqlite::Connection;
use tokio::sync::Semaphore;

use crate::errors::PersistenceError;

const QUERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Bounded access to the SQLite file.
///
/// Every query goes through `execute_with_timeout`, which caps the number of
/// simultaneous connections, runs the closure on the blocking pool and gives
/// up after a hard timeout so a wedged query cannot stall the dispatcher
/// forever.
pub struct DatabasePool {
    path: PathBuf,
    permits: Arc<Semaphore>,
}

impl DatabasePool {
    pub fn new(path: impl Into<PathBuf>, max_connections: usize) -> Self {
        Self {
            path: path.into(),
            permits: Arc::new(Semaphore::new(max_connections)),
        }
    }

    pub async fn execute_with_timeout<T, F>(&self, f: F) -> Result<T, PersistenceError>
    where
        F: FnOnce(&mut Connection) -> rusqlite::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| PersistenceError::Interrupted)?;

        let path = self.path.clone();
        let task = tokio::task::spawn_blocking(move || -> rusqlite::Result<T> {
            let mut conn = Connection::open(&path)?;
            conn.busy_timeout(Duration::from_secs(5))?;
            f(&mut conn)
        });

        match tokio::time::timeout(QUERY_TIMEOUT, task).await {
            Ok(Ok(result)) => result.map_err(PersistenceError::from),
            Ok(Err(_join_error)) => Err(PersistenceError::Interrupted),
            Err(_elapsed) => Err(PersistenceError::Timeout),
        }
    }
}

/// Creates the `channels` table if it does not exist yet. Run once at
/// startup, before the dispatcher starts.
pub fn init_schema(path: &Path) -> Result<(), PersistenceError> {
    let conn = Connection::open(path)?;
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS channels (
            id          INTEGER PRIMARY KEY,
            title       TEXT    NOT NULL DEFAULT '',
            members     INTEGER NOT NULL DEFAULT 0,
            videos_sent INTEGER NOT NULL DEFAULT 0,
            date_added  TEXT    NOT NULL DEFAULT (datetime('now')),
            membership  TEXT    NOT NULL DEFAULT 'unknown',
            chat_type   TEXT    NOT NULL DEFAULT 'unknown',
            invite_link TEXT    NOT NULL DEFAULT ''
        );",
    )?;
    Ok(())
}
