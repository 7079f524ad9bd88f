pub mod adapter;
pub mod error;
pub mod migrations;
pub mod models;
pub mod queries;
pub mod watch;

use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;
use tracing::info;

pub use adapter::DocumentStore;
pub use error::StoreError;
pub use watch::{Delivery, Watch, WatchId};

use crate::watch::WatchRegistry;

/// SQLite-backed document store.
///
/// Documents are JSON bodies keyed by path. Every mutation runs under the
/// connection lock and notifies overlapping watches before the lock is
/// released, so each watch sees snapshots in mutation order.
pub struct Database {
    conn: Mutex<Connection>,
    watches: WatchRegistry,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;

        // WAL mode for concurrent readers from other processes
        conn.pragma_update(None, "journal_mode", "WAL")?;

        migrations::run(&conn)?;

        info!("Document store opened at {}", path.display());
        Ok(Self::with_connection(conn))
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        migrations::run(&conn)?;
        Ok(Self::with_connection(conn))
    }

    fn with_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
            watches: WatchRegistry::new(),
        }
    }

    pub fn with_conn<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Connection) -> Result<T, StoreError>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| StoreError::Unavailable(format!("store lock poisoned: {}", e)))?;
        f(&conn)
    }

    /// Number of live watches.
    pub fn watch_count(&self) -> usize {
        self.watches.len()
    }

    /// Push a fresh snapshot to every watch whose path overlaps `changed`.
    /// Must be called with the connection lock held.
    fn notify(&self, conn: &Connection, changed: &str) {
        for (id, path) in self.watches.affected(changed) {
            let snapshot = queries::read(conn, &path);
            self.watches.deliver(id, snapshot);
        }
    }
}
