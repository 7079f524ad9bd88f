use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::debug;

use plaza_types::Snapshot;

use crate::queries;
use crate::watch::{Watch, WatchId};
use crate::{Database, StoreError};

/// The hosted document store as the client sees it: point reads and writes,
/// generated-key appends, and whole-subtree watches.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn read(&self, path: &str) -> Result<Snapshot, StoreError>;

    /// Replace the value at `path`. Writing `null` removes it.
    async fn write(&self, path: &str, value: Value) -> Result<(), StoreError>;

    /// Merge several fields of the record at `path` as one mutation.
    async fn update(&self, path: &str, fields: Map<String, Value>) -> Result<(), StoreError>;

    /// Write only if nothing exists at `path`. Returns whether it wrote.
    async fn write_if_absent(&self, path: &str, value: Value) -> Result<bool, StoreError>;

    /// Store `value` under a generated child key of `path` and return the key.
    /// Keys increase monotonically across appends.
    async fn append(&self, path: &str, value: Value) -> Result<String, StoreError>;

    async fn remove(&self, path: &str) -> Result<(), StoreError>;

    async fn subscribe(&self, path: &str) -> Result<Watch, StoreError>;

    /// Close a watch. Unknown or already-closed ids are ignored.
    fn unsubscribe(&self, id: WatchId);
}

impl Database {
    /// Run a mutation in a transaction, then notify watches overlapping `path`.
    fn mutate<F, T>(&self, path: &str, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&rusqlite::Connection) -> Result<T, StoreError>,
    {
        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            let out = f(&tx)?;
            tx.commit()?;
            self.notify(conn, path);
            Ok(out)
        })
    }
}

#[async_trait]
impl DocumentStore for Database {
    async fn read(&self, path: &str) -> Result<Snapshot, StoreError> {
        self.with_conn(|conn| queries::read(conn, path))
    }

    async fn write(&self, path: &str, value: Value) -> Result<(), StoreError> {
        self.mutate(path, |conn| queries::put(conn, path, value))
    }

    async fn update(&self, path: &str, fields: Map<String, Value>) -> Result<(), StoreError> {
        self.mutate(path, |conn| queries::update(conn, path, fields))
    }

    async fn write_if_absent(&self, path: &str, value: Value) -> Result<bool, StoreError> {
        let written = self.with_conn(|conn| {
            if queries::read(conn, path)?.exists() {
                return Ok(false);
            }
            let tx = conn.unchecked_transaction()?;
            queries::put(&tx, path, value)?;
            tx.commit()?;
            self.notify(conn, path);
            Ok(true)
        })?;

        if !written {
            debug!(path, "create skipped, document already exists");
        }
        Ok(written)
    }

    async fn append(&self, path: &str, value: Value) -> Result<String, StoreError> {
        queries::segments(path)?;
        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            let key = queries::next_key(&tx)?;
            let child = format!("{}/{}", path, key);
            queries::put(&tx, &child, value)?;
            tx.commit()?;
            self.notify(conn, &child);
            Ok(key)
        })
    }

    async fn remove(&self, path: &str) -> Result<(), StoreError> {
        self.mutate(path, |conn| queries::put(conn, path, Value::Null))
    }

    async fn subscribe(&self, path: &str) -> Result<Watch, StoreError> {
        // Registering under the connection lock means no mutation can land
        // between the initial snapshot and the watch going live.
        self.with_conn(|conn| {
            let initial = queries::read(conn, path)?;
            Ok(self.watches.register(path, Ok(initial)))
        })
    }

    fn unsubscribe(&self, id: WatchId) {
        self.watches.unregister(id);
    }
}
