use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc;
use tracing::{debug, warn};

use plaza_types::Snapshot;

use crate::StoreError;
use crate::queries::overlaps;

/// One delivery on a watch: the new snapshot, or the error hit reading it.
pub type Delivery = Result<Snapshot, StoreError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchId(pub u64);

/// A live subscription to one path. The current snapshot is queued as soon
/// as the watch is created; afterwards one snapshot per overlapping mutation.
/// The channel closes once the watch is unsubscribed.
pub struct Watch {
    pub id: WatchId,
    pub rx: mpsc::UnboundedReceiver<Delivery>,
}

struct Watcher {
    path: String,
    tx: mpsc::UnboundedSender<Delivery>,
}

/// Registry of open watches: watch id -> (path, sender).
pub(crate) struct WatchRegistry {
    next_id: AtomicU64,
    watchers: Mutex<HashMap<WatchId, Watcher>>,
}

impl WatchRegistry {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            watchers: Mutex::new(HashMap::new()),
        }
    }

    /// Register a watch on `path` and queue its first delivery.
    pub fn register(&self, path: &str, initial: Delivery) -> Watch {
        let id = WatchId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(initial);

        self.lock().insert(
            id,
            Watcher {
                path: path.to_string(),
                tx,
            },
        );
        debug!(watch = id.0, path, "watch registered");
        Watch { id, rx }
    }

    /// Drop a watch. Returns false if it was already gone.
    pub fn unregister(&self, id: WatchId) -> bool {
        let removed = self.lock().remove(&id).is_some();
        if removed {
            debug!(watch = id.0, "watch removed");
        }
        removed
    }

    /// Watches that can observe a change at `changed`, with their paths.
    pub fn affected(&self, changed: &str) -> Vec<(WatchId, String)> {
        self.lock()
            .iter()
            .filter(|(_, w)| overlaps(&w.path, changed))
            .map(|(id, w)| (*id, w.path.clone()))
            .collect()
    }

    /// Send to one watch, pruning it if its receiver is gone.
    pub fn deliver(&self, id: WatchId, delivery: Delivery) {
        let mut watchers = self.lock();
        let closed = match watchers.get(&id) {
            Some(w) => w.tx.send(delivery).is_err(),
            None => false,
        };
        if closed {
            watchers.remove(&id);
            debug!(watch = id.0, "watch receiver dropped, pruned");
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<WatchId, Watcher>> {
        // Map operations are single calls; a poisoned map is still consistent.
        self.watchers.lock().unwrap_or_else(|poisoned| {
            warn!("watch registry lock poisoned, recovering");
            poisoned.into_inner()
        })
    }
}
