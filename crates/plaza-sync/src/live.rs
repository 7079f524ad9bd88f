use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::{debug, trace, warn};

use plaza_store::{Delivery, DocumentStore, StoreError};
use plaza_types::Snapshot;

use crate::collection::{Collection, derive};
use crate::slot::{Generation, Slot, SlotState};

/// A published list. Consumers get a shared, immutable copy.
pub type Published<T> = Arc<Vec<T>>;

/// A store collection kept in sync with a derived, ordered list.
///
/// Holds at most one watch. Subscribing again tears the previous watch down
/// first, and anything the old watch was still deriving is never published.
/// Dropping the collection unsubscribes.
pub struct LiveCollection<C: Collection> {
    store: Arc<dyn DocumentStore>,
    slot: Arc<Slot>,
    feed: Arc<watch::Sender<Published<C::Item>>>,
}

impl<C: Collection> LiveCollection<C> {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        let (feed, _) = watch::channel(Arc::new(Vec::new()));
        Self {
            store,
            slot: Arc::new(Slot::new()),
            feed: Arc::new(feed),
        }
    }

    /// Start following `collection`, replacing any current subscription.
    ///
    /// The published list resets to empty and is refilled from the store's
    /// initial snapshot. If the store refuses the watch the collection is
    /// left unsubscribed.
    pub async fn subscribe(&mut self, collection: C) -> Result<(), StoreError> {
        self.unsubscribe();

        let path = collection.path();
        let token = self.slot.begin(&path);
        self.feed.send_replace(Arc::new(Vec::new()));

        let watch = match self.store.subscribe(&path).await {
            Ok(watch) => watch,
            Err(e) => {
                self.slot.abandon(token);
                warn!(%path, "subscribe failed: {}", e);
                return Err(e);
            }
        };

        let id = watch.id;
        tokio::spawn(pump(
            Arc::new(collection),
            watch.rx,
            self.slot.clone(),
            token,
            self.feed.clone(),
        ));
        self.slot.activate(token, id);

        debug!(%path, watch = id.0, "live collection subscribed");
        Ok(())
    }

    /// Stop following. Safe to call any number of times.
    pub fn unsubscribe(&mut self) {
        let path = self.slot.path();
        if let Some(id) = self.slot.release() {
            self.store.unsubscribe(id);
            debug!(path = ?path, watch = id.0, "live collection unsubscribed");
        }
    }

    /// Receiver for every list this collection publishes.
    pub fn watch(&self) -> watch::Receiver<Published<C::Item>> {
        self.feed.subscribe()
    }

    pub fn current(&self) -> Published<C::Item> {
        self.feed.borrow().clone()
    }

    pub fn state(&self) -> SlotState {
        self.slot.state()
    }

    pub fn path(&self) -> Option<String> {
        self.slot.path()
    }
}

impl<C: Collection> Drop for LiveCollection<C> {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

// -- Pump --

/// Drain one watch: derive each snapshot and publish it while `token` is
/// still the slot's generation. Ends when the watch channel closes or the
/// subscription has been replaced.
async fn pump<C: Collection>(
    collection: Arc<C>,
    mut rx: mpsc::UnboundedReceiver<Delivery>,
    slot: Arc<Slot>,
    token: Generation,
    feed: Arc<watch::Sender<Published<C::Item>>>,
) {
    let path = collection.path();

    while let Some(delivery) = rx.recv().await {
        // Each snapshot is the whole collection; only the newest good one matters.
        let mut latest = keep_good(&path, delivery, None);
        while let Ok(next) = rx.try_recv() {
            latest = keep_good(&path, next, latest);
        }

        if !slot.is_current(token) {
            break;
        }

        let Some(snapshot) = latest else {
            continue;
        };

        let items = derive(collection.as_ref(), snapshot).await;
        let count = items.len();

        let published = slot.publish_if_current(token, || {
            feed.send_replace(Arc::new(items));
        });
        if !published {
            trace!(%path, "subscription replaced while deriving, result discarded");
            break;
        }
        trace!(%path, count, "published");
    }

    trace!(%path, "pump finished");
}

/// Fold one delivery into the newest good snapshot seen so far. Errors are
/// logged and leave `latest` as it was.
fn keep_good(path: &str, delivery: Delivery, latest: Option<Snapshot>) -> Option<Snapshot> {
    match delivery {
        Ok(snapshot) => Some(snapshot),
        Err(e) => {
            warn!(path, "watch delivered an error, keeping last list: {}", e);
            latest
        }
    }
}
