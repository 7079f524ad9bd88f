use std::cmp::Ordering;

use async_trait::async_trait;
use futures_util::future::join_all;
use serde::de::DeserializeOwned;
use tracing::warn;

use plaza_store::StoreError;
use plaza_types::Snapshot;

/// Why one record was left out of a published list. Never fatal to the list.
#[derive(Debug, thiserror::Error)]
pub enum EnrichError {
    #[error("{0} no longer exists")]
    Missing(String),

    #[error("undecodable record: {0}")]
    Decode(#[from] serde_json::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// One synchronized collection: where it lives, which records belong, how
/// each record is joined against other entities, and how the result sorts.
#[async_trait]
pub trait Collection: Send + Sync + 'static {
    /// Record as stored under the collection path.
    type Raw: DeserializeOwned + Send;

    /// Record as published.
    type Item: Clone + Send + Sync + 'static;

    fn path(&self) -> String;

    fn accepts(&self, _key: &str, _raw: &Self::Raw) -> bool {
        true
    }

    /// Join one record against secondary entities. May read the store.
    async fn enrich(&self, key: String, raw: Self::Raw) -> Result<Self::Item, EnrichError>;

    fn order(&self, a: &Self::Item, b: &Self::Item) -> Ordering;
}

/// Turn a collection snapshot into the list to publish: decode, filter,
/// enrich every survivor concurrently, then sort.
///
/// Records that fail to decode or enrich are logged and dropped; the rest of
/// the list is unaffected.
pub async fn derive<C: Collection>(collection: &C, snapshot: Snapshot) -> Vec<C::Item> {
    let path = collection.path();

    let candidates: Vec<(String, C::Raw)> = snapshot
        .into_children()
        .into_iter()
        .filter_map(|(key, value)| match serde_json::from_value::<C::Raw>(value) {
            Ok(raw) => Some((key, raw)),
            Err(e) => {
                warn!(collection = %path, %key, "dropping undecodable record: {}", e);
                None
            }
        })
        .filter(|(key, raw)| collection.accepts(key, raw))
        .collect();

    // Lookups run side by side; results come back in candidate order.
    let enriched = join_all(candidates.into_iter().map(|(key, raw)| async move {
        let result = collection.enrich(key.clone(), raw).await;
        (key, result)
    }))
    .await;

    let mut items = Vec::with_capacity(enriched.len());
    for (key, result) in enriched {
        match result {
            Ok(item) => items.push(item),
            Err(e) => warn!(collection = %path, %key, "dropping record: {}", e),
        }
    }

    items.sort_by(|a, b| collection.order(a, b));
    items
}
