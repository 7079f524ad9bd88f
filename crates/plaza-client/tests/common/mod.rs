#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::watch;

use plaza_client::{Client, ClientConfig};
use plaza_store::{Database, DocumentStore, StoreError, Watch, WatchId};
use plaza_sync::Published;
use plaza_types::{Snapshot, UserProfile};

pub fn client_over(store: Arc<dyn DocumentStore>) -> Client {
    Client::new(store, ClientConfig::default())
}

pub fn memory_store() -> Arc<Database> {
    Arc::new(Database::open_in_memory().unwrap())
}

pub async fn add_user(client: &Client, uid: &str, display_name: &str, username: &str) {
    client
        .profiles()
        .put(&UserProfile {
            uid: uid.into(),
            display_name: display_name.into(),
            username: username.into(),
            photo_url: String::new(),
        })
        .await
        .unwrap();
}

pub async fn wait_for<T>(
    rx: &mut watch::Receiver<Published<T>>,
    pred: impl Fn(&[T]) -> bool,
) -> Published<T> {
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            {
                let current = rx.borrow_and_update().clone();
                if pred(&current) {
                    return current;
                }
            }
            rx.changed().await.expect("feed closed");
        }
    })
    .await
    .expect("timed out waiting for published list")
}

/// Delegates to an in-memory database, with knobs for tests: yield before
/// every call (to interleave concurrent callers), fail writes, and count
/// reads of one path.
pub struct TestStore {
    pub db: Arc<Database>,
    pub yield_first: bool,
    pub fail_writes: AtomicBool,
    pub counted_path: Option<String>,
    pub counted_reads: AtomicUsize,
}

impl TestStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            db,
            yield_first: false,
            fail_writes: AtomicBool::new(false),
            counted_path: None,
            counted_reads: AtomicUsize::new(0),
        }
    }

    pub fn yielding(db: Arc<Database>) -> Self {
        Self {
            yield_first: true,
            ..Self::new(db)
        }
    }

    pub fn counting(db: Arc<Database>, path: &str) -> Self {
        Self {
            counted_path: Some(path.to_string()),
            ..Self::new(db)
        }
    }

    pub fn reads(&self) -> usize {
        self.counted_reads.load(Ordering::SeqCst)
    }

    async fn before(&self) {
        if self.yield_first {
            tokio::task::yield_now().await;
        }
    }

    fn check_write(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("store offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for TestStore {
    async fn read(&self, path: &str) -> Result<Snapshot, StoreError> {
        self.before().await;
        if self.counted_path.as_deref() == Some(path) {
            self.counted_reads.fetch_add(1, Ordering::SeqCst);
        }
        self.db.read(path).await
    }

    async fn write(&self, path: &str, value: Value) -> Result<(), StoreError> {
        self.before().await;
        self.check_write()?;
        self.db.write(path, value).await
    }

    async fn update(&self, path: &str, fields: Map<String, Value>) -> Result<(), StoreError> {
        self.before().await;
        self.check_write()?;
        self.db.update(path, fields).await
    }

    async fn write_if_absent(&self, path: &str, value: Value) -> Result<bool, StoreError> {
        self.before().await;
        self.check_write()?;
        self.db.write_if_absent(path, value).await
    }

    async fn append(&self, path: &str, value: Value) -> Result<String, StoreError> {
        self.before().await;
        self.check_write()?;
        self.db.append(path, value).await
    }

    async fn remove(&self, path: &str) -> Result<(), StoreError> {
        self.before().await;
        self.check_write()?;
        self.db.remove(path).await
    }

    async fn subscribe(&self, path: &str) -> Result<Watch, StoreError> {
        self.before().await;
        self.db.subscribe(path).await
    }

    fn unsubscribe(&self, id: WatchId) {
        self.db.unsubscribe(id)
    }
}
