use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::trace;

use plaza_types::{UserId, UserProfile};

use crate::error::Result;
use crate::repos::ProfileRepo;

/// Shortest quiet period between the last keystroke and a lookup.
pub const MIN_SEARCH_DEBOUNCE: Duration = Duration::from_millis(500);

/// Queries shorter than this never reach the store.
pub const MIN_QUERY_CHARS: usize = 2;

/// Users whose display name or username contains `query`, ignoring case.
/// The searching user is never part of the result.
pub async fn search_users(
    profiles: &ProfileRepo,
    viewer: &str,
    query: &str,
) -> Result<Vec<UserProfile>> {
    let needle = query.trim().to_lowercase();
    if needle.chars().count() < MIN_QUERY_CHARS {
        return Ok(Vec::new());
    }

    Ok(profiles
        .all()
        .await?
        .into_iter()
        .filter(|profile| profile.uid != viewer && profile.matches(&needle))
        .collect())
}

#[derive(Debug)]
pub struct SearchOutcome {
    pub query: String,
    pub result: Result<Vec<UserProfile>>,
}

/// Runs `search_users` once input has been quiet for the debounce period.
/// Every new input cancels the pending lookup.
pub struct SearchDebouncer {
    profiles: ProfileRepo,
    viewer: UserId,
    quiet: Duration,
    pending: Option<JoinHandle<()>>,
    tx: mpsc::UnboundedSender<SearchOutcome>,
}

impl SearchDebouncer {
    pub fn new(
        profiles: ProfileRepo,
        viewer: &str,
        quiet: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<SearchOutcome>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let debouncer = Self {
            profiles,
            viewer: viewer.to_string(),
            quiet: quiet.max(MIN_SEARCH_DEBOUNCE),
            pending: None,
            tx,
        };
        (debouncer, rx)
    }

    pub fn input(&mut self, query: &str) {
        self.cancel();

        let query = query.to_string();
        if query.trim().chars().count() < MIN_QUERY_CHARS {
            let _ = self.tx.send(SearchOutcome {
                query,
                result: Ok(Vec::new()),
            });
            return;
        }

        let profiles = self.profiles.clone();
        let viewer = self.viewer.clone();
        let quiet = self.quiet;
        let tx = self.tx.clone();
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(quiet).await;
            trace!(%query, "running user search");
            let result = search_users(&profiles, &viewer, &query).await;
            let _ = tx.send(SearchOutcome { query, result });
        }));
    }

    pub fn cancel(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
    }
}

impl Drop for SearchDebouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
