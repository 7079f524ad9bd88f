/// Plaza client core
///
/// Live conversation, message and notification views over the document
/// store, plus the write paths that feed them: sending messages, resolving
/// conversations, likes, comments and follows. Writes go straight to the
/// store; views only ever change when the store reports a change.

pub mod config;
pub mod conversations;
pub mod error;
pub mod inbox;
pub mod logging;
pub mod messages;
pub mod notifications;
pub mod repos;
pub mod resolver;
pub mod search;
pub mod social;

use std::sync::Arc;

use anyhow::Context;

use plaza_store::{Database, DocumentStore};
use plaza_types::UserProfile;

pub use config::ClientConfig;
pub use conversations::ConversationFeed;
pub use error::{ClientError, Result};
pub use inbox::Inbox;
pub use messages::{MessageFeed, Messenger};
pub use notifications::NotificationFeed;
pub use resolver::ConversationResolver;
pub use search::{SearchDebouncer, SearchOutcome, search_users};
pub use social::Social;

/// Entry point: one store handle and the settings every service shares.
#[derive(Clone)]
pub struct Client {
    store: Arc<dyn DocumentStore>,
    config: ClientConfig,
}

impl Client {
    pub fn new(store: Arc<dyn DocumentStore>, config: ClientConfig) -> Self {
        Self { store, config }
    }

    /// Configure from the environment, install logging with the configured
    /// filter, and open the store it names.
    pub fn from_env() -> anyhow::Result<Self> {
        let config = ClientConfig::from_env()?;
        if !logging::init(&config.log_filter) {
            tracing::debug!("tracing subscriber already installed");
        }
        let db = Database::open(&config.db_path)
            .with_context(|| format!("opening store at {}", config.db_path.display()))?;
        Ok(Self::new(Arc::new(db), config))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn store(&self) -> Arc<dyn DocumentStore> {
        self.store.clone()
    }

    // -- Actions --

    pub fn profiles(&self) -> repos::ProfileRepo {
        repos::ProfileRepo::new(self.store.clone())
    }

    pub fn resolver(&self) -> ConversationResolver {
        ConversationResolver::new(repos::ConversationRepo::new(self.store.clone()))
    }

    pub fn messenger(&self) -> Messenger {
        Messenger::new(self.store.clone())
    }

    pub fn social(&self) -> Social {
        Social::new(self.store.clone())
    }

    pub async fn search_users(&self, viewer: &str, query: &str) -> Result<Vec<UserProfile>> {
        search_users(&self.profiles(), viewer, query).await
    }

    pub fn search(
        &self,
        viewer: &str,
    ) -> (SearchDebouncer, tokio::sync::mpsc::UnboundedReceiver<SearchOutcome>) {
        SearchDebouncer::new(self.profiles(), viewer, self.config.search_debounce)
    }

    // -- Views --

    pub fn conversation_feed(&self) -> ConversationFeed {
        ConversationFeed::new(self.store.clone())
    }

    pub fn message_feed(&self) -> MessageFeed {
        MessageFeed::new(self.store.clone())
    }

    pub fn notification_feed(&self) -> NotificationFeed {
        NotificationFeed::new(self.store.clone())
    }

    pub async fn inbox(&self, viewer: &str) -> Result<Inbox> {
        Inbox::open(self.store.clone(), viewer, self.config.auto_select).await
    }
}
