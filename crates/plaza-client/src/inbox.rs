use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, warn};

use plaza_store::DocumentStore;
use plaza_sync::{Published, SlotState};
use plaza_types::{Conversation, ConversationView, UserId};

use crate::conversations::ConversationFeed;
use crate::error::Result;
use crate::messages::MessageFeed;
use crate::repos::ConversationRepo;
use crate::resolver::ConversationResolver;

/// The messaging screen for one user: their conversation list plus the
/// messages of whichever conversation is selected.
pub struct Inbox {
    viewer: UserId,
    conversations: ConversationFeed,
    messages: MessageFeed,
    resolver: ConversationResolver,
    listing: watch::Receiver<Published<ConversationView>>,
    auto_select: bool,
}

impl Inbox {
    pub async fn open(
        store: Arc<dyn DocumentStore>,
        viewer: &str,
        auto_select: bool,
    ) -> Result<Self> {
        let mut conversations = ConversationFeed::new(store.clone());
        // Taken before opening so the first published list counts as a change.
        let listing = conversations.watch();
        conversations.open(viewer).await?;

        Ok(Self {
            viewer: viewer.to_string(),
            conversations,
            messages: MessageFeed::new(store.clone()),
            resolver: ConversationResolver::new(ConversationRepo::new(store)),
            listing,
            auto_select,
        })
    }

    pub fn viewer(&self) -> &str {
        &self.viewer
    }

    pub fn conversations(&self) -> &ConversationFeed {
        &self.conversations
    }

    pub fn messages(&self) -> &MessageFeed {
        &self.messages
    }

    pub async fn select(&mut self, conversation_id: &str) -> Result<()> {
        self.messages.select(conversation_id).await
    }

    /// Open (or create) the conversation with `other` and select it.
    pub async fn start_conversation(&mut self, other: &str) -> Result<Conversation> {
        let conversation = self.resolver.find_or_create(&self.viewer, other).await?;
        self.messages.select(&conversation.id).await?;
        debug!(viewer = %self.viewer, conversation = %conversation.id, "conversation started");
        Ok(conversation)
    }

    /// Wait for the next published conversation list. With auto-select on and
    /// nothing selected, the most recent conversation gets selected. Returns
    /// `None` once the inbox is closed.
    pub async fn next_conversations(&mut self) -> Option<Published<ConversationView>> {
        if self.conversations.state() == SlotState::Unsubscribed {
            return None;
        }
        self.listing.changed().await.ok()?;
        let list = self.listing.borrow_and_update().clone();

        if self.auto_select
            && self.messages.active().is_none()
            && let Some(first) = list.first()
            && let Err(e) = self.messages.select(first.id()).await
        {
            warn!(conversation = first.id(), "auto-select failed: {}", e);
        }
        Some(list)
    }

    pub fn close(&mut self) {
        self.messages.clear();
        self.conversations.close();
    }
}
