use std::cmp::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;

use plaza_store::DocumentStore;
use plaza_sync::{Collection, EnrichError, LiveCollection, Published, SlotState};
use plaza_types::{Conversation, ConversationView, UserId, paths};

use crate::error::Result;
use crate::repos::ProfileRepo;

/// Conversations `viewer` takes part in, each joined with the other
/// participant's profile, most recent first.
pub struct ConversationQuery {
    viewer: UserId,
    profiles: ProfileRepo,
}

#[async_trait]
impl Collection for ConversationQuery {
    type Raw = Conversation;
    type Item = ConversationView;

    fn path(&self) -> String {
        paths::CONVERSATIONS.to_string()
    }

    fn accepts(&self, _key: &str, raw: &Conversation) -> bool {
        raw.participant_ids.contains(&self.viewer)
    }

    async fn enrich(
        &self,
        key: String,
        raw: Conversation,
    ) -> std::result::Result<ConversationView, EnrichError> {
        let conversation = raw.with_id(key);
        let Some(other) = conversation.participant_ids.other(&self.viewer) else {
            return Err(EnrichError::Missing(paths::conversation(&conversation.id)));
        };
        let other_participant = self.profiles.lookup(other).await?;
        Ok(ConversationView {
            conversation,
            other_participant,
        })
    }

    fn order(&self, a: &ConversationView, b: &ConversationView) -> Ordering {
        b.conversation
            .last_message_at
            .cmp(&a.conversation.last_message_at)
            .then_with(|| a.id().cmp(b.id()))
    }
}

/// Live conversation list for one viewer.
pub struct ConversationFeed {
    live: LiveCollection<ConversationQuery>,
    profiles: ProfileRepo,
    viewer: Option<UserId>,
}

impl ConversationFeed {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            live: LiveCollection::new(store.clone()),
            profiles: ProfileRepo::new(store),
            viewer: None,
        }
    }

    /// Follow `viewer`'s conversations. Switching viewers replaces the
    /// subscription; reopening for the same viewer is a no-op.
    pub async fn open(&mut self, viewer: &str) -> Result<()> {
        if self.viewer.as_deref() == Some(viewer) && self.live.state() != SlotState::Unsubscribed {
            return Ok(());
        }

        self.viewer = None;
        self.live
            .subscribe(ConversationQuery {
                viewer: viewer.to_string(),
                profiles: self.profiles.clone(),
            })
            .await?;
        self.viewer = Some(viewer.to_string());
        Ok(())
    }

    pub fn close(&mut self) {
        self.live.unsubscribe();
        self.viewer = None;
    }

    pub fn viewer(&self) -> Option<&str> {
        self.viewer.as_deref()
    }

    pub fn watch(&self) -> watch::Receiver<Published<ConversationView>> {
        self.live.watch()
    }

    pub fn current(&self) -> Published<ConversationView> {
        self.live.current()
    }

    pub fn state(&self) -> SlotState {
        self.live.state()
    }
}
