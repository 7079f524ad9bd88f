use std::cmp::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::debug;

use plaza_store::DocumentStore;
use plaza_sync::{Collection, EnrichError, LiveCollection, Published, SlotState};
use plaza_types::{ConversationId, Message, paths, timestamp_now};

use crate::error::{ClientError, Result};
use crate::repos::{ConversationRepo, MessageRepo};

// -- Live message list --

/// Messages of one conversation in `(sentAt, key)` order. Sender identity is
/// left to the caller, who already knows both participants.
pub struct MessageQuery {
    conversation_id: ConversationId,
}

#[async_trait]
impl Collection for MessageQuery {
    type Raw = Message;
    type Item = Message;

    fn path(&self) -> String {
        paths::messages(&self.conversation_id)
    }

    async fn enrich(
        &self,
        key: String,
        raw: Message,
    ) -> std::result::Result<Message, EnrichError> {
        Ok(raw.with_id(&self.conversation_id, key))
    }

    fn order(&self, a: &Message, b: &Message) -> Ordering {
        Message::chronological(a, b)
    }
}

/// Live message list for the active conversation.
pub struct MessageFeed {
    live: LiveCollection<MessageQuery>,
    active: Option<ConversationId>,
}

impl MessageFeed {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            live: LiveCollection::new(store),
            active: None,
        }
    }

    /// Make `conversation_id` the active conversation. The previous one's
    /// subscription is torn down before the new one is installed.
    pub async fn select(&mut self, conversation_id: &str) -> Result<()> {
        if self.active.as_deref() == Some(conversation_id)
            && self.live.state() != SlotState::Unsubscribed
        {
            return Ok(());
        }

        self.active = None;
        self.live
            .subscribe(MessageQuery {
                conversation_id: conversation_id.to_string(),
            })
            .await?;
        self.active = Some(conversation_id.to_string());
        Ok(())
    }

    pub fn clear(&mut self) {
        self.live.unsubscribe();
        self.active = None;
    }

    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn watch(&self) -> watch::Receiver<Published<Message>> {
        self.live.watch()
    }

    pub fn current(&self) -> Published<Message> {
        self.live.current()
    }

    pub fn state(&self) -> SlotState {
        self.live.state()
    }
}

// -- Sending --

#[derive(Clone)]
pub struct Messenger {
    conversations: ConversationRepo,
    messages: MessageRepo,
}

impl Messenger {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            conversations: ConversationRepo::new(store.clone()),
            messages: MessageRepo::new(store),
        }
    }

    /// Append a message, then refresh the conversation summary.
    ///
    /// The two writes are separate: if the second fails the message is
    /// still stored and the error is returned. `rebuild_summary` repairs it.
    pub async fn send_message(
        &self,
        conversation_id: &str,
        sender: &str,
        text: &str,
    ) -> Result<Message> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ClientError::EmptyMessage);
        }

        let conversation = self
            .conversations
            .get(conversation_id)
            .await?
            .ok_or_else(|| ClientError::ConversationNotFound(conversation_id.to_string()))?;
        if !conversation.participant_ids.contains(sender) {
            return Err(ClientError::NotAParticipant {
                conversation: conversation_id.to_string(),
                user: sender.to_string(),
            });
        }

        let message = Message {
            id: String::new(),
            conversation_id: conversation_id.to_string(),
            sender_id: sender.to_string(),
            text: text.to_string(),
            sent_at: timestamp_now(),
        };
        let id = self.messages.append(conversation_id, &message).await?;
        debug!(conversation = conversation_id, message = %id, "message appended");

        self.conversations
            .set_summary(conversation_id, &message.text, message.sent_at)
            .await?;

        Ok(Message { id, ..message })
    }

    /// Recompute the summary from the newest stored message. Returns that
    /// message, or `None` if the conversation has no messages yet.
    pub async fn rebuild_summary(&self, conversation_id: &str) -> Result<Option<Message>> {
        if self.conversations.get(conversation_id).await?.is_none() {
            return Err(ClientError::ConversationNotFound(conversation_id.to_string()));
        }

        let latest = self.messages.latest(conversation_id).await?;
        if let Some(message) = &latest {
            self.conversations
                .set_summary(conversation_id, &message.text, message.sent_at)
                .await?;
            debug!(conversation = conversation_id, "summary rebuilt");
        }
        Ok(latest)
    }
}
