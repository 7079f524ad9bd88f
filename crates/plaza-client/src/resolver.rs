use tracing::{debug, info};

use plaza_types::{Conversation, ParticipantPair, timestamp_now};

use crate::error::{ClientError, Result};
use crate::repos::ConversationRepo;

/// Finds the single conversation between two users, creating it on first use.
///
/// Conversations live under a key derived from the participant pair, so two
/// clients resolving the same pair at once write to the same document and
/// `write_if_absent` lets exactly one of them create it. Records written
/// under other keys before this scheme are still found by a scan.
#[derive(Clone)]
pub struct ConversationResolver {
    conversations: ConversationRepo,
}

impl ConversationResolver {
    pub fn new(conversations: ConversationRepo) -> Self {
        Self { conversations }
    }

    pub async fn find_or_create(&self, a: &str, b: &str) -> Result<Conversation> {
        let pair = ParticipantPair::new(a, b)?;
        let key = pair.conversation_key();

        if let Some(existing) = self.conversations.get(&key).await? {
            return Ok(existing);
        }

        if let Some(legacy) = self
            .conversations
            .all()
            .await?
            .into_iter()
            .find(|c| c.participant_ids == pair)
        {
            debug!(conversation = %legacy.id, "resolved to conversation under a legacy key");
            return Ok(legacy);
        }

        let fresh = Conversation::new(pair, timestamp_now()).with_id(key.clone());
        if self.conversations.create_if_absent(&fresh).await? {
            info!(conversation = %key, "conversation created");
            return Ok(fresh);
        }

        // Someone else created it between our read and our write.
        debug!(conversation = %key, "lost create race, using existing record");
        let winner = self.conversations.get(&key).await?;
        winner.ok_or(ClientError::ConversationNotFound(key))
    }
}
