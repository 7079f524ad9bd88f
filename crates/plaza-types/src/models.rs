use std::cmp::Ordering;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub type UserId = String;
pub type ConversationId = String;
pub type MessageId = String;
pub type NotificationId = String;
pub type PostId = String;
pub type CommentId = String;

/// Current time at the precision the store keeps (milliseconds).
pub fn timestamp_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

// Stored records never carry their own id: the id is the last path segment.
// `id` fields are skipped on write and filled in by `with_id` after a read.

// -- Participants --

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PairError {
    #[error("a conversation needs two distinct users, got {0:?} twice")]
    SameUser(UserId),

    #[error("a conversation has exactly two participants, got {0}")]
    WrongCount(usize),
}

/// The unordered pair of users in a direct conversation, kept sorted so
/// `{A,B}` and `{B,A}` are the same value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<UserId>", into = "Vec<UserId>")]
pub struct ParticipantPair {
    lo: UserId,
    hi: UserId,
}

impl ParticipantPair {
    pub fn new(a: &str, b: &str) -> Result<Self, PairError> {
        match a.cmp(b) {
            Ordering::Equal => Err(PairError::SameUser(a.to_string())),
            Ordering::Less => Ok(Self { lo: a.to_string(), hi: b.to_string() }),
            Ordering::Greater => Ok(Self { lo: b.to_string(), hi: a.to_string() }),
        }
    }

    pub fn contains(&self, user_id: &str) -> bool {
        self.lo == user_id || self.hi == user_id
    }

    /// The participant that isn't `user_id`, if `user_id` is in the pair.
    pub fn other(&self, user_id: &str) -> Option<&str> {
        if self.lo == user_id {
            Some(&self.hi)
        } else if self.hi == user_id {
            Some(&self.lo)
        } else {
            None
        }
    }

    pub fn members(&self) -> [&str; 2] {
        [&self.lo, &self.hi]
    }

    /// Deterministic conversation id for this pair. Two clients creating the
    /// same conversation concurrently address the same document.
    pub fn conversation_key(&self) -> ConversationId {
        let mut hasher = Sha256::new();
        hasher.update(self.lo.as_bytes());
        hasher.update([0u8]);
        hasher.update(self.hi.as_bytes());
        let digest = hex::encode(hasher.finalize());
        digest[..32].to_string()
    }
}

impl TryFrom<Vec<UserId>> for ParticipantPair {
    type Error = PairError;

    fn try_from(ids: Vec<UserId>) -> Result<Self, Self::Error> {
        match ids.as_slice() {
            [a, b] => Self::new(a, b),
            _ => Err(PairError::WrongCount(ids.len())),
        }
    }
}

impl From<ParticipantPair> for Vec<UserId> {
    fn from(pair: ParticipantPair) -> Self {
        vec![pair.lo, pair.hi]
    }
}

// -- Conversations --

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    #[serde(default, skip_serializing)]
    pub id: ConversationId,
    pub participant_ids: ParticipantPair,
    #[serde(default)]
    pub last_message_text: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub last_message_at: DateTime<Utc>,
}

impl Conversation {
    /// A fresh conversation with an empty summary, stamped `now`.
    pub fn new(participant_ids: ParticipantPair, now: DateTime<Utc>) -> Self {
        Self {
            id: String::new(),
            participant_ids,
            last_message_text: String::new(),
            last_message_at: now,
        }
    }

    pub fn with_id(mut self, id: impl Into<ConversationId>) -> Self {
        self.id = id.into();
        self
    }
}

// -- Messages --

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(default, skip_serializing)]
    pub id: MessageId,
    #[serde(default, skip_serializing)]
    pub conversation_id: ConversationId,
    pub sender_id: UserId,
    pub text: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub sent_at: DateTime<Utc>,
}

impl Message {
    pub fn with_id(mut self, conversation_id: &str, id: impl Into<MessageId>) -> Self {
        self.conversation_id = conversation_id.to_string();
        self.id = id.into();
        self
    }

    /// Total order for a conversation's messages: `sent_at` ascending, ties
    /// broken by the store-assigned insertion key (generated keys sort in
    /// insertion order).
    pub fn chronological(a: &Message, b: &Message) -> Ordering {
        a.sent_at.cmp(&b.sent_at).then_with(|| a.id.cmp(&b.id))
    }
}

// -- Notifications --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Like,
    Comment,
    Follow,
    Mention,
    Message,
}

impl NotificationKind {
    /// What the sender did, as shown after their name in the feed.
    pub fn phrase(self) -> &'static str {
        match self {
            Self::Like => "liked your post",
            Self::Comment => "commented on your post",
            Self::Follow => "started following you",
            Self::Mention => "mentioned you in a post",
            Self::Message => "sent you a message",
        }
    }
}

/// What a notification is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "on", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum Subject {
    Post { post_id: PostId },
    Comment { post_id: PostId, comment_id: CommentId },
}

impl Subject {
    pub fn post_id(&self) -> &str {
        match self {
            Self::Post { post_id } | Self::Comment { post_id, .. } => post_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(default, skip_serializing)]
    pub id: NotificationId,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub sender_id: UserId,
    pub recipient_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<Subject>,
    #[serde(default)]
    pub read: bool,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn with_id(mut self, id: impl Into<NotificationId>) -> Self {
        self.id = id.into();
        self
    }
}

// -- Users --

/// Public profile under `users/{uid}`. The same document also holds the
/// follow edges and settings, which are ignored here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default, skip_serializing)]
    pub uid: UserId,
    pub display_name: String,
    pub username: String,
    #[serde(rename = "photoURL", default)]
    pub photo_url: String,
}

impl UserProfile {
    pub fn with_uid(mut self, uid: impl Into<UserId>) -> Self {
        self.uid = uid.into();
        self
    }

    /// Case-insensitive substring match against display name or username.
    /// `needle` must already be lowercase.
    pub fn matches(&self, needle: &str) -> bool {
        self.display_name.to_lowercase().contains(needle)
            || self.username.to_lowercase().contains(needle)
    }
}

// -- Posts --

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(default, skip_serializing)]
    pub id: PostId,
    pub user_id: UserId,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(default, skip_serializing)]
    pub id: CommentId,
    pub user_id: UserId,
    pub content: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}
