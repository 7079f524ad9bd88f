use plaza_store::StoreError;
use plaza_types::{ConversationId, PairError, PostId, UserId};

/// Failures surfaced to whoever initiated an action. Synchronization-loop
/// failures never end up here; they only change which records get published.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("invalid participants: {0}")]
    InvalidParticipants(#[from] PairError),

    #[error("message text is empty")]
    EmptyMessage,

    #[error("comment text is empty")]
    EmptyComment,

    #[error("users cannot follow themselves")]
    CannotFollowSelf,

    #[error("conversation {0} not found")]
    ConversationNotFound(ConversationId),

    #[error("{user} is not a participant of conversation {conversation}")]
    NotAParticipant {
        conversation: ConversationId,
        user: UserId,
    },

    #[error("post {0} not found")]
    PostNotFound(PostId),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("malformed record at {path}: {source}")]
    Decode {
        path: String,
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, ClientError>;
