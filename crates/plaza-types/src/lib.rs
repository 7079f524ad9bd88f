/// Plaza shared types
///
/// Records as they are persisted in the document store, the enriched view
/// records derived from them, and the logical path layout that ties the two
/// together. Nothing in here talks to the store.

pub mod models;
pub mod paths;
pub mod snapshot;
pub mod views;

pub use models::{
    Comment, CommentId, Conversation, ConversationId, Message, MessageId, Notification,
    NotificationId, NotificationKind, PairError, ParticipantPair, Post, PostId, Subject,
    UserId, UserProfile, timestamp_now,
};
pub use snapshot::Snapshot;
pub use views::{ConversationView, NotificationTarget, NotificationView};
