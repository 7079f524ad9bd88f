use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::warn;

use plaza_store::DocumentStore;
use plaza_sync::EnrichError;
use plaza_types::{
    Comment, CommentId, Conversation, Message, MessageId, Notification, NotificationId, Post,
    PostId, Snapshot, UserProfile, paths,
};

use crate::error::{ClientError, Result};

// Typed access to each entity's paths. No business rules live here.

fn decode<T: DeserializeOwned>(path: &str, snapshot: &Snapshot) -> Result<Option<T>> {
    snapshot.decode().map_err(|source| ClientError::Decode {
        path: path.to_string(),
        source,
    })
}

fn encode<T: Serialize>(path: &str, record: &T) -> Result<Value> {
    serde_json::to_value(record).map_err(|source| ClientError::Decode {
        path: path.to_string(),
        source,
    })
}

/// Decode every child of a collection snapshot, skipping (and logging)
/// records that don't fit `T`.
fn decode_children<T: DeserializeOwned>(path: &str, snapshot: Snapshot) -> Vec<(String, T)> {
    snapshot
        .into_children()
        .into_iter()
        .filter_map(|(key, value)| match serde_json::from_value(value) {
            Ok(record) => Some((key, record)),
            Err(e) => {
                warn!(collection = path, %key, "skipping malformed record: {}", e);
                None
            }
        })
        .collect()
}

// -- Profiles --

#[derive(Clone)]
pub struct ProfileRepo {
    store: Arc<dyn DocumentStore>,
}

impl ProfileRepo {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn get(&self, uid: &str) -> Result<Option<UserProfile>> {
        let path = paths::user(uid);
        let snapshot = self.store.read(&path).await?;
        let profile: Option<UserProfile> = decode(&path, &snapshot)?;
        Ok(profile.map(|p| p.with_uid(uid)))
    }

    /// Profile join for live views. A missing profile drops the joined record.
    pub async fn lookup(&self, uid: &str) -> std::result::Result<UserProfile, EnrichError> {
        let path = paths::user(uid);
        let snapshot = self.store.read(&path).await?;
        let profile: Option<UserProfile> = snapshot.decode()?;
        profile
            .map(|p| p.with_uid(uid))
            .ok_or(EnrichError::Missing(path))
    }

    /// Write the public profile fields, leaving the rest of the user
    /// document (follow edges) alone.
    pub async fn put(&self, profile: &UserProfile) -> Result<()> {
        let path = paths::user(&profile.uid);
        match encode(&path, profile)? {
            Value::Object(fields) => self.store.update(&path, fields).await?,
            other => self.store.write(&path, other).await?,
        }
        Ok(())
    }

    /// Every user with a readable profile, in uid order.
    pub async fn all(&self) -> Result<Vec<UserProfile>> {
        let snapshot = self.store.read(paths::USERS).await?;
        Ok(decode_children::<UserProfile>(paths::USERS, snapshot)
            .into_iter()
            .map(|(uid, profile)| profile.with_uid(uid))
            .collect())
    }

    // -- Follow graph --

    pub async fn is_following(&self, follower: &str, followee: &str) -> Result<bool> {
        let snapshot = self.store.read(&paths::following(follower, followee)).await?;
        Ok(snapshot.exists())
    }

    /// Add or remove both edges of a follow.
    pub async fn set_following(&self, follower: &str, followee: &str, on: bool) -> Result<()> {
        let outgoing = paths::following(follower, followee);
        let incoming = paths::followers(followee, follower);
        if on {
            self.store.write(&outgoing, Value::Bool(true)).await?;
            self.store.write(&incoming, Value::Bool(true)).await?;
        } else {
            self.store.remove(&outgoing).await?;
            self.store.remove(&incoming).await?;
        }
        Ok(())
    }
}

// -- Conversations --

#[derive(Clone)]
pub struct ConversationRepo {
    store: Arc<dyn DocumentStore>,
}

impl ConversationRepo {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn get(&self, id: &str) -> Result<Option<Conversation>> {
        let path = paths::conversation(id);
        let snapshot = self.store.read(&path).await?;
        let conversation: Option<Conversation> = decode(&path, &snapshot)?;
        Ok(conversation.map(|c| c.with_id(id)))
    }

    /// The whole collection, in key order. There is no server-side filter.
    pub async fn all(&self) -> Result<Vec<Conversation>> {
        let snapshot = self.store.read(paths::CONVERSATIONS).await?;
        Ok(decode_children::<Conversation>(paths::CONVERSATIONS, snapshot)
            .into_iter()
            .map(|(id, c)| c.with_id(id))
            .collect())
    }

    /// Create `conversation` under its own id unless that id is taken.
    pub async fn create_if_absent(&self, conversation: &Conversation) -> Result<bool> {
        let path = paths::conversation(&conversation.id);
        let value = encode(&path, conversation)?;
        Ok(self.store.write_if_absent(&path, value).await?)
    }

    pub async fn set_summary(&self, id: &str, text: &str, at: DateTime<Utc>) -> Result<()> {
        let mut fields = Map::new();
        fields.insert("lastMessageText".into(), Value::from(text));
        fields.insert("lastMessageAt".into(), Value::from(at.timestamp_millis()));
        self.store.update(&paths::conversation(id), fields).await?;
        Ok(())
    }
}

// -- Messages --

#[derive(Clone)]
pub struct MessageRepo {
    store: Arc<dyn DocumentStore>,
}

impl MessageRepo {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn append(&self, conversation_id: &str, message: &Message) -> Result<MessageId> {
        let path = paths::messages(conversation_id);
        let value = encode(&path, message)?;
        Ok(self.store.append(&path, value).await?)
    }

    /// All messages of a conversation, oldest first.
    pub async fn list(&self, conversation_id: &str) -> Result<Vec<Message>> {
        let path = paths::messages(conversation_id);
        let snapshot = self.store.read(&path).await?;
        let mut messages: Vec<Message> = decode_children::<Message>(&path, snapshot)
            .into_iter()
            .map(|(id, m)| m.with_id(conversation_id, id))
            .collect();
        messages.sort_by(Message::chronological);
        Ok(messages)
    }

    pub async fn latest(&self, conversation_id: &str) -> Result<Option<Message>> {
        Ok(self.list(conversation_id).await?.pop())
    }
}

// -- Notifications --

#[derive(Clone)]
pub struct NotificationRepo {
    store: Arc<dyn DocumentStore>,
}

impl NotificationRepo {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, notification: &Notification) -> Result<NotificationId> {
        let value = encode(paths::NOTIFICATIONS, notification)?;
        Ok(self.store.append(paths::NOTIFICATIONS, value).await?)
    }

    /// Point write of the read flag. Returns false if the notification is gone.
    pub async fn mark_read(&self, id: &str) -> Result<bool> {
        let path = paths::notification(id);
        if !self.store.read(&path).await?.exists() {
            return Ok(false);
        }
        self.store
            .write(&format!("{}/read", path), Value::Bool(true))
            .await?;
        Ok(true)
    }

    pub async fn unread_for(&self, recipient: &str) -> Result<Vec<Notification>> {
        let snapshot = self.store.read(paths::NOTIFICATIONS).await?;
        Ok(decode_children::<Notification>(paths::NOTIFICATIONS, snapshot)
            .into_iter()
            .filter(|(_, n)| n.recipient_id == recipient && !n.read)
            .map(|(id, n)| n.with_id(id))
            .collect())
    }
}

// -- Posts --

#[derive(Clone)]
pub struct PostRepo {
    store: Arc<dyn DocumentStore>,
}

impl PostRepo {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, post: &Post) -> Result<PostId> {
        let value = encode(paths::POSTS, post)?;
        Ok(self.store.append(paths::POSTS, value).await?)
    }

    pub async fn get(&self, id: &str) -> Result<Option<Post>> {
        let path = paths::post(id);
        let snapshot = self.store.read(&path).await?;
        let post: Option<Post> = decode(&path, &snapshot)?;
        Ok(post.map(|p| Post { id: id.to_string(), ..p }))
    }

    pub async fn is_liked(&self, post_id: &str, uid: &str) -> Result<bool> {
        Ok(self.store.read(&paths::post_like(post_id, uid)).await?.exists())
    }

    pub async fn set_like(&self, post_id: &str, uid: &str, liked: bool) -> Result<()> {
        let path = paths::post_like(post_id, uid);
        if liked {
            self.store.write(&path, Value::Bool(true)).await?;
        } else {
            self.store.remove(&path).await?;
        }
        Ok(())
    }

    pub async fn add_comment(&self, post_id: &str, comment: &Comment) -> Result<CommentId> {
        let path = paths::post_comments(post_id);
        let value = encode(&path, comment)?;
        Ok(self.store.append(&path, value).await?)
    }

    /// Comments on a post, oldest first.
    pub async fn comments(&self, post_id: &str) -> Result<Vec<Comment>> {
        let path = paths::post_comments(post_id);
        let snapshot = self.store.read(&path).await?;
        let mut comments: Vec<Comment> = decode_children::<Comment>(&path, snapshot)
            .into_iter()
            .map(|(id, c)| Comment { id, ..c })
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(comments)
    }
}
