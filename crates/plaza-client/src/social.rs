use std::sync::Arc;

use tracing::debug;

use plaza_store::DocumentStore;
use plaza_types::{
    Comment, CommentId, Notification, NotificationId, NotificationKind, Post, Subject,
    timestamp_now,
};

use crate::error::{ClientError, Result};
use crate::repos::{NotificationRepo, PostRepo, ProfileRepo};

/// Likes, comments and follows, each of which notifies the user it affects.
#[derive(Clone)]
pub struct Social {
    posts: PostRepo,
    profiles: ProfileRepo,
    notifications: NotificationRepo,
}

impl Social {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            posts: PostRepo::new(store.clone()),
            profiles: ProfileRepo::new(store.clone()),
            notifications: NotificationRepo::new(store),
        }
    }

    // -- Posts --

    /// Like or unlike. Returns whether the post is liked afterwards.
    pub async fn toggle_like(&self, post_id: &str, user: &str) -> Result<bool> {
        let post = self.require_post(post_id).await?;

        if self.posts.is_liked(post_id, user).await? {
            self.posts.set_like(post_id, user, false).await?;
            return Ok(false);
        }

        self.posts.set_like(post_id, user, true).await?;
        self.notify(
            NotificationKind::Like,
            user,
            &post.user_id,
            Some(Subject::Post {
                post_id: post_id.to_string(),
            }),
        )
        .await?;
        Ok(true)
    }

    pub async fn add_comment(&self, post_id: &str, user: &str, text: &str) -> Result<CommentId> {
        let content = text.trim();
        if content.is_empty() {
            return Err(ClientError::EmptyComment);
        }
        let post = self.require_post(post_id).await?;

        let comment = Comment {
            id: String::new(),
            user_id: user.to_string(),
            content: content.to_string(),
            created_at: timestamp_now(),
        };
        let comment_id = self.posts.add_comment(post_id, &comment).await?;

        self.notify(
            NotificationKind::Comment,
            user,
            &post.user_id,
            Some(Subject::Comment {
                post_id: post_id.to_string(),
                comment_id: comment_id.clone(),
            }),
        )
        .await?;
        Ok(comment_id)
    }

    async fn require_post(&self, post_id: &str) -> Result<Post> {
        self.posts
            .get(post_id)
            .await?
            .ok_or_else(|| ClientError::PostNotFound(post_id.to_string()))
    }

    // -- Follows --

    pub async fn is_following(&self, follower: &str, followee: &str) -> Result<bool> {
        self.profiles.is_following(follower, followee).await
    }

    /// Follow `followee`. Already following is a no-op and sends nothing.
    pub async fn follow(&self, follower: &str, followee: &str) -> Result<()> {
        if follower == followee {
            return Err(ClientError::CannotFollowSelf);
        }
        if self.profiles.is_following(follower, followee).await? {
            return Ok(());
        }

        self.profiles.set_following(follower, followee, true).await?;
        self.notify(NotificationKind::Follow, follower, followee, None)
            .await?;
        Ok(())
    }

    pub async fn unfollow(&self, follower: &str, followee: &str) -> Result<()> {
        if follower == followee {
            return Err(ClientError::CannotFollowSelf);
        }
        self.profiles.set_following(follower, followee, false).await
    }

    /// Returns whether `follower` follows `followee` afterwards.
    pub async fn toggle_follow(&self, follower: &str, followee: &str) -> Result<bool> {
        if self.is_following(follower, followee).await? {
            self.unfollow(follower, followee).await?;
            Ok(false)
        } else {
            self.follow(follower, followee).await?;
            Ok(true)
        }
    }

    // -- Notifications --

    /// Record a notification for `recipient`. Acting on your own content
    /// notifies no one.
    pub async fn notify(
        &self,
        kind: NotificationKind,
        sender: &str,
        recipient: &str,
        subject: Option<Subject>,
    ) -> Result<Option<NotificationId>> {
        if sender == recipient {
            return Ok(None);
        }

        let notification = Notification {
            id: String::new(),
            kind,
            sender_id: sender.to_string(),
            recipient_id: recipient.to_string(),
            subject,
            read: false,
            created_at: timestamp_now(),
        };
        let id = self.notifications.create(&notification).await?;
        debug!(notification = %id, ?kind, sender, recipient, "notification created");
        Ok(Some(id))
    }
}
