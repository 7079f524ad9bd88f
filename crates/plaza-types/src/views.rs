use crate::models::{Conversation, Notification, NotificationKind, PostId, UserProfile};

// Derived records handed to the UI. They are recomputed from the store on
// every change and are never written back.

/// A conversation joined with the profile of the participant who isn't the
/// viewer.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationView {
    pub conversation: Conversation,
    pub other_participant: UserProfile,
}

impl ConversationView {
    pub fn id(&self) -> &str {
        &self.conversation.id
    }
}

/// Where tapping a notification leads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationTarget {
    Profile { username: String },
    Inbox,
    Post { post_id: PostId },
    Nowhere,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NotificationView {
    pub notification: Notification,
    pub sender: UserProfile,
    pub text: String,
}

impl NotificationView {
    pub fn new(notification: Notification, sender: UserProfile) -> Self {
        let text = notification.kind.phrase().to_string();
        Self { notification, sender, text }
    }

    pub fn id(&self) -> &str {
        &self.notification.id
    }

    /// "Alice liked your post"
    pub fn headline(&self) -> String {
        format!("{} {}", self.sender.display_name, self.text)
    }

    pub fn target(&self) -> NotificationTarget {
        match self.notification.kind {
            NotificationKind::Follow => NotificationTarget::Profile {
                username: self.sender.username.clone(),
            },
            NotificationKind::Message => NotificationTarget::Inbox,
            _ => match &self.notification.subject {
                Some(subject) => NotificationTarget::Post {
                    post_id: subject.post_id().to_string(),
                },
                None => NotificationTarget::Nowhere,
            },
        }
    }
}
