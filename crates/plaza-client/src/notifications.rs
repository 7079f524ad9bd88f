use std::cmp::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::debug;

use plaza_store::DocumentStore;
use plaza_sync::{Collection, EnrichError, LiveCollection, Published, SlotState};
use plaza_types::{Notification, NotificationKind, NotificationView, UserId, paths};

use crate::error::Result;
use crate::repos::{NotificationRepo, ProfileRepo};

/// Notifications addressed to `viewer`, joined with the sender's profile,
/// newest first.
pub struct NotificationQuery {
    viewer: UserId,
    profiles: ProfileRepo,
}

#[async_trait]
impl Collection for NotificationQuery {
    type Raw = Notification;
    type Item = NotificationView;

    fn path(&self) -> String {
        paths::NOTIFICATIONS.to_string()
    }

    fn accepts(&self, _key: &str, raw: &Notification) -> bool {
        raw.recipient_id == self.viewer
    }

    async fn enrich(
        &self,
        key: String,
        raw: Notification,
    ) -> std::result::Result<NotificationView, EnrichError> {
        let sender = self.profiles.lookup(&raw.sender_id).await?;
        Ok(NotificationView::new(raw.with_id(key), sender))
    }

    fn order(&self, a: &NotificationView, b: &NotificationView) -> Ordering {
        b.notification
            .created_at
            .cmp(&a.notification.created_at)
            .then_with(|| b.id().cmp(a.id()))
    }
}

/// Live notification feed for one recipient.
pub struct NotificationFeed {
    live: LiveCollection<NotificationQuery>,
    profiles: ProfileRepo,
    notifications: NotificationRepo,
    viewer: Option<UserId>,
}

impl NotificationFeed {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            live: LiveCollection::new(store.clone()),
            profiles: ProfileRepo::new(store.clone()),
            notifications: NotificationRepo::new(store),
            viewer: None,
        }
    }

    pub async fn open(&mut self, viewer: &str) -> Result<()> {
        if self.viewer.as_deref() == Some(viewer) && self.live.state() != SlotState::Unsubscribed {
            return Ok(());
        }

        self.viewer = None;
        self.live
            .subscribe(NotificationQuery {
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

    /// Flag one notification read. It stays in the feed.
    pub async fn mark_read(&self, id: &str) -> Result<bool> {
        self.notifications.mark_read(id).await
    }

    /// Flag every unread notification of the current viewer. Returns how many
    /// were flagged.
    pub async fn mark_all_read(&self) -> Result<usize> {
        let Some(viewer) = self.viewer.as_deref() else {
            return Ok(0);
        };

        let unread = self.notifications.unread_for(viewer).await?;
        let mut flagged = 0;
        for notification in &unread {
            if self.notifications.mark_read(&notification.id).await? {
                flagged += 1;
            }
        }
        debug!(viewer, flagged, "marked all notifications read");
        Ok(flagged)
    }

    pub fn unread_count(&self) -> usize {
        self.live
            .current()
            .iter()
            .filter(|view| !view.notification.read)
            .count()
    }

    /// The published list narrowed to one kind; `None` keeps everything.
    pub fn of_kind(&self, kind: Option<NotificationKind>) -> Vec<NotificationView> {
        self.live
            .current()
            .iter()
            .filter(|view| kind.is_none_or(|k| view.notification.kind == k))
            .cloned()
            .collect()
    }

    pub fn watch(&self) -> watch::Receiver<Published<NotificationView>> {
        self.live.watch()
    }

    pub fn current(&self) -> Published<NotificationView> {
        self.live.current()
    }

    pub fn state(&self) -> SlotState {
        self.live.state()
    }
}
