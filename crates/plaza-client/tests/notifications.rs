mod common;

use serde_json::json;

use plaza_client::ClientError;
use plaza_client::repos::PostRepo;
use plaza_store::DocumentStore;
use plaza_types::{
    NotificationKind, NotificationTarget, Post, Snapshot, Subject, paths, timestamp_now,
};

use common::{add_user, client_over, memory_store, wait_for};

async fn post_by(client: &plaza_client::Client, author: &str) -> String {
    PostRepo::new(client.store())
        .create(&Post {
            id: String::new(),
            user_id: author.into(),
            content: "hello world".into(),
            image_url: None,
            created_at: timestamp_now(),
        })
        .await
        .unwrap()
}

#[tokio::test]
async fn like_notifies_author_and_can_be_marked_read() {
    let db = memory_store();
    let client = client_over(db.clone());
    add_user(&client, "u1", "Alice", "alice").await;
    add_user(&client, "u2", "Bob", "bob").await;
    let post = post_by(&client, "u2").await;

    assert!(client.social().toggle_like(&post, "u1").await.unwrap());

    let mut feed = client.notification_feed();
    let mut rx = feed.watch();
    feed.open("u2").await.unwrap();
    let list = wait_for(&mut rx, |l| l.len() == 1).await;

    let view = &list[0];
    assert_eq!(view.notification.kind, NotificationKind::Like);
    assert_eq!(view.text, "liked your post");
    assert_eq!(view.headline(), "Alice liked your post");
    assert_eq!(view.target(), NotificationTarget::Post { post_id: post.clone() });
    assert_eq!(feed.unread_count(), 1);

    assert!(feed.mark_read(view.id()).await.unwrap());
    let list = wait_for(&mut rx, |l| l.len() == 1 && l[0].notification.read).await;
    assert_eq!(list[0].id(), view.id());
    assert_eq!(feed.unread_count(), 0);

    assert!(!feed.mark_read("missing").await.unwrap());
}

#[tokio::test]
async fn unlike_removes_the_like_without_notifying_again() {
    let db = memory_store();
    let client = client_over(db.clone());
    let post = post_by(&client, "u2").await;
    let social = client.social();

    assert!(social.toggle_like(&post, "u1").await.unwrap());
    assert!(!social.toggle_like(&post, "u1").await.unwrap());
    assert!(!PostRepo::new(db.clone()).is_liked(&post, "u1").await.unwrap());

    let all = db.read(paths::NOTIFICATIONS).await.unwrap().into_children();
    assert_eq!(all.len(), 1);
}

#[tokio::test]
async fn acting_on_your_own_post_notifies_no_one() {
    let db = memory_store();
    let client = client_over(db.clone());
    let post = post_by(&client, "u1").await;

    client.social().toggle_like(&post, "u1").await.unwrap();
    client.social().add_comment(&post, "u1", "me again").await.unwrap();

    assert_eq!(db.read(paths::NOTIFICATIONS).await.unwrap(), Snapshot::Absent);
}

#[tokio::test]
async fn comment_is_stored_and_notifies() {
    let db = memory_store();
    let client = client_over(db.clone());
    add_user(&client, "u1", "Alice", "alice").await;
    let post = post_by(&client, "u2").await;

    let comment_id = client
        .social()
        .add_comment(&post, "u1", "  nice post ")
        .await
        .unwrap();

    let comments = PostRepo::new(db.clone()).comments(&post).await.unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].id, comment_id);
    assert_eq!(comments[0].content, "nice post");

    let mut feed = client.notification_feed();
    let mut rx = feed.watch();
    feed.open("u2").await.unwrap();
    let list = wait_for(&mut rx, |l| l.len() == 1).await;
    assert_eq!(list[0].headline(), "Alice commented on your post");
    assert_eq!(
        list[0].notification.subject,
        Some(Subject::Comment { post_id: post.clone(), comment_id })
    );
    assert_eq!(list[0].target(), NotificationTarget::Post { post_id: post });
}

#[tokio::test]
async fn comment_and_like_validation() {
    let db = memory_store();
    let client = client_over(db.clone());
    let post = post_by(&client, "u2").await;
    let social = client.social();

    let err = social.add_comment(&post, "u1", "   ").await.unwrap_err();
    assert!(matches!(err, ClientError::EmptyComment));

    let err = social.add_comment("ghost", "u1", "hi").await.unwrap_err();
    assert!(matches!(err, ClientError::PostNotFound(id) if id == "ghost"));

    let err = social.toggle_like("ghost", "u1").await.unwrap_err();
    assert!(matches!(err, ClientError::PostNotFound(_)));
}

#[tokio::test]
async fn follow_edges_and_notification() {
    let db = memory_store();
    let client = client_over(db.clone());
    add_user(&client, "u1", "Alice", "alice").await;
    add_user(&client, "u2", "Bob", "bob").await;
    let social = client.social();

    social.follow("u1", "u2").await.unwrap();
    social.follow("u1", "u2").await.unwrap();
    assert!(social.is_following("u1", "u2").await.unwrap());
    assert!(!social.is_following("u2", "u1").await.unwrap());
    assert!(db.read(&paths::followers("u2", "u1")).await.unwrap().exists());

    // Following lives in the user document without disturbing the profile.
    let bob = client.profiles().get("u2").await.unwrap().unwrap();
    assert_eq!(bob.display_name, "Bob");

    let mut feed = client.notification_feed();
    let mut rx = feed.watch();
    feed.open("u2").await.unwrap();
    let list = wait_for(&mut rx, |l| !l.is_empty()).await;
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].headline(), "Alice started following you");
    assert_eq!(
        list[0].target(),
        NotificationTarget::Profile { username: "alice".into() }
    );

    assert!(!social.toggle_follow("u1", "u2").await.unwrap());
    assert!(!social.is_following("u1", "u2").await.unwrap());
    assert!(!db.read(&paths::followers("u2", "u1")).await.unwrap().exists());

    let err = social.follow("u1", "u1").await.unwrap_err();
    assert!(matches!(err, ClientError::CannotFollowSelf));
}

#[tokio::test]
async fn feed_holds_only_the_viewers_notifications_newest_first() {
    let db = memory_store();
    let client = client_over(db.clone());
    add_user(&client, "u1", "Alice", "alice").await;
    add_user(&client, "u2", "Bob", "bob").await;

    for (sender, recipient, kind, at) in [
        ("u1", "u2", "mention", 1_000),
        ("u1", "u2", "message", 3_000),
        ("u2", "u1", "like", 2_000),
        ("u1", "u2", "follow", 2_000),
        // Sender has no profile: dropped from the feed.
        ("u9", "u2", "like", 4_000),
    ] {
        db.append(
            paths::NOTIFICATIONS,
            json!({
                "type": kind,
                "senderId": sender,
                "recipientId": recipient,
                "read": false,
                "createdAt": at,
            }),
        )
        .await
        .unwrap();
    }

    let mut feed = client.notification_feed();
    let mut rx = feed.watch();
    feed.open("u2").await.unwrap();
    let list = wait_for(&mut rx, |l| !l.is_empty()).await;

    let kinds: Vec<NotificationKind> = list.iter().map(|v| v.notification.kind).collect();
    assert_eq!(
        kinds,
        [NotificationKind::Message, NotificationKind::Follow, NotificationKind::Mention]
    );
    assert_eq!(list[0].target(), NotificationTarget::Inbox);
    assert_eq!(list[0].text, "sent you a message");
    assert_eq!(list[2].text, "mentioned you in a post");

    let follows = feed.of_kind(Some(NotificationKind::Follow));
    assert_eq!(follows.len(), 1);
    assert_eq!(feed.of_kind(None).len(), 3);
    assert!(feed.of_kind(Some(NotificationKind::Comment)).is_empty());

    // Includes the one whose sender is gone; it is still unread in the store.
    assert_eq!(feed.mark_all_read().await.unwrap(), 4);
    wait_for(&mut rx, |l| l.iter().all(|v| v.notification.read)).await;
    assert_eq!(feed.unread_count(), 0);

    // Alice's notification was not touched.
    let alice_unread = db
        .read(paths::NOTIFICATIONS)
        .await
        .unwrap()
        .into_children()
        .into_iter()
        .filter(|(_, n)| n["recipientId"] == "u1" && n["read"] == false)
        .count();
    assert_eq!(alice_unread, 1);
}

#[tokio::test]
async fn closing_the_feed_releases_its_watch() {
    let db = memory_store();
    let client = client_over(db.clone());

    let mut feed = client.notification_feed();
    feed.open("u1").await.unwrap();
    feed.open("u1").await.unwrap();
    assert_eq!(db.watch_count(), 1);

    feed.open("u2").await.unwrap();
    assert_eq!(db.watch_count(), 1);
    assert_eq!(feed.viewer(), Some("u2"));

    feed.close();
    feed.close();
    assert_eq!(db.watch_count(), 0);
    assert_eq!(feed.mark_all_read().await.unwrap(), 0);
}
