// Logical store layout. Every path the client touches is built here.

pub const CONVERSATIONS: &str = "conversations";
pub const NOTIFICATIONS: &str = "notifications";
pub const USERS: &str = "users";
pub const POSTS: &str = "posts";

pub fn conversation(id: &str) -> String {
    format!("{CONVERSATIONS}/{id}")
}

pub fn messages(conversation_id: &str) -> String {
    format!("messages/{conversation_id}")
}

pub fn message(conversation_id: &str, message_id: &str) -> String {
    format!("messages/{conversation_id}/{message_id}")
}

pub fn notification(id: &str) -> String {
    format!("{NOTIFICATIONS}/{id}")
}

pub fn user(uid: &str) -> String {
    format!("{USERS}/{uid}")
}

pub fn post(post_id: &str) -> String {
    format!("{POSTS}/{post_id}")
}

pub fn post_like(post_id: &str, uid: &str) -> String {
    format!("{POSTS}/{post_id}/likes/{uid}")
}

pub fn post_comments(post_id: &str) -> String {
    format!("{POSTS}/{post_id}/comments")
}

/// `follower` follows `followee`: `users/{follower}/following/{followee}`.
pub fn following(follower: &str, followee: &str) -> String {
    format!("{USERS}/{follower}/following/{followee}")
}

/// Mirror edge of [`following`]: `users/{followee}/followers/{follower}`.
pub fn followers(followee: &str, follower: &str) -> String {
    format!("{USERS}/{followee}/followers/{follower}")
}
