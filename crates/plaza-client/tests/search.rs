mod common;

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, advance};

use plaza_types::paths;

use common::{TestStore, add_user, client_over, memory_store};

async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test(start_paused = true)]
async fn burst_of_keystrokes_runs_one_lookup_after_quiet_period() {
    let store = Arc::new(TestStore::counting(memory_store(), paths::USERS));
    let client = client_over(store.clone());
    add_user(&client, "u0", "Alan", "al_the_searcher").await;
    add_user(&client, "u1", "Alice", "alice").await;
    add_user(&client, "u2", "Bob", "bob").await;
    add_user(&client, "u3", "Dmitri", "SALLY").await;

    let (mut search, mut outcomes) = client.search("u0");

    search.input("al");
    advance(Duration::from_millis(40)).await;
    search.input("ali");
    advance(Duration::from_millis(40)).await;
    search.input("al");
    let last_keystroke = Instant::now();

    advance(Duration::from_millis(499)).await;
    settle().await;
    assert!(outcomes.try_recv().is_err());
    assert_eq!(store.reads(), 0);

    let outcome = outcomes.recv().await.unwrap();
    assert!(last_keystroke.elapsed() >= Duration::from_millis(500));
    assert_eq!(outcome.query, "al");

    let found = outcome.result.unwrap();
    let uids: Vec<&str> = found.iter().map(|p| p.uid.as_str()).collect();
    assert_eq!(uids, ["u1", "u3"]);

    settle().await;
    assert_eq!(store.reads(), 1);
    assert!(outcomes.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn single_character_query_answers_immediately_without_lookup() {
    let store = Arc::new(TestStore::counting(memory_store(), paths::USERS));
    let client = client_over(store.clone());
    let (mut search, mut outcomes) = client.search("u0");

    search.input("a");
    let outcome = outcomes.try_recv().unwrap();
    assert_eq!(outcome.query, "a");
    assert!(outcome.result.unwrap().is_empty());

    advance(Duration::from_secs(2)).await;
    settle().await;
    assert_eq!(store.reads(), 0);
}

#[tokio::test(start_paused = true)]
async fn dropping_the_debouncer_cancels_pending_lookup() {
    let store = Arc::new(TestStore::counting(memory_store(), paths::USERS));
    let client = client_over(store.clone());
    let (mut search, mut outcomes) = client.search("u0");

    search.input("bob");
    drop(search);

    advance(Duration::from_secs(2)).await;
    settle().await;
    assert_eq!(store.reads(), 0);
    assert!(outcomes.recv().await.is_none());
}
