//! Store Tests
//!
//! Covers feed ordering and follow-edge uniqueness at the storage seam.

use time::{Duration, OffsetDateTime};

use chronicle::domain::post::{NewPost, PostFilter};
use chronicle::domain::user::{NewUser, User};
use chronicle::infra::memory::MemoryStore;
use chronicle::infra::store::Store;

async fn user(store: &MemoryStore, username: &str) -> User {
    store
        .create_user(NewUser {
            username: username.to_string(),
            full_name: String::new(),
        })
        .await
        .unwrap()
        .unwrap()
}

fn new_post(author: &User, text: &str) -> NewPost {
    NewPost {
        author_id: author.id,
        group_id: None,
        text: text.to_string(),
        image: None,
    }
}

// ===========================================================================
// Ordering
// ===========================================================================

#[tokio::test]
async fn equal_timestamps_order_by_id_descending() {
    let store = MemoryStore::new();
    let author = user(&store, "leo").await;
    let stamp = OffsetDateTime::now_utc();

    let mut ids = Vec::new();
    for n in 1..=4 {
        let post = store
            .create_post_at(new_post(&author, &format!("post {}", n)), stamp)
            .await
            .unwrap();
        ids.push(post.id);
    }

    let listed: Vec<i64> = store
        .list_posts(PostFilter::All, 10, 0)
        .await
        .unwrap()
        .iter()
        .map(|post| post.id)
        .collect();

    ids.reverse();
    assert_eq!(listed, ids);
}

#[tokio::test]
async fn newer_timestamp_wins_over_higher_id() {
    let store = MemoryStore::new();
    let author = user(&store, "leo").await;
    let now = OffsetDateTime::now_utc();

    let newest = store
        .create_post_at(new_post(&author, "newest"), now)
        .await
        .unwrap();
    let oldest = store
        .create_post_at(new_post(&author, "oldest"), now - Duration::hours(2))
        .await
        .unwrap();
    let tied_low = store
        .create_post_at(new_post(&author, "tied low"), now - Duration::hours(1))
        .await
        .unwrap();
    let tied_high = store
        .create_post_at(new_post(&author, "tied high"), now - Duration::hours(1))
        .await
        .unwrap();

    let listed: Vec<i64> = store
        .list_posts(PostFilter::Author(author.id), 10, 0)
        .await
        .unwrap()
        .iter()
        .map(|post| post.id)
        .collect();

    assert_eq!(listed, vec![newest.id, tied_high.id, tied_low.id, oldest.id]);
}

#[tokio::test]
async fn tied_posts_split_across_pages_without_overlap() {
    let store = MemoryStore::new();
    let author = user(&store, "leo").await;
    let stamp = OffsetDateTime::now_utc();
    for n in 1..=15 {
        store
            .create_post_at(new_post(&author, &format!("post {}", n)), stamp)
            .await
            .unwrap();
    }

    let mut seen: Vec<i64> = store
        .list_posts(PostFilter::All, 10, 0)
        .await
        .unwrap()
        .iter()
        .map(|post| post.id)
        .collect();
    seen.extend(
        store
            .list_posts(PostFilter::All, 10, 10)
            .await
            .unwrap()
            .iter()
            .map(|post| post.id),
    );

    let expected: Vec<i64> = (1..=15).rev().collect();
    assert_eq!(seen, expected);
}

// ===========================================================================
// Follow edges
// ===========================================================================

#[tokio::test]
async fn repeated_follow_stores_one_edge() {
    let store = MemoryStore::new();
    let reader = user(&store, "reader").await;
    let writer = user(&store, "writer").await;

    assert!(store.follow(reader.id, writer.id).await.unwrap());
    assert!(!store.follow(reader.id, writer.id).await.unwrap());
    assert!(!store.follow(reader.id, writer.id).await.unwrap());

    assert_eq!(store.follow_edges(reader.id, writer.id).await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_follows_store_one_edge() {
    let store = MemoryStore::new();
    let reader = user(&store, "reader").await;
    let writer = user(&store, "writer").await;

    let (first, second) = tokio::join!(
        store.follow(reader.id, writer.id),
        store.follow(reader.id, writer.id)
    );
    let mut inserted = vec![first.unwrap(), second.unwrap()];
    inserted.sort();

    assert_eq!(inserted, vec![false, true]);
    assert_eq!(store.follow_edges(reader.id, writer.id).await, 1);
}

#[tokio::test]
async fn self_follow_stores_no_edge() {
    let store = MemoryStore::new();
    let reader = user(&store, "reader").await;

    assert!(!store.follow(reader.id, reader.id).await.unwrap());
    assert_eq!(store.follow_edges(reader.id, reader.id).await, 0);
}

#[tokio::test]
async fn unfollow_without_edge_stores_nothing() {
    let store = MemoryStore::new();
    let reader = user(&store, "reader").await;
    let writer = user(&store, "writer").await;

    assert!(!store.unfollow(reader.id, writer.id).await.unwrap());
    assert_eq!(store.follow_edges(reader.id, writer.id).await, 0);
}
