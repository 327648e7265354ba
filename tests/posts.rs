//! Post Tests
//!
//! Covers post creation, editing, the detail view, and comments.

mod common;

use axum::http::StatusCode;
use common::{app, TEST_LOGIN_URL};
use serde_json::json;

use chronicle::infra::store::Store;

// ===========================================================================
// Create
// ===========================================================================

#[tokio::test]
async fn create_post_redirects_to_profile() {
    let app = app();
    let author = app.create_user("leo").await;
    let group = app.create_group("cats").await;

    let resp = app
        .post_json(
            "/create/",
            json!({ "text": "  hello there  ", "group": "cats" }),
            author.token(),
        )
        .await;

    assert_eq!(resp.status, StatusCode::SEE_OTHER);
    assert_eq!(resp.location.as_deref(), Some("/profile/leo/"));

    let feed = app.get("/group/cats/", None).await;
    let item = &feed.json()["page"]["items"][0];
    assert_eq!(item["text"], "hello there");
    assert_eq!(item["author_username"], "leo");
    assert_eq!(item["group"]["id"], group.id);
}

#[tokio::test]
async fn create_post_requires_login() {
    let app = app();

    let resp = app.post_json("/create/", json!({ "text": "hi" }), None).await;

    assert_eq!(resp.status, StatusCode::SEE_OTHER);
    assert_eq!(resp.location.as_deref(), Some(TEST_LOGIN_URL));
}

#[tokio::test]
async fn create_post_rejects_blank_text() {
    let app = app();
    let author = app.create_user("leo").await;

    let resp = app
        .post_json("/create/", json!({ "text": "   " }), author.token())
        .await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.error_message(), "validation failed");
    assert!(resp.json()["fields"]["text"].is_array());
}

#[tokio::test]
async fn create_post_without_body_is_invalid() {
    let app = app();
    let author = app.create_user("leo").await;

    let resp = app.post_empty("/create/", author.token()).await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert!(resp.json()["fields"]["text"].is_array());
}

#[tokio::test]
async fn create_post_rejects_unknown_group_and_bad_image() {
    let app = app();
    let author = app.create_user("leo").await;

    let resp = app
        .post_json(
            "/create/",
            json!({ "text": "hi", "group": "nope", "image": "../etc/passwd" }),
            author.token(),
        )
        .await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    let fields = &resp.json()["fields"];
    assert!(fields["group"].is_array());
    assert!(fields["image"].is_array());
    assert!(fields["text"].is_null());

    let index = app.get("/", None).await;
    assert!(index.post_texts().is_empty());
}

// ===========================================================================
// Detail
// ===========================================================================

#[tokio::test]
async fn detail_shows_post_count_and_comments() {
    let app = app();
    let author = app.create_user("leo").await;
    let reader = app.create_user("reader").await;
    let post = app.create_post(&author, "the post", None).await;
    app.create_post(&author, "another", None).await;

    app.post_json(
        &format!("/posts/{}/comment", post.id),
        json!({ "text": "first!" }),
        reader.token(),
    )
    .await;
    app.post_json(
        &format!("/posts/{}/comment", post.id),
        json!({ "text": "second" }),
        author.token(),
    )
    .await;

    let resp = app.get(&format!("/posts/{}/", post.id), None).await;

    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();
    assert_eq!(body["post"]["text"], "the post");
    assert_eq!(body["author_post_count"], 2);
    let comments = body["comments"].as_array().unwrap();
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0]["text"], "first!");
    assert_eq!(comments[0]["author_username"], "reader");
    assert_eq!(comments[1]["text"], "second");
}

#[tokio::test]
async fn detail_unknown_post_is_not_found() {
    let app = app();

    assert_eq!(app.get("/posts/999/", None).await.status, StatusCode::NOT_FOUND);
    assert_eq!(app.get("/posts/abc/", None).await.status, StatusCode::NOT_FOUND);
}

// ===========================================================================
// Edit
// ===========================================================================

#[tokio::test]
async fn author_can_edit_post() {
    let app = app();
    let author = app.create_user("leo").await;
    let post = app.create_post(&author, "draft", None).await;

    let resp = app
        .post_json(
            &format!("/posts/{}/edit/", post.id),
            json!({ "text": "final" }),
            author.token(),
        )
        .await;

    assert_eq!(resp.status, StatusCode::SEE_OTHER);
    assert_eq!(resp.location, Some(format!("/posts/{}/", post.id)));

    let stored = app.state.store.find_post(post.id).await.unwrap().unwrap();
    assert_eq!(stored.text, "final");
    assert_eq!(stored.created_at, post.created_at);
}

#[tokio::test]
async fn edit_without_image_keeps_existing_image() {
    let app = app();
    let author = app.create_user("leo").await;
    app.post_json(
        "/create/",
        json!({ "text": "pic", "image": "posts/cat.png" }),
        author.token(),
    )
    .await;
    let post_id = app.get("/", None).await.json()["page"]["items"][0]["id"]
        .as_i64()
        .unwrap();

    app.post_json(
        &format!("/posts/{}/edit/", post_id),
        json!({ "text": "pic, edited" }),
        author.token(),
    )
    .await;

    let stored = app.state.store.find_post(post_id).await.unwrap().unwrap();
    assert_eq!(stored.text, "pic, edited");
    assert_eq!(stored.image.as_deref(), Some("posts/cat.png"));
}

#[tokio::test]
async fn non_author_edit_redirects_without_change() {
    let app = app();
    let author = app.create_user("leo").await;
    let intruder = app.create_user("intruder").await;
    let post = app.create_post(&author, "mine", None).await;

    let resp = app
        .post_json(
            &format!("/posts/{}/edit/", post.id),
            json!({ "text": "yours now" }),
            intruder.token(),
        )
        .await;

    assert_eq!(resp.status, StatusCode::SEE_OTHER);
    assert_eq!(resp.location, Some(format!("/posts/{}/", post.id)));
    let stored = app.state.store.find_post(post.id).await.unwrap().unwrap();
    assert_eq!(stored.text, "mine");
}

#[tokio::test]
async fn anonymous_edit_redirects_to_detail() {
    let app = app();
    let author = app.create_user("leo").await;
    let post = app.create_post(&author, "mine", None).await;

    let resp = app
        .post_json(&format!("/posts/{}/edit/", post.id), json!({ "text": "x" }), None)
        .await;

    assert_eq!(resp.status, StatusCode::SEE_OTHER);
    assert_eq!(resp.location, Some(format!("/posts/{}/", post.id)));
}

#[tokio::test]
async fn invalid_edit_is_rejected() {
    let app = app();
    let author = app.create_user("leo").await;
    let post = app.create_post(&author, "mine", None).await;

    let resp = app
        .post_json(&format!("/posts/{}/edit/", post.id), json!({ "text": "" }), author.token())
        .await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    let stored = app.state.store.find_post(post.id).await.unwrap().unwrap();
    assert_eq!(stored.text, "mine");
}

#[tokio::test]
async fn edit_unknown_post_is_not_found() {
    let app = app();
    let author = app.create_user("leo").await;

    let resp = app
        .post_json("/posts/42/edit/", json!({ "text": "x" }), author.token())
        .await;

    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

// ===========================================================================
// Comments
// ===========================================================================

#[tokio::test]
async fn comment_redirects_to_detail() {
    let app = app();
    let author = app.create_user("leo").await;
    let reader = app.create_user("reader").await;
    let post = app.create_post(&author, "the post", None).await;

    let resp = app
        .post_json(
            &format!("/posts/{}/comment", post.id),
            json!({ "text": "nice" }),
            reader.token(),
        )
        .await;

    assert_eq!(resp.status, StatusCode::SEE_OTHER);
    assert_eq!(resp.location, Some(format!("/posts/{}/", post.id)));
    assert_eq!(app.state.store.list_comments(post.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn anonymous_comment_redirects_to_login() {
    let app = app();
    let author = app.create_user("leo").await;
    let post = app.create_post(&author, "the post", None).await;

    let resp = app
        .post_json(&format!("/posts/{}/comment", post.id), json!({ "text": "hi" }), None)
        .await;

    assert_eq!(resp.status, StatusCode::SEE_OTHER);
    assert_eq!(resp.location.as_deref(), Some(TEST_LOGIN_URL));
    assert!(app.state.store.list_comments(post.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn invalid_comment_is_not_stored() {
    let app = app();
    let author = app.create_user("leo").await;
    let post = app.create_post(&author, "the post", None).await;
    let path = format!("/posts/{}/comment", post.id);

    let blank = app.post_json(&path, json!({ "text": "  " }), author.token()).await;
    let missing = app.post_empty(&path, author.token()).await;
    for resp in [blank, missing] {
        assert_eq!(resp.status, StatusCode::SEE_OTHER);
        assert_eq!(resp.location, Some(format!("/posts/{}/", post.id)));
    }
    assert!(app.state.store.list_comments(post.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn long_comment_is_stored_whole() {
    let app = app();
    let author = app.create_user("leo").await;
    let post = app.create_post(&author, "the post", None).await;
    let text = "x".repeat(5000);

    let resp = app
        .post_json(&format!("/posts/{}/comment", post.id), json!({ "text": text }), author.token())
        .await;

    assert_eq!(resp.status, StatusCode::SEE_OTHER);
    let comments = app.state.store.list_comments(post.id).await.unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].text.len(), 5000);
}

#[tokio::test]
async fn comment_on_unknown_post_is_not_found() {
    let app = app();
    let reader = app.create_user("reader").await;

    let resp = app
        .post_json("/posts/77/comment", json!({ "text": "hello?" }), reader.token())
        .await;

    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}
