use axum::{routing::get, routing::post, Router};

use crate::http::handlers;
use crate::AppState;

pub fn health() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health))
}

pub fn feeds() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::index))
        .route("/group/:slug/", get(handlers::group_posts))
        .route("/follow/", get(handlers::follow_index))
}

pub fn posts() -> Router<AppState> {
    Router::new()
        .route("/create/", post(handlers::post_create))
        .route("/posts/:id/", get(handlers::post_detail))
        .route("/posts/:id/edit/", post(handlers::post_edit))
        .route("/posts/:id/comment", post(handlers::add_comment))
}

pub fn profiles() -> Router<AppState> {
    Router::new()
        .route("/profile/:username/", get(handlers::profile))
        .route(
            "/profile/:username/follow",
            get(handlers::profile_follow).post(handlers::profile_follow),
        )
        .route(
            "/profile/:username/unfollow",
            get(handlers::profile_unfollow).post(handlers::profile_unfollow),
        )
}

pub fn admin() -> Router<AppState> {
    Router::new()
        .route("/admin/cache/clear", post(handlers::clear_cache))
        .route("/admin/groups", post(handlers::create_group))
        .route("/admin/users", post(handlers::provision_user))
}
