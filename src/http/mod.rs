use axum::Router;

use crate::AppState;

mod auth;
mod error;
mod handlers;
mod routes;

pub use auth::{AdminToken, Viewer};
pub use error::AppError;

pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(routes::health())
        .merge(routes::feeds())
        .merge(routes::posts())
        .merge(routes::profiles())
        .merge(routes::admin())
        .fallback(handlers::not_found)
        .with_state(state)
}
