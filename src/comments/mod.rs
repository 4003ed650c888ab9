mod handlers;
pub mod store;

use axum::{routing::{delete, get, post}, Router};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::create))
        .route("/post/{post_id}", get(handlers::post_comments))
        .route("/user/{auth_id}", get(handlers::user_comments))
        .route("/{comment_id}", delete(handlers::delete))
}
