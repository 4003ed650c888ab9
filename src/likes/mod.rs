mod list;
pub mod store;
mod toggle;

use axum::{routing::{get, post}, Router};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/user/{auth_id}", get(list::user_likes))
        .route("/{post_id}", get(list::post_likes))
        .route("/{post_id}/toggle", post(toggle::toggle))
        .route("/{post_id}/check", get(toggle::check_like))
}
