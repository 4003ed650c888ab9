mod create;
mod feed;
mod post;
pub mod store;

use axum::{routing::get, Router};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(feed::feed).post(create::create))
        .route("/user/{auth_id}", get(feed::user_posts))
        .route("/{post_id}", get(post::post).delete(post::delete))
}
