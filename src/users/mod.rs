mod avatar;
mod get;
mod profile;
pub mod store;
mod sync;

use axum::{extract::DefaultBodyLimit, routing::{get, patch, post}, Router};

use crate::{storage::MAX_UPLOAD_BYTES, uploads::MULTIPART_OVERHEAD, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/batch", post(get::batch))
        .route("/sync", post(sync::sync))
        .route("/me", patch(profile::update_me))
        .route("/{auth_id}", get(get::user))
        .route(
            "/{auth_id}/avatar",
            post(avatar::upload_avatar)
                .delete(avatar::remove_avatar)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + MULTIPART_OVERHEAD)),
        )
}
