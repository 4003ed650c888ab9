mod payments;
pub mod signature;

use axum::{routing::post, Router};

use crate::AppState;

pub use signature::WebhookSecret;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/payments", post(payments::payments))
}
