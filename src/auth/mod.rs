mod clients;
mod login;
mod lockin;
mod logout;
mod me;
mod userinfo;

use axum::{routing::get, Router};

use crate::AppState;

pub use clients::{ClientProvider, Clients};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login/{provider}", get(login::login))
        .route("/lockin/{provider}", get(lockin::lockin))
        .route("/logout", get(logout::logout))
        .route("/api/me", get(me::me))
}

/// Only same-site paths are followed after login and logout.
pub(crate) fn safe_return_url(url: &str) -> Option<&str> {
    (url.starts_with('/') && !url.starts_with("//") && !url.contains('\\')).then_some(url)
}
