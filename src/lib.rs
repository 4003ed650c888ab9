pub mod appresult;
pub mod auth;
pub mod comments;
pub mod config;
pub mod db;
pub mod likes;
pub mod models;
pub mod posts;
pub mod session;
pub mod storage;
pub mod uploads;
pub mod users;
pub mod webhooks;

use std::sync::Arc;

use axum::{
    extract::FromRef,
    http::{header, HeaderValue, Method},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tower_sessions::{cookie::SameSite, Expiry, MemoryStore, SessionManagerLayer};
use tracing::warn;
use uuid::Uuid;

pub use appresult::{AppError, AppResult};
use config::{Config, StorageBackend};

#[derive(Clone, FromRef)]
pub struct AppState {
    pub db: db::Db,
    pub clients: auth::Clients,
    pub storage: storage::Storage,
    pub config: Arc<Config>,
}

pub trait GetField {
    fn get_str_field(&self, field: &str) -> AppResult<String>;
    fn get_obj_field(&self, field: &str) -> AppResult<&Value>;
}

impl GetField for serde_json::Value {
    fn get_str_field(&self, field: &str) -> AppResult<String> {
        Ok(
            self.get(field)
            .ok_or(format!("expected {field} in {self}"))?
            .as_str()
            .ok_or(format!("expected {field} in {self} to be string"))?
            .to_owned()
        )
    }

    fn get_obj_field(&self, field: &str) -> AppResult<&Value> {
        self.get(field)
        .ok_or(format!("expected {field} in {self}").into())
    }
}

pub fn parse_id(raw: &str, what: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::validation(format!("Invalid {what} id")))
}

pub const MAX_PAGE: i64 = 100;

/// Page size from an optional `limit` query value. Zero and negatives are
/// rejected, anything above [`MAX_PAGE`] is capped.
pub fn page_limit(limit: Option<i64>, default: i64) -> AppResult<i64> {
    match limit.unwrap_or(default) {
        n if n < 1 => Err(AppError::validation("limit must be at least 1")),
        n => Ok(n.min(MAX_PAGE)),
    }
}

/// Every route, without middleware or state.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(health))
        .merge(auth::router())
        .nest("/api/posts", posts::router())
        .nest("/api/likes", likes::router())
        .nest("/api/comments", comments::router())
        .nest("/api/users", users::router())
        .nest("/api/upload", uploads::router())
        .nest("/api/webhooks", webhooks::router())
}

pub fn session_layer(config: &Config) -> SessionManagerLayer<MemoryStore> {
    SessionManagerLayer::new(MemoryStore::default())
        .with_secure(config.secure_cookies)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(config.session_inactivity_minutes)))
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring CORS origin {origin}: {e}");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

/// The full application: routes, local upload serving, CORS, request tracing
/// and cookie sessions.
pub fn app(state: AppState) -> Router {
    let mut router = router();
    if let StorageBackend::Local { dir } = &state.config.storage {
        router = router.nest_service("/uploads", ServeDir::new(dir));
    }

    router
        .layer(cors_layer(&state.config))
        .layer(TraceLayer::new_for_http())
        .layer(session_layer(&state.config))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "message": "Layer 0 Backend API", "status": "running" }))
}
