use anyhow::anyhow;
use axum::{extract::FromRequestParts, http::request::Parts};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::{AppError, AppResult};

pub const USER_ID: &str = "user_id";
pub const PROFILE: &str = "profile";
pub const CSRF_STATE: &str = "csrf_state";
pub const PKCE_VERIFIER: &str = "pkce_verifier";
pub const RETURN_URL: &str = "return_url";

/// Identity data handed over by the OAuth provider at login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderProfile {
    pub auth_id: String,
    pub name: Option<String>,
    pub email: String,
    pub image: Option<String>,
}

/// The signed-in caller. Rejects with 401 when the session carries no user.
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub auth_id: String,
    pub session: Session,
}

/// The caller if signed in, for routes that also serve anonymous readers.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<String>);

async fn session_from_parts<S: Send + Sync>(parts: &mut Parts, state: &S) -> AppResult<Session> {
    Session::from_request_parts(parts, state)
        .await
        .map_err(|(_, msg)| AppError::Unexpected(anyhow!(msg)))
}

impl<S: Send + Sync> FromRequestParts<S> for SessionUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = session_from_parts(parts, state).await?;
        let Some(auth_id) = session.get::<String>(USER_ID).await? else {
            return Err(AppError::Unauthorized);
        };

        Ok(SessionUser { auth_id, session })
    }
}

impl<S: Send + Sync> FromRequestParts<S> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = session_from_parts(parts, state).await?;
        Ok(MaybeUser(session.get::<String>(USER_ID).await?))
    }
}
