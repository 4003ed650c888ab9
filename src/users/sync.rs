use axum::{debug_handler, extract::State, Json};
use serde_json::{json, Value};
use tracing::info;

use crate::{
    db::Db,
    session::{ProviderProfile, SessionUser, PROFILE},
    AppError, AppResult, AppState,
};

use super::store::{self, UpsertUser};

/// Copies the identity the provider handed over at login into the users table.
#[debug_handler(state = AppState)]
pub(crate) async fn sync(
    State(db): State<Db>,
    SessionUser { auth_id, session }: SessionUser,
) -> AppResult<Json<Value>> {
    let Some(profile) = session.get::<ProviderProfile>(PROFILE).await? else {
        return Err(AppError::Unauthorized);
    };
    if profile.auth_id != auth_id {
        return Err(AppError::Unauthorized);
    }

    let user = store::upsert_user(&db, UpsertUser {
        auth_id: profile.auth_id,
        name: profile.name,
        email: profile.email,
        image: profile.image,
        bio: None,
    }).await?;

    info!("synced {}", user.auth_id);
    Ok(Json(json!({ "message": "User synced successfully", "user": user })))
}
