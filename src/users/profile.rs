use axum::{debug_handler, extract::{rejection::JsonRejection, State}, Json};
use serde_json::{json, Value};

use crate::{db::Db, session::SessionUser, AppError, AppResult, AppState};

use super::store::{self, ProfilePatch};

const MAX_NAME_CHARS: usize = 100;
const MAX_BIO_CHARS: usize = 500;

fn trimmed(field: Option<String>) -> Option<String> {
    field.map(|s| s.trim().to_owned())
}

#[debug_handler(state = AppState)]
pub(crate) async fn update_me(
    State(db): State<Db>,
    SessionUser { auth_id, .. }: SessionUser,
    payload: Result<Json<ProfilePatch>, JsonRejection>,
) -> AppResult<Json<Value>> {
    let Json(patch) = payload?;
    let patch = ProfilePatch {
        name: trimmed(patch.name),
        image: trimmed(patch.image),
        bio: trimmed(patch.bio),
    };

    if patch.name.as_deref().is_some_and(|name| name.is_empty() || name.chars().count() > MAX_NAME_CHARS) {
        return Err(AppError::validation(format!("name must be 1 to {MAX_NAME_CHARS} characters")));
    }
    if patch.bio.as_deref().is_some_and(|bio| bio.chars().count() > MAX_BIO_CHARS) {
        return Err(AppError::validation(format!("bio must be at most {MAX_BIO_CHARS} characters")));
    }

    let user = store::update_profile(&db, &auth_id, patch).await?;
    Ok(Json(json!({ "user": user })))
}
