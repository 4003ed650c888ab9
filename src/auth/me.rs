use axum::{debug_handler, extract::State, Json};
use serde_json::{json, Value};

use crate::{db::Db, session::SessionUser, users::store::get_user, AppError, AppResult, AppState};

#[debug_handler(state = AppState)]
pub(crate) async fn me(
    State(db): State<Db>,
    SessionUser { auth_id, .. }: SessionUser,
) -> AppResult<Json<Value>> {
    let user = get_user(&db, &auth_id).await?.ok_or(AppError::NotFound("User"))?;
    Ok(Json(json!({ "user": user })))
}
