use axum::{debug_handler, extract::{Path, State}, Json};
use serde_json::{json, Value};

use crate::{db::Db, parse_id, session::SessionUser, AppError, AppResult, AppState};

use super::store;

#[debug_handler(state = AppState)]
pub(crate) async fn post(
    State(db): State<Db>,
    Path(post_id): Path<String>,
) -> AppResult<Json<Value>> {
    let post_id = parse_id(&post_id, "post")?;
    let post = store::get_post(&db, post_id).await?.ok_or(AppError::NotFound("Post"))?;
    Ok(Json(json!({ "post": post })))
}

#[debug_handler(state = AppState)]
pub(crate) async fn delete(
    State(db): State<Db>,
    Path(post_id): Path<String>,
    SessionUser { auth_id, .. }: SessionUser,
) -> AppResult<Json<Value>> {
    let post_id = parse_id(&post_id, "post")?;
    store::delete_post(&db, post_id, &auth_id).await?;
    Ok(Json(json!({ "success": true })))
}
