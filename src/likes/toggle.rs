use axum::{debug_handler, extract::{Path, State}, Json};
use serde_json::{json, Value};

use crate::{db::Db, parse_id, session::{MaybeUser, SessionUser}, AppResult, AppState};

use super::store;

#[debug_handler(state = AppState)]
pub(crate) async fn toggle(
    State(db): State<Db>,
    Path(post_id): Path<String>,
    SessionUser { auth_id, .. }: SessionUser,
) -> AppResult<Json<Value>> {
    let post_id = parse_id(&post_id, "post")?;
    let liked = store::toggle_like(&db, post_id, &auth_id).await?;
    Ok(Json(json!({ "liked": liked })))
}

/// Anonymous callers have liked nothing.
#[debug_handler(state = AppState)]
pub(crate) async fn check_like(
    State(db): State<Db>,
    Path(post_id): Path<String>,
    MaybeUser(auth_id): MaybeUser,
) -> AppResult<Json<Value>> {
    let Some(auth_id) = auth_id else {
        return Ok(Json(json!({ "liked": false })));
    };

    let post_id = parse_id(&post_id, "post")?;
    let liked = store::has_liked(&db, post_id, &auth_id).await?;
    Ok(Json(json!({ "liked": liked })))
}
