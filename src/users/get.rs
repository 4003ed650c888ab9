use axum::{debug_handler, extract::{rejection::JsonRejection, Path, State}, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{db::Db, models::User, AppError, AppResult, AppState};

use super::store;

const MAX_BATCH: usize = 100;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BatchRequest {
    auth_ids: Vec<String>,
}

#[debug_handler(state = AppState)]
pub(crate) async fn user(
    State(db): State<Db>,
    Path(auth_id): Path<String>,
) -> AppResult<Json<User>> {
    store::get_user(&db, &auth_id)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound("User"))
}

#[debug_handler(state = AppState)]
pub(crate) async fn batch(
    State(db): State<Db>,
    payload: Result<Json<BatchRequest>, JsonRejection>,
) -> AppResult<Json<Value>> {
    let Json(BatchRequest { auth_ids }) = payload?;
    if auth_ids.len() > MAX_BATCH {
        return Err(AppError::validation(format!("at most {MAX_BATCH} authIds per request")));
    }

    let users = store::get_users(&db, &auth_ids).await?;
    Ok(Json(json!({ "users": users })))
}
