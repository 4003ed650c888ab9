use axum::{debug_handler, extract::{rejection::QueryRejection, Path, Query, State}, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{db::Db, page_limit, parse_id, AppResult, AppState};

use super::store;

#[derive(Deserialize)]
pub(crate) struct LimitParams {
    limit: Option<i64>,
}

#[debug_handler(state = AppState)]
pub(crate) async fn post_likes(
    State(db): State<Db>,
    Path(post_id): Path<String>,
    params: Result<Query<LimitParams>, QueryRejection>,
) -> AppResult<Json<Value>> {
    let Query(LimitParams { limit }) = params?;
    let post_id = parse_id(&post_id, "post")?;
    let likes = store::get_post_likes(&db, post_id, page_limit(limit, 50)?).await?;
    Ok(Json(json!({ "likes": likes })))
}

#[debug_handler(state = AppState)]
pub(crate) async fn user_likes(
    State(db): State<Db>,
    Path(auth_id): Path<String>,
    params: Result<Query<LimitParams>, QueryRejection>,
) -> AppResult<Json<Value>> {
    let Query(LimitParams { limit }) = params?;
    let likes = store::get_user_likes(&db, &auth_id, page_limit(limit, 20)?).await?;
    Ok(Json(json!({ "likes": likes })))
}
