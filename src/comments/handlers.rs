use axum::{debug_handler, extract::{rejection::{JsonRejection, QueryRejection}, Path, Query, State}, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{db::Db, page_limit, parse_id, session::SessionUser, AppResult, AppState};

use super::store;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateComment {
    post_id: String,
    content: String,
}

#[derive(Deserialize)]
pub(crate) struct LimitParams {
    limit: Option<i64>,
}

#[debug_handler(state = AppState)]
pub(crate) async fn create(
    State(db): State<Db>,
    SessionUser { auth_id, .. }: SessionUser,
    payload: Result<Json<CreateComment>, JsonRejection>,
) -> AppResult<Json<Value>> {
    let Json(CreateComment { post_id, content }) = payload?;
    let post_id = parse_id(&post_id, "post")?;

    let comment_id = store::create_comment(&db, post_id, &content, &auth_id).await?;
    Ok(Json(json!({ "commentId": comment_id, "success": true })))
}

#[debug_handler(state = AppState)]
pub(crate) async fn delete(
    State(db): State<Db>,
    Path(comment_id): Path<String>,
    SessionUser { auth_id, .. }: SessionUser,
) -> AppResult<Json<Value>> {
    let comment_id = parse_id(&comment_id, "comment")?;
    store::delete_comment(&db, comment_id, &auth_id).await?;
    Ok(Json(json!({ "success": true })))
}

#[debug_handler(state = AppState)]
pub(crate) async fn post_comments(
    State(db): State<Db>,
    Path(post_id): Path<String>,
    params: Result<Query<LimitParams>, QueryRejection>,
) -> AppResult<Json<Value>> {
    let Query(LimitParams { limit }) = params?;
    let post_id = parse_id(&post_id, "post")?;
    let comments = store::get_post_comments(&db, post_id, page_limit(limit, 50)?).await?;
    Ok(Json(json!({ "comments": comments })))
}

#[debug_handler(state = AppState)]
pub(crate) async fn user_comments(
    State(db): State<Db>,
    Path(auth_id): Path<String>,
    params: Result<Query<LimitParams>, QueryRejection>,
) -> AppResult<Json<Value>> {
    let Query(LimitParams { limit }) = params?;
    let comments = store::get_user_comments(&db, &auth_id, page_limit(limit, 20)?).await?;
    Ok(Json(json!({ "comments": comments })))
}
