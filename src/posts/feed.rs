use axum::{debug_handler, extract::{rejection::QueryRejection, Path, Query, State}, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{db::Db, page_limit, AppResult, AppState};

use super::store::{self, FeedCursor, FeedPage, FeedQuery, FeedScope};

const FEED_PAGE: i64 = 20;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FeedParams {
    limit: Option<i64>,
    cursor: Option<String>,
    group_id: Option<String>,
    channel_id: Option<String>,
}

#[derive(Deserialize)]
pub(crate) struct LimitParams {
    limit: Option<i64>,
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[debug_handler(state = AppState)]
pub(crate) async fn feed(
    State(db): State<Db>,
    params: Result<Query<FeedParams>, QueryRejection>,
) -> AppResult<Json<FeedPage>> {
    let Query(FeedParams { limit, cursor, group_id, channel_id }) = params?;

    let query = FeedQuery {
        limit: page_limit(limit, FEED_PAGE)?,
        cursor: blank_to_none(cursor).map(|c| c.parse::<FeedCursor>()).transpose()?,
        scope: FeedScope::new(blank_to_none(group_id), blank_to_none(channel_id)),
    };

    Ok(Json(store::get_posts(&db, query).await?))
}

#[debug_handler(state = AppState)]
pub(crate) async fn user_posts(
    State(db): State<Db>,
    Path(auth_id): Path<String>,
    params: Result<Query<LimitParams>, QueryRejection>,
) -> AppResult<Json<Value>> {
    let Query(LimitParams { limit }) = params?;
    let posts = store::get_user_posts(&db, &auth_id, page_limit(limit, FEED_PAGE)?).await?;
    Ok(Json(json!({ "posts": posts })))
}
