use axum::{debug_handler, extract::{rejection::JsonRejection, State}, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{db::Db, session::SessionUser, AppResult, AppState};

use super::store::{self, NewPost};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreatePost {
    content: String,
    image_url: Option<String>,
    group_id: Option<String>,
    channel_id: Option<String>,
}

#[debug_handler(state = AppState)]
pub(crate) async fn create(
    State(db): State<Db>,
    SessionUser { auth_id, .. }: SessionUser,
    payload: Result<Json<CreatePost>, JsonRejection>,
) -> AppResult<Json<Value>> {
    let Json(CreatePost { content, image_url, group_id, channel_id }) = payload?;

    let post_id = store::create_post(&db, NewPost {
        content,
        author_auth_id: auth_id,
        image_url,
        group_id,
        channel_id,
    }).await?;

    Ok(Json(json!({ "postId": post_id, "success": true })))
}
