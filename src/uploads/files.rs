use axum::{
    debug_handler,
    extract::{multipart::MultipartRejection, rejection::{JsonRejection, QueryRejection}, Multipart, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    session::SessionUser,
    storage::{SignedUpload, Storage, AVATAR_FOLDER},
    AppError, AppResult, AppState,
};

use super::read_form;

const FILE_FIELD: &str = "file";
const DEFAULT_FOLDER: &str = "uploads";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SignedUrlQuery {
    file_name: String,
    content_type: String,
    folder: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DeleteRequest {
    file_url: String,
}

#[debug_handler(state = AppState)]
pub(crate) async fn upload(
    State(storage): State<Storage>,
    _caller: SessionUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<Value>> {
    let mut form = read_form(multipart?, FILE_FIELD).await?;
    let Some(file) = form.file.take() else {
        return Err(AppError::validation("No file provided"));
    };
    let folder = form
        .fields
        .remove("folder")
        .filter(|f| !f.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_FOLDER.to_owned());

    let file_url = storage
        .upload(folder.trim(), &file.file_name, &file.content_type, file.bytes)
        .await?;

    Ok(Json(json!({ "message": "File uploaded successfully", "fileUrl": file_url })))
}

#[debug_handler(state = AppState)]
pub(crate) async fn signed_url(
    State(storage): State<Storage>,
    _caller: SessionUser,
    query: Result<Query<SignedUrlQuery>, QueryRejection>,
) -> AppResult<Json<SignedUpload>> {
    let Query(SignedUrlQuery { file_name, content_type, folder }) = query?;
    let folder = folder.unwrap_or_else(|| DEFAULT_FOLDER.to_owned());

    Ok(Json(storage.signed_upload(&folder, &file_name, &content_type).await?))
}

#[debug_handler(state = AppState)]
pub(crate) async fn delete(
    State(storage): State<Storage>,
    _caller: SessionUser,
    payload: Result<Json<DeleteRequest>, JsonRejection>,
) -> AppResult<Json<Value>> {
    let Json(DeleteRequest { file_url }) = payload?;
    if file_url.trim().is_empty() {
        return Err(AppError::validation("fileUrl is required"));
    }
    if storage.is_in_folder(&file_url, AVATAR_FOLDER) {
        return Err(AppError::Forbidden("Avatars are removed through the avatar route"));
    }

    storage.delete(&file_url).await?;
    Ok(Json(json!({ "message": "File deleted successfully" })))
}
