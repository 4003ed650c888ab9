use axum::{debug_handler, extract::{multipart::MultipartRejection, Multipart, Path, State}, Json};
use serde_json::{json, Value};
use tracing::warn;

use crate::{
    db::Db,
    session::SessionUser,
    storage::{Storage, AVATAR_FOLDER},
    uploads::read_form,
    AppError, AppResult, AppState,
};

use super::store;

const AVATAR_FIELD: &str = "avatar";

fn check_owner(auth_id: &str, caller: &str) -> AppResult<()> {
    if auth_id != caller {
        return Err(AppError::Forbidden("Only the account owner may change its avatar"));
    }
    Ok(())
}

#[debug_handler(state = AppState)]
pub(crate) async fn upload_avatar(
    State(db): State<Db>,
    State(storage): State<Storage>,
    Path(auth_id): Path<String>,
    SessionUser { auth_id: caller, .. }: SessionUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<Value>> {
    check_owner(&auth_id, &caller)?;

    let form = read_form(multipart?, AVATAR_FIELD).await?;
    let Some(file) = form.file else {
        return Err(AppError::validation("No file provided"));
    };

    let current = store::get_user(&db, &auth_id).await?.ok_or(AppError::NotFound("User"))?;

    let avatar_url = storage
        .upload(AVATAR_FOLDER, &file.file_name, &file.content_type, file.bytes)
        .await?;

    if let Some(old) = current.image.as_deref() {
        if let Err(e) = storage.delete(old).await {
            warn!("Failed to delete old avatar {old}: {e}");
        }
    }

    let user = store::set_avatar(&db, &auth_id, Some(&avatar_url)).await?;
    Ok(Json(json!({ "message": "Avatar uploaded successfully", "user": user })))
}

#[debug_handler(state = AppState)]
pub(crate) async fn remove_avatar(
    State(db): State<Db>,
    State(storage): State<Storage>,
    Path(auth_id): Path<String>,
    SessionUser { auth_id: caller, .. }: SessionUser,
) -> AppResult<Json<Value>> {
    check_owner(&auth_id, &caller)?;

    let current = store::get_user(&db, &auth_id).await?.ok_or(AppError::NotFound("User"))?;
    let Some(old) = current.image.as_deref() else {
        return Err(AppError::validation("User has no avatar to remove"));
    };

    if let Err(e) = storage.delete(old).await {
        warn!("Failed to delete avatar {old}: {e}");
    }

    let user = store::set_avatar(&db, &auth_id, None).await?;
    Ok(Json(json!({ "message": "Avatar removed successfully", "user": user })))
}
