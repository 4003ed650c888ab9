mod files;

use std::collections::HashMap;

use axum::{body::Bytes, extract::{DefaultBodyLimit, Multipart}, routing::post, Router};

use crate::{storage::MAX_UPLOAD_BYTES, AppResult, AppState};

/// Headroom over [`MAX_UPLOAD_BYTES`] for multipart framing and text fields.
pub(crate) const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            post(files::upload)
                .get(files::signed_url)
                .delete(files::delete)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + MULTIPART_OVERHEAD)),
        )
}

pub(crate) struct FilePart {
    pub(crate) file_name: String,
    pub(crate) content_type: String,
    pub(crate) bytes: Bytes,
}

pub(crate) struct Form {
    pub(crate) file: Option<FilePart>,
    pub(crate) fields: HashMap<String, String>,
}

/// Drains a multipart body, keeping the part named `file_field` as a file and
/// every other named part as text.
pub(crate) async fn read_form(mut multipart: Multipart, file_field: &str) -> AppResult<Form> {
    let mut form = Form {
        file: None,
        fields: HashMap::new(),
    };

    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };

        if name == file_field {
            let file_name = field.file_name().unwrap_or("upload").to_owned();
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_owned();
            let bytes = field.bytes().await?;
            form.file = Some(FilePart { file_name, content_type, bytes });
        } else {
            form.fields.insert(name, field.text().await?);
        }
    }

    Ok(form)
}
