use std::{sync::Arc, time::Duration};

use axum::{body::Bytes, http::Method};
use object_store::{
    aws::AmazonS3Builder, local::LocalFileSystem, memory::InMemory, path::Path, signer::Signer,
    Attribute, Attributes, ObjectStore, PutOptions,
};
use serde::Serialize;
use tracing::{debug, info};

use crate::{config::StorageBackend, db::now_millis, AppError, AppResult};

pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;
pub const AVATAR_FOLDER: &str = "avatars";
const SIGNED_URL_TTL: Duration = Duration::from_secs(300);
const CACHE_CONTROL: &str = "max-age=31536000";

/// Where uploaded images live, and the public URL prefix they are served from.
#[derive(Clone)]
pub struct Storage {
    store: Arc<dyn ObjectStore>,
    signer: Option<Arc<dyn Signer>>,
    public_base: String,
    // the local filesystem backend refuses content type and cache headers
    attributes: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedUpload {
    pub upload_url: String,
    pub file_url: String,
}

impl Storage {
    pub fn new(store: Arc<dyn ObjectStore>, public_base: impl Into<String>) -> Self {
        Self {
            store,
            signer: None,
            public_base: public_base.into().trim_end_matches('/').to_owned(),
            attributes: true,
        }
    }

    pub fn from_config(backend: &StorageBackend, public_url: &str) -> AppResult<Self> {
        match backend {
            StorageBackend::S3 { bucket, region, cdn_url } => {
                let s3 = Arc::new(
                    AmazonS3Builder::from_env()
                        .with_bucket_name(bucket)
                        .with_region(region)
                        .build()?,
                );
                let public_base = cdn_url
                    .clone()
                    .unwrap_or_else(|| format!("https://{bucket}.s3.{region}.amazonaws.com"));

                info!("Storing uploads in s3://{bucket}");
                Ok(Self {
                    store: s3.clone(),
                    signer: Some(s3),
                    public_base,
                    attributes: true,
                })
            }
            StorageBackend::Local { dir } => {
                std::fs::create_dir_all(dir)?;
                let store = LocalFileSystem::new_with_prefix(dir)?;

                info!("Storing uploads under {}", dir.display());
                Ok(Self {
                    attributes: false,
                    ..Self::new(Arc::new(store), format!("{public_url}/uploads"))
                })
            }
            StorageBackend::Memory => {
                info!("Storing uploads in memory");
                Ok(Self::new(Arc::new(InMemory::new()), format!("{public_url}/uploads")))
            }
        }
    }

    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{key}", self.public_base)
    }

    /// Recovers the object key from a URL this storage handed out. Foreign URLs
    /// fall back to their last two path segments (`folder/file`). Empty
    /// segments are dropped, as the object store itself would.
    pub fn key_for_url(&self, url: &str) -> Path {
        if let Some(key) = url.strip_prefix(&self.public_base) {
            return Path::from(key);
        }

        let segments: Vec<&str> = url
            .split('/')
            .filter(|segment| !segment.is_empty())
            .rev()
            .take(2)
            .collect();
        match segments.as_slice() {
            [file, folder] => Path::from_iter([*folder, *file]),
            _ => Path::from(url),
        }
    }

    /// Whether `url` names an object inside `folder`.
    pub fn is_in_folder(&self, url: &str, folder: &str) -> bool {
        self.key_for_url(url).prefix_matches(&Path::from(folder))
    }

    pub async fn upload(
        &self,
        folder: &str,
        file_name: &str,
        content_type: &str,
        bytes: Bytes,
    ) -> AppResult<String> {
        check_upload(folder, content_type, bytes.len())?;

        let key = object_key(folder, file_name);
        let mut attributes = Attributes::new();
        if self.attributes {
            attributes.insert(Attribute::ContentType, content_type.to_owned().into());
            attributes.insert(Attribute::CacheControl, CACHE_CONTROL.into());
        }

        self.store
            .put_opts(
                &Path::from(key.as_str()),
                bytes.into(),
                PutOptions {
                    attributes,
                    ..Default::default()
                },
            )
            .await?;

        debug!("stored {key} ({content_type})");
        Ok(self.public_url(&key))
    }

    /// Deleting an object that is already gone is not an error.
    pub async fn delete(&self, url: &str) -> AppResult<()> {
        let key = self.key_for_url(url);
        match self.store.delete(&key).await {
            Ok(()) | Err(object_store::Error::NotFound { .. }) => {
                debug!("deleted {key}");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn signed_upload(
        &self,
        folder: &str,
        file_name: &str,
        content_type: &str,
    ) -> AppResult<SignedUpload> {
        check_upload(folder, content_type, 0)?;

        let Some(signer) = &self.signer else {
            return Err(AppError::validation(
                "Signed uploads are not supported by this storage backend",
            ));
        };

        let key = object_key(folder, file_name);
        let upload_url = signer
            .signed_url(Method::PUT, &Path::from(key.as_str()), SIGNED_URL_TTL)
            .await?;

        Ok(SignedUpload {
            upload_url: upload_url.to_string(),
            file_url: self.public_url(&key),
        })
    }
}

pub fn check_upload(folder: &str, content_type: &str, size: usize) -> AppResult<()> {
    if folder.is_empty()
        || !folder
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(AppError::validation("Invalid folder name"));
    }
    if !content_type.starts_with("image/") {
        return Err(AppError::validation("Only image files are allowed"));
    }
    if size > MAX_UPLOAD_BYTES {
        return Err(AppError::validation(
            "File size too large. Maximum 5MB allowed",
        ));
    }
    Ok(())
}

fn object_key(folder: &str, file_name: &str) -> String {
    format!("{folder}/{}-{}", now_millis(), sanitize_file_name(file_name))
}

fn sanitize_file_name(name: &str) -> String {
    let name = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '-' | '_' => c,
            _ => '_',
        })
        .collect();

    match cleaned.trim_matches('.') {
        "" => "file".to_owned(),
        trimmed => trimmed.to_owned(),
    }
}
