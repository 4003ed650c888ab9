use std::{fmt::Display, path::PathBuf, str::FromStr};

use anyhow::{anyhow, Context};
use tracing::{info, warn};

use crate::webhooks::WebhookSecret;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    S3 {
        bucket: String,
        region: String,
        cdn_url: Option<String>,
    },
    Local {
        dir: PathBuf,
    },
    Memory,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub database_max_connections: u32,
    pub public_url: String,
    pub client_secrets_path: PathBuf,
    pub cors_origins: Vec<String>,
    pub session_inactivity_minutes: i64,
    pub secure_cookies: bool,
    pub storage: StorageBackend,
    pub payment_webhook_secret: Option<WebhookSecret>,
}

impl Config {
    /// Reads the process environment, after pulling in a `.env` file if one exists.
    pub fn load() -> anyhow::Result<Self> {
        if let Err(e) = dotenv::dotenv() {
            info!("No .env file loaded: {e}");
        }
        Self::from_lookup(|key| dotenv::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let public_url: String = try_load(&lookup, "PUBLIC_URL", "http://localhost:3001")?;
        let public_url = public_url.trim_end_matches('/').to_owned();

        let storage = match try_load::<String, _>(&lookup, "STORAGE_BACKEND", "local")?.as_str() {
            "s3" => StorageBackend::S3 {
                bucket: try_load(&lookup, "AWS_S3_BUCKET", "layer0-uploads")?,
                region: try_load(&lookup, "AWS_REGION", "us-east-1")?,
                cdn_url: lookup("AWS_CLOUDFRONT_URL")
                    .filter(|url| !url.trim().is_empty())
                    .map(|url| url.trim_end_matches('/').to_owned()),
            },
            "local" => StorageBackend::Local {
                dir: try_load(&lookup, "LOCAL_STORAGE_DIR", "uploads")?,
            },
            "memory" => StorageBackend::Memory,
            other => return Err(anyhow!("Invalid STORAGE_BACKEND value: {other}")),
        };

        let payment_webhook_secret = lookup("POLAR_WEBHOOK_SECRET")
            .filter(|secret| !secret.trim().is_empty())
            .map(|secret| WebhookSecret::new(&secret).context("Environment misconfigured: POLAR_WEBHOOK_SECRET"))
            .transpose()?;
        if payment_webhook_secret.is_none() {
            warn!("POLAR_WEBHOOK_SECRET not set, payment webhooks are not verified");
        }

        let cors_origins: String = try_load(
            &lookup,
            "CORS_ORIGINS",
            "http://localhost:3000,http://localhost:3001",
        )?;

        Ok(Self {
            port: try_load(&lookup, "PORT", "3001")?,
            database_url: try_load(&lookup, "DATABASE_URL", "sqlite://layerzero.db")?,
            database_max_connections: try_load(&lookup, "DATABASE_MAX_CONNECTIONS", "16")?,
            public_url,
            client_secrets_path: try_load(&lookup, "CLIENT_SECRETS_PATH", "client_secret.json")?,
            cors_origins: cors_origins
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(str::to_owned)
                .collect(),
            session_inactivity_minutes: try_load(&lookup, "SESSION_INACTIVITY_MINUTES", "10080")?,
            secure_cookies: try_load(&lookup, "SECURE_COOKIES", "false")?,
            storage,
            payment_webhook_secret,
        })
    }
}

fn try_load<T, F>(lookup: &F, key: &str, default: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.trim()
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
            anyhow!("{e}")
        })
        .with_context(|| format!("Environment misconfigured: {key}={raw}"))
}
