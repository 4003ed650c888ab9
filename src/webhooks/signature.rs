//! Standard Webhooks signatures: `webhook-signature` carries one or more
//! `v1,<base64 HMAC-SHA256>` entries over `{webhook-id}.{webhook-timestamp}.{body}`.

use std::fmt;

use anyhow::{anyhow, Context};
use axum::http::HeaderMap;
use base64::{engine::general_purpose::STANDARD, Engine};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::debug;

use crate::{AppError, AppResult};

type HmacSha256 = Hmac<Sha256>;

pub const ID_HEADER: &str = "webhook-id";
pub const TIMESTAMP_HEADER: &str = "webhook-timestamp";
pub const SIGNATURE_HEADER: &str = "webhook-signature";

/// Largest accepted distance between the signed timestamp and now.
pub const TOLERANCE_SECS: i64 = 5 * 60;

/// Signing key shared with the payment provider.
#[derive(Clone, PartialEq, Eq)]
pub struct WebhookSecret(Vec<u8>);

impl fmt::Debug for WebhookSecret {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("WebhookSecret(..)")
    }
}

impl WebhookSecret {
    /// A `whsec_` prefix marks a base64 key; anything else is used as raw bytes.
    pub fn new(secret: &str) -> anyhow::Result<Self> {
        let secret = secret.trim();
        if secret.is_empty() {
            return Err(anyhow!("webhook secret is empty"));
        }
        match secret.strip_prefix("whsec_") {
            Some(encoded) => Ok(Self(
                STANDARD
                    .decode(encoded)
                    .context("webhook secret is not valid base64")?,
            )),
            None => Ok(Self(secret.as_bytes().to_vec())),
        }
    }

    fn mac(&self, id: &str, timestamp: &str, body: &[u8]) -> AppResult<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(&self.0).map_err(|e| anyhow!("{e}"))?;
        mac.update(id.as_bytes());
        mac.update(b".");
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(body);
        Ok(mac)
    }

    /// Value for the signature header of a message.
    pub fn sign(&self, id: &str, timestamp: i64, body: &[u8]) -> AppResult<String> {
        let tag = self.mac(id, &timestamp.to_string(), body)?.finalize().into_bytes();
        Ok(format!("v1,{}", STANDARD.encode(tag)))
    }

    /// Checks the signature headers against the raw body. Every failure is
    /// answered as [`AppError::Unauthorized`].
    pub fn verify(&self, headers: &HeaderMap, body: &[u8], now: i64) -> AppResult<()> {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .ok_or_else(|| {
                    debug!("webhook without {name}");
                    AppError::Unauthorized
                })
        };
        let id = header(ID_HEADER)?;
        let timestamp = header(TIMESTAMP_HEADER)?;
        let signatures = header(SIGNATURE_HEADER)?;

        let sent_at: i64 = timestamp.parse().map_err(|_| AppError::Unauthorized)?;
        if (now - sent_at).abs() > TOLERANCE_SECS {
            debug!("webhook {id} timestamp {sent_at} outside tolerance");
            return Err(AppError::Unauthorized);
        }

        let mac = self.mac(id, timestamp, body)?;
        let matched = signatures
            .split_whitespace()
            .filter_map(|entry| entry.strip_prefix("v1,"))
            .filter_map(|encoded| STANDARD.decode(encoded).ok())
            .any(|tag| mac.clone().verify_slice(&tag).is_ok());

        if !matched {
            debug!("webhook {id} signature mismatch");
            return Err(AppError::Unauthorized);
        }
        Ok(())
    }
}
