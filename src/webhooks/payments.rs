use std::sync::Arc;

use axum::{
    body::Bytes,
    debug_handler,
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use serde_json::{json, Value};
use time::OffsetDateTime;
use tracing::{debug, info};

use crate::{config::Config, AppError, AppResult, AppState, GetField};

const GROUP_EVENTS: [&str; 2] = ["order.paid", "checkout.updated"];

/// What a payment event asks of us. Only paid group creation is recognised.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum PaymentIntent {
    CreateGroup { name: String, customer: Option<String> },
    Ignored,
}

pub(crate) fn classify(event: &Value) -> AppResult<PaymentIntent> {
    let kind = event
        .get_str_field("type")
        .map_err(|_| AppError::validation("Payment event without a type"))?;
    if !GROUP_EVENTS.contains(&kind.as_str()) {
        return Ok(PaymentIntent::Ignored);
    }

    let metadata = event
        .get("data")
        .and_then(|data| data.get("metadata"));
    let Some(name) = metadata.and_then(|m| m.get("groupName")).and_then(Value::as_str) else {
        return Ok(PaymentIntent::Ignored);
    };

    Ok(PaymentIntent::CreateGroup {
        name: name.to_owned(),
        customer: event
            .get("data")
            .and_then(|data| data.get("customer_id").or_else(|| data.get("customerId")))
            .and_then(Value::as_str)
            .map(str::to_owned),
    })
}

/// Acknowledges payment provider callbacks. With a signing secret configured,
/// unsigned or forged events are refused before anything is logged. Group
/// creation is only logged; groups are owned by the identity provider.
#[debug_handler(state = AppState)]
pub(crate) async fn payments(
    State(config): State<Arc<Config>>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<(StatusCode, Json<Value>)> {
    match &config.payment_webhook_secret {
        Some(secret) => secret.verify(&headers, &body, OffsetDateTime::now_utc().unix_timestamp())?,
        None => debug!("payment event accepted without signature check"),
    }

    let event: Value = serde_json::from_slice(&body)
        .map_err(|e| AppError::validation(format!("Invalid payment event: {e}")))?;

    match classify(&event)? {
        PaymentIntent::CreateGroup { name, customer } => {
            info!("paid group creation requested: {name} (customer {customer:?})");
        }
        PaymentIntent::Ignored => {
            let kind = event.get("type").cloned().unwrap_or_default();
            info!("payment event ignored: {kind}");
        }
    }

    Ok((StatusCode::ACCEPTED, Json(json!({ "received": true }))))
}
