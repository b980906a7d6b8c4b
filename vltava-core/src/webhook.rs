use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Replay window for webhook timestamps.
pub const DEFAULT_TOLERANCE_SECONDS: i64 = 300;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum WebhookError {
    #[error("Malformed signature header")]
    MalformedHeader,
    #[error("Signature does not match payload")]
    InvalidSignature,
    #[error("Webhook timestamp outside tolerance")]
    StaleTimestamp,
    #[error("Unparseable webhook payload: {0}")]
    InvalidPayload(String),
}

/// Verify a processor signature header of the form `t=<unix>,v1=<hex hmac>`
/// where the HMAC-SHA256 is computed over `"{t}.{raw body}"`. Comparison is
/// constant-time; the timestamp must fall within the replay tolerance.
///
/// Pure function of its inputs, independent of any HTTP framework.
pub fn verify_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    tolerance_seconds: i64,
    now: DateTime<Utc>,
) -> Result<(), WebhookError> {
    let mut timestamp: Option<i64> = None;
    let mut signature: Option<Vec<u8>> = None;

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => {
                timestamp = Some(value.parse().map_err(|_| WebhookError::MalformedHeader)?);
            }
            Some(("v1", value)) => {
                signature = Some(hex::decode(value).map_err(|_| WebhookError::MalformedHeader)?);
            }
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(WebhookError::MalformedHeader)?;
    let signature = signature.ok_or(WebhookError::MalformedHeader)?;

    if (now.timestamp() - timestamp).abs() > tolerance_seconds {
        return Err(WebhookError::StaleTimestamp);
    }

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| WebhookError::MalformedHeader)?;
    mac.update(format!("{}.", timestamp).as_bytes());
    mac.update(payload);
    mac.verify_slice(&signature)
        .map_err(|_| WebhookError::InvalidSignature)
}

/// Produce a signature header for a payload. Used by tests and by the mock
/// processor tooling.
pub fn sign_payload(payload: &[u8], secret: &str, timestamp: i64) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(format!("{}.", timestamp).as_bytes());
    mac.update(payload);
    let digest = mac.finalize().into_bytes();
    format!("t={},v1={}", timestamp, hex::encode(digest))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WebhookEventKind {
    PaymentSucceeded,
    PaymentFailed,
    PaymentCanceled,
    Other(String),
}

impl WebhookEventKind {
    pub fn from_type(event_type: &str) -> Self {
        match event_type {
            "payment_intent.succeeded" => WebhookEventKind::PaymentSucceeded,
            "payment_intent.payment_failed" => WebhookEventKind::PaymentFailed,
            "payment_intent.canceled" => WebhookEventKind::PaymentCanceled,
            other => WebhookEventKind::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct WebhookEnvelope {
    pub id: String,
    #[serde(rename = "type")]
    pub type_: String,
    pub data: WebhookData,
}

#[derive(Debug, Deserialize)]
pub struct WebhookData {
    pub object: WebhookIntentObject,
}

#[derive(Debug, Deserialize)]
pub struct WebhookIntentObject {
    pub id: String,
    pub status: String,
}

/// Parsed webhook event. Produced only after signature verification.
#[derive(Debug)]
pub struct WebhookEvent {
    pub event_id: String,
    pub kind: WebhookEventKind,
    pub intent_id: String,
}

pub fn parse_event(payload: &[u8]) -> Result<WebhookEvent, WebhookError> {
    let envelope: WebhookEnvelope =
        serde_json::from_slice(payload).map_err(|e| WebhookError::InvalidPayload(e.to_string()))?;
    Ok(WebhookEvent {
        event_id: envelope.id,
        kind: WebhookEventKind::from_type(&envelope.type_),
        intent_id: envelope.data.object.id,
    })
}
