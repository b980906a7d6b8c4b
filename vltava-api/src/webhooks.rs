use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use vltava_core::webhook::{parse_event, verify_signature, WebhookEventKind};
use vltava_shared::events::PaymentObservedEvent;

use crate::state::AppState;

pub const SIGNATURE_HEADER: &str = "vltava-signature";

/// Monitoring state fed by the webhook channel. The synchronous confirmation
/// path is authoritative for bookings; this is an audit signal only and
/// never mutates booking state.
#[derive(Default)]
pub struct PaymentMonitor {
    succeeded: AtomicU64,
    failed: AtomicU64,
    canceled: AtomicU64,
    last_event_id: RwLock<Option<String>>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct MonitorSnapshot {
    pub succeeded: u64,
    pub failed: u64,
    pub canceled: u64,
    pub last_event_id: Option<String>,
}

impl PaymentMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record(&self, kind: &WebhookEventKind, event_id: &str) {
        match kind {
            WebhookEventKind::PaymentSucceeded => self.succeeded.fetch_add(1, Ordering::Relaxed),
            WebhookEventKind::PaymentFailed => self.failed.fetch_add(1, Ordering::Relaxed),
            WebhookEventKind::PaymentCanceled => self.canceled.fetch_add(1, Ordering::Relaxed),
            WebhookEventKind::Other(_) => return,
        };
        *self.last_event_id.write().await = Some(event_id.to_string());
    }

    pub async fn snapshot(&self) -> MonitorSnapshot {
        MonitorSnapshot {
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            canceled: self.canceled.load(Ordering::Relaxed),
            last_event_id: self.last_event_id.read().await.clone(),
        }
    }
}

/// POST /v1/payments/webhook
/// Receive signed payment status callbacks from the card processor. The raw
/// body is verified against the signature header before any parsing; an
/// invalid or missing signature is rejected with no processing.
pub async fn handle_payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, StatusCode> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(StatusCode::BAD_REQUEST)?;

    verify_signature(
        &body,
        signature,
        &state.webhook.signing_secret,
        state.webhook.tolerance_seconds,
        Utc::now(),
    )
    .map_err(|e| {
        tracing::warn!(error = %e, "Rejected webhook with bad signature");
        StatusCode::BAD_REQUEST
    })?;

    let event = parse_event(&body).map_err(|e| {
        tracing::warn!(error = %e, "Rejected unparseable webhook payload");
        StatusCode::BAD_REQUEST
    })?;

    tracing::info!(
        event_id = %event.event_id,
        intent_id = %event.intent_id,
        kind = ?event.kind,
        "Payment webhook received"
    );
    let observed = PaymentObservedEvent {
        intent_id: event.intent_id.clone(),
        event_type: event_type_label(&event.kind).to_string(),
        observed_at: Utc::now().timestamp(),
    };
    if let Ok(payload) = serde_json::to_string(&observed) {
        tracing::info!(event = "payment.observed", %payload, "Audit event");
    }
    state.monitor.record(&event.kind, &event.event_id).await;

    Ok(StatusCode::OK)
}

fn event_type_label(kind: &WebhookEventKind) -> &str {
    match kind {
        WebhookEventKind::PaymentSucceeded => "payment_intent.succeeded",
        WebhookEventKind::PaymentFailed => "payment_intent.payment_failed",
        WebhookEventKind::PaymentCanceled => "payment_intent.canceled",
        WebhookEventKind::Other(other) => other,
    }
}
