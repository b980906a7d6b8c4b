use uuid::Uuid;

/// Payment status observed through the processor webhook channel.
/// Monitoring signal only; the synchronous confirmation path is authoritative.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct PaymentObservedEvent {
    pub intent_id: String,
    pub event_type: String,
    pub observed_at: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct BookingConfirmedEvent {
    pub booking_id: Uuid,
    pub tour_id: String,
    pub confirmation_code: String,
    pub group_size: u32,
    pub timestamp: i64,
}

/// Emitted when a payment succeeded but the booking provider failed to record
/// the reservation. Requires operator reconciliation.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct ManualInterventionEvent {
    pub payment_reference: String,
    pub tour_id: String,
    pub detail: String,
    pub timestamp: i64,
}
