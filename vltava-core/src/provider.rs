use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use vltava_shared::Masked;

/// Customer contact details carried on a booking. Email and phone are masked
/// in Debug output (see vltava_shared::pii).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub first_name: String,
    pub last_name: String,
    pub email: Masked<String>,
    pub phone: Masked<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
}

/// The reservation as recorded by the external booking provider. The engine
/// keeps this copy for display and email only; the provider owns it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub confirmation_code: String,
    pub tour_id: String,
    pub date: NaiveDate,
    pub start_time: String,
    pub group_size: u32,
    pub customer: CustomerInfo,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

/// Payload sent to the booking provider after payment is verified.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingData {
    pub tour_id: String,
    pub date: NaiveDate,
    pub start_time: String,
    pub group_size: u32,
    pub customer: CustomerInfo,
    pub special_requests: Option<String>,
    pub payment_reference: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityInfo {
    pub available: bool,
    pub slots: Vec<String>,
}

/// Result of a create_booking call. Carried as data rather than an error so
/// the orchestrator can distinguish "provider said no" from "provider down".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingOutcome {
    pub success: bool,
    pub booking: Option<Booking>,
    pub confirmation_code: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Booking provider unreachable: {0}")]
    Unreachable(String),
}

/// External booking-calendar system. Calls are not assumed idempotent: the
/// orchestrator invokes create_booking at most once per confirmed payment
/// and escalates failures instead of retrying.
#[async_trait]
pub trait BookingProvider: Send + Sync {
    async fn check_availability(
        &self,
        tour_id: &str,
        date: NaiveDate,
    ) -> Result<AvailabilityInfo, ProviderError>;

    async fn create_booking(&self, data: &BookingData) -> Result<BookingOutcome, ProviderError>;
}
