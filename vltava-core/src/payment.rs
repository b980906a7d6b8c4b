use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Succeeded,
    Canceled,
    Failed,
}

/// Booking context attached to every intent/order for traceability.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BookingMetadata {
    pub tour_id: String,
    pub date: String,
    pub group_size: u32,
    pub customer_email: String,
}

/// A processor-side object representing an in-progress charge. Its status is
/// the source of truth for "has the customer paid"; the engine never trusts
/// a client-supplied paid flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    /// Minor units (cents) in the card processor's convention.
    pub amount_minor: i64,
    pub currency: String,
    pub status: PaymentStatus,
    pub client_secret: Option<String>,
    pub metadata: BookingMetadata,
    pub created_at: DateTime<Utc>,
}

/// Wallet processor's order shape: approval URL instead of client secret,
/// decimal string amounts, uppercase status strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletOrder {
    pub order_id: String,
    pub approval_url: String,
    /// CREATED | APPROVED | COMPLETED | VOIDED
    pub status: String,
    pub amount: String,
    pub currency: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletCapture {
    pub order_id: String,
    pub capture_id: String,
    pub status: String,
    pub amount: String,
    pub currency: String,
}

#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    /// Processor reached but refused the operation. Not retryable.
    #[error("Payment declined: {0}")]
    Declined(String),

    /// Intent/order id unknown to the processor. Not retryable.
    #[error("Unknown payment reference: {0}")]
    UnknownReference(String),

    /// Processor unreachable. Retryable system error.
    #[error("Payment processor unreachable: {0}")]
    Unreachable(String),
}

impl PaymentError {
    pub fn retryable(&self) -> bool {
        matches!(self, PaymentError::Unreachable(_))
    }
}

/// Card processor client (Stripe-style: intents, client secrets, cents).
#[async_trait]
pub trait CardProcessor: Send + Sync {
    async fn create_intent(
        &self,
        amount_minor: i64,
        currency: &str,
        metadata: BookingMetadata,
    ) -> Result<PaymentIntent, PaymentError>;

    /// Retrieve the current processor-side status of an intent.
    async fn retrieve_intent(&self, intent_id: &str) -> Result<PaymentIntent, PaymentError>;
}

/// Wallet processor client (PayPal-style: orders, approval URLs, capture).
#[async_trait]
pub trait WalletProcessor: Send + Sync {
    async fn create_order(
        &self,
        amount: &str,
        currency: &str,
        metadata: BookingMetadata,
    ) -> Result<WalletOrder, PaymentError>;

    async fn get_order(&self, order_id: &str) -> Result<WalletOrder, PaymentError>;

    /// Capture an approved order. The processor reports the final status.
    async fn capture_order(&self, order_id: &str) -> Result<WalletCapture, PaymentError>;
}
