use serde::{Deserialize, Serialize};
use vltava_core::provider::CustomerInfo;

/// A booking request as submitted by the client at checkout. Immutable after
/// creation: a failed validation produces a new request from the client, the
/// server never patches one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingRequest {
    pub tour_id: String,
    /// YYYY-MM-DD
    pub date: String,
    /// HH:MM, 24-hour
    pub start_time: String,
    pub group_size: u32,
    pub customer: CustomerInfo,
    pub special_requests: Option<String>,
    /// Client-side computed total, re-checked server-side against the
    /// pricing rules.
    pub total_price: f64,
}

/// Result of a validation pass. Errors are accumulated in order; an empty
/// list means the request is bookable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self { valid: true, errors: Vec::new() }
    }

    pub fn push(&mut self, error: impl Into<String>) {
        self.valid = false;
        self.errors.push(error.into());
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::new()
    }
}
