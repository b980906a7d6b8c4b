use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde_json::json;
use vltava_core::payment::PaymentError;

#[derive(Debug)]
pub enum ApiError {
    /// Field-level validation failures, returned as an ordered list for
    /// form re-display.
    Validation(Vec<String>),
    Availability(String),
    Payment { message: String, retryable: bool },
    RateLimited { reset_at: DateTime<Utc> },
    Unauthorized(String),
    Forbidden(String),
    /// Payment succeeded but the booking could not be recorded. Always
    /// carries the payment reference for operator reconciliation.
    ManualIntervention { payment_reference: String },
    Anyhow(anyhow::Error),
}

impl ApiError {
    /// Map a processor error onto the taxonomy: declines are 402-class, an
    /// unreachable processor is a retryable 502.
    pub fn from_payment(error: PaymentError) -> Self {
        let retryable = error.retryable();
        ApiError::Payment { message: error.to_string(), retryable }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Validation failed", "details": errors })),
            )
                .into_response(),
            ApiError::Availability(msg) => {
                (StatusCode::CONFLICT, Json(json!({ "error": msg }))).into_response()
            }
            ApiError::Payment { message, retryable } => {
                let status = if retryable {
                    StatusCode::BAD_GATEWAY
                } else {
                    StatusCode::PAYMENT_REQUIRED
                };
                (status, Json(json!({ "error": message, "retryable": retryable }))).into_response()
            }
            ApiError::RateLimited { reset_at } => (
                StatusCode::TOO_MANY_REQUESTS,
                Json(json!({
                    "error": "Too many attempts, please try again later",
                    "reset_at": reset_at.to_rfc3339(),
                })),
            )
                .into_response(),
            ApiError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, Json(json!({ "error": msg }))).into_response()
            }
            ApiError::Forbidden(msg) => {
                (StatusCode::FORBIDDEN, Json(json!({ "error": msg }))).into_response()
            }
            ApiError::ManualIntervention { payment_reference } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Payment succeeded but the booking could not be recorded. Please contact support with the reference below.",
                    "requires_manual_intervention": true,
                    "payment_reference": payment_reference,
                })),
            )
                .into_response(),
            ApiError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Internal Server Error" })),
                )
                    .into_response()
            }
        }
    }
}

impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::Anyhow(err.into())
    }
}
