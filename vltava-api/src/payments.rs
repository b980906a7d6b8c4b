use axum::{extract::State, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use vltava_booking::card::{CardAdapterError, CardIntentCreated};
use vltava_booking::orchestrator::{ConfirmationOutcome, PaymentHandle, VerifiedPayment};
use vltava_booking::validator::parse_date;
use vltava_booking::wallet::{WalletAdapterError, WalletOrderCreated};
use vltava_booking::BookingRequest;
use vltava_core::provider::Booking;

use crate::error::ApiError;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateIntentRequest {
    pub currency: Option<String>,
    pub booking: BookingRequest,
}

#[derive(Debug, Deserialize)]
pub struct ConfirmCardRequest {
    pub payment_intent_id: String,
    pub booking: BookingRequest,
}

#[derive(Debug, Deserialize)]
pub struct CreateWalletOrderRequest {
    pub currency: Option<String>,
    pub booking: BookingRequest,
}

#[derive(Debug, Deserialize)]
pub struct CaptureWalletOrderRequest {
    pub order_id: String,
    pub booking: BookingRequest,
}

#[derive(Debug, Serialize)]
pub struct ConfirmationResponse {
    pub success: bool,
    pub booking: Booking,
    pub confirmation_code: String,
    pub payment: VerifiedPayment,
    pub email_sent: bool,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /v1/payments/intent
/// Create a card payment intent for a validated booking request.
pub async fn create_payment_intent(
    State(state): State<AppState>,
    Json(req): Json<CreateIntentRequest>,
) -> Result<Json<CardIntentCreated>, ApiError> {
    ensure_slot_available(&state, &req.booking).await?;
    let currency = req.currency.as_deref().unwrap_or(&state.currency);
    let created = state
        .card
        .create_payment_intent(&req.booking, currency, Utc::now())
        .await
        .map_err(card_error)?;
    Ok(Json(created))
}

/// POST /v1/payments/confirm
/// Verify a card payment server-side and record the booking.
pub async fn confirm_card_payment(
    State(state): State<AppState>,
    Json(req): Json<ConfirmCardRequest>,
) -> Result<Json<ConfirmationResponse>, ApiError> {
    run_confirmation(&state, &req.booking, PaymentHandle::CardIntent(req.payment_intent_id)).await
}

/// POST /v1/payments/wallet
/// Create a wallet order; the customer approves it at the returned URL.
pub async fn create_wallet_order(
    State(state): State<AppState>,
    Json(req): Json<CreateWalletOrderRequest>,
) -> Result<Json<WalletOrderCreated>, ApiError> {
    ensure_slot_available(&state, &req.booking).await?;
    let currency = req.currency.as_deref().unwrap_or(&state.currency);
    let created = state
        .wallet
        .create_order(&req.booking, currency, Utc::now())
        .await
        .map_err(wallet_error)?;
    Ok(Json(created))
}

/// PUT /v1/payments/wallet
/// Capture an approved wallet order and record the booking.
pub async fn capture_wallet_order(
    State(state): State<AppState>,
    Json(req): Json<CaptureWalletOrderRequest>,
) -> Result<Json<ConfirmationResponse>, ApiError> {
    run_confirmation(&state, &req.booking, PaymentHandle::WalletOrder(req.order_id)).await
}

/// Consult the provider's live calendar before taking a payment. Weekday
/// rules are checked by the validator; this catches sold-out dates. Fails
/// open on a provider outage so payments do not depend on the calendar
/// being up.
async fn ensure_slot_available(state: &AppState, booking: &BookingRequest) -> Result<(), ApiError> {
    // An unparseable date is reported by the validator with the other
    // field errors.
    let Some(date) = parse_date(&booking.date) else {
        return Ok(());
    };
    match state.provider.check_availability(&booking.tour_id, date).await {
        Ok(info) if !info.available => Err(ApiError::Availability(
            "No availability for the selected date".to_string(),
        )),
        Ok(_) => Ok(()),
        Err(e) => {
            tracing::warn!(error = %e, tour_id = %booking.tour_id, "Availability check failed, continuing");
            Ok(())
        }
    }
}

async fn run_confirmation(
    state: &AppState,
    booking: &BookingRequest,
    payment: PaymentHandle,
) -> Result<Json<ConfirmationResponse>, ApiError> {
    let outcome = state
        .orchestrator
        .confirm(booking, payment, Utc::now())
        .await
        .map_err(ApiError::from_payment)?;

    match outcome {
        ConfirmationOutcome::Completed { booking, confirmation_code, payment, email_sent } => {
            Ok(Json(ConfirmationResponse {
                success: true,
                booking,
                confirmation_code,
                payment,
                email_sent,
            }))
        }
        ConfirmationOutcome::Rejected { errors } => Err(ApiError::Validation(errors)),
        ConfirmationOutcome::PaymentNotCompleted { reason } => {
            Err(ApiError::Payment { message: reason, retryable: false })
        }
        ConfirmationOutcome::RequiresManualIntervention { payment_reference, .. } => {
            Err(ApiError::ManualIntervention { payment_reference })
        }
    }
}

fn card_error(error: CardAdapterError) -> ApiError {
    match error {
        CardAdapterError::Validation(errors) => ApiError::Validation(errors),
        CardAdapterError::NotCompleted { status } => ApiError::Payment {
            message: format!("Payment not completed (status {:?})", status),
            retryable: false,
        },
        CardAdapterError::Processor(e) => ApiError::from_payment(e),
    }
}

fn wallet_error(error: WalletAdapterError) -> ApiError {
    match error {
        WalletAdapterError::Validation(errors) => ApiError::Validation(errors),
        WalletAdapterError::NotCompleted { status } => ApiError::Payment {
            message: format!("Wallet order not completed (status {})", status),
            retryable: false,
        },
        WalletAdapterError::Processor(e) => ApiError::from_payment(e),
    }
}
