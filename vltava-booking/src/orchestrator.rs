use crate::card::{CardAdapterError, CardPaymentAdapter};
use crate::models::BookingRequest;
use crate::validator::{parse_date, validate_complete_booking};
use crate::wallet::{WalletAdapterError, WalletPaymentAdapter};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;
use vltava_catalog::TourCatalog;
use vltava_core::email::{ConfirmationEmail, EmailError, EmailSender};
use vltava_core::payment::PaymentError;
use vltava_core::provider::{
    AvailabilityInfo, Booking, BookingData, BookingOutcome, BookingProvider, BookingStatus,
    ProviderError,
};
use vltava_shared::events::{BookingConfirmedEvent, ManualInterventionEvent};

/// Progress through the confirmation sequence. Payment verification strictly
/// precedes booking creation; there is no reservation step before payment,
/// so the booking provider arbitrates concurrent attempts for the same slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfirmationState {
    Created,
    AwaitingPaymentConfirmation,
    PaymentVerified,
    BookingCreated,
    ConfirmationSent,
}

/// Which processor holds the charge being confirmed.
#[derive(Debug, Clone)]
pub enum PaymentHandle {
    CardIntent(String),
    WalletOrder(String),
}

impl PaymentHandle {
    fn reference(&self) -> &str {
        match self {
            PaymentHandle::CardIntent(id) | PaymentHandle::WalletOrder(id) => id,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct VerifiedPayment {
    pub method: String,
    pub reference: String,
    pub amount: String,
    pub currency: String,
}

/// Terminal outcome of a confirmation attempt, carried as data. The
/// manual-intervention variant is the deliberate answer to payment and
/// booking living in two systems with no shared transaction: the divergence
/// is made observable, not impossible.
#[derive(Debug)]
pub enum ConfirmationOutcome {
    Completed {
        booking: Booking,
        confirmation_code: String,
        payment: VerifiedPayment,
        email_sent: bool,
    },
    Rejected {
        errors: Vec<String>,
    },
    PaymentNotCompleted {
        reason: String,
    },
    RequiresManualIntervention {
        payment_reference: String,
        detail: String,
    },
}

pub struct ConfirmationOrchestrator {
    catalog: Arc<TourCatalog>,
    card: Arc<CardPaymentAdapter>,
    wallet: Arc<WalletPaymentAdapter>,
    provider: Arc<dyn BookingProvider>,
    email: Arc<dyn EmailSender>,
}

impl ConfirmationOrchestrator {
    pub fn new(
        catalog: Arc<TourCatalog>,
        card: Arc<CardPaymentAdapter>,
        wallet: Arc<WalletPaymentAdapter>,
        provider: Arc<dyn BookingProvider>,
        email: Arc<dyn EmailSender>,
    ) -> Self {
        Self { catalog, card, wallet, provider, email }
    }

    /// Sequence validator -> payment verification -> booking creation ->
    /// confirmation email. Only a retryable processor outage surfaces as an
    /// Err; every business outcome is a ConfirmationOutcome variant.
    pub async fn confirm(
        &self,
        request: &BookingRequest,
        payment: PaymentHandle,
        now: DateTime<Utc>,
    ) -> Result<ConfirmationOutcome, PaymentError> {
        let mut state = ConfirmationState::Created;
        tracing::debug!(state = ?state, tour_id = %request.tour_id, "Confirmation flow started");

        let validation = validate_complete_booking(request, &self.catalog, now);
        if !validation.valid {
            tracing::info!(tour_id = %request.tour_id, errors = ?validation.errors, "Booking rejected at intake");
            return Ok(ConfirmationOutcome::Rejected { errors: validation.errors });
        }

        state = ConfirmationState::AwaitingPaymentConfirmation;
        tracing::debug!(state = ?state, reference = payment.reference(), "Verifying payment");

        let verified = match self.verify_payment(&payment).await {
            Ok(verified) => verified,
            Err(VerifyError::NotCompleted(reason)) => {
                tracing::info!(reference = payment.reference(), %reason, "Payment not completed");
                return Ok(ConfirmationOutcome::PaymentNotCompleted { reason });
            }
            Err(VerifyError::Retryable(e)) => return Err(e),
        };

        state = ConfirmationState::PaymentVerified;
        tracing::debug!(state = ?state, reference = %verified.reference, "Payment verified");

        // Validation guarantees the date parses; a failure here means the
        // request changed underneath us.
        let Some(date) = parse_date(&request.date) else {
            return Ok(ConfirmationOutcome::Rejected {
                errors: vec!["Date must be in YYYY-MM-DD format".to_string()],
            });
        };

        let data = BookingData {
            tour_id: request.tour_id.clone(),
            date,
            start_time: request.start_time.clone(),
            group_size: request.group_size,
            customer: request.customer.clone(),
            special_requests: request.special_requests.clone(),
            payment_reference: verified.reference.clone(),
        };

        // At most one create_booking call per confirmed payment; a failure
        // here escalates to the operator rather than retrying, because the
        // provider call is not assumed idempotent.
        let booking = match self.provider.create_booking(&data).await {
            Ok(BookingOutcome { success: true, booking: Some(booking), .. }) => booking,
            Ok(outcome) => {
                let detail = outcome
                    .error
                    .unwrap_or_else(|| "Booking provider reported failure".to_string());
                tracing::error!(
                    payment_reference = %verified.reference,
                    booking_payload = %serde_json::to_string(&data).unwrap_or_default(),
                    %detail,
                    "CRITICAL: payment succeeded but booking creation failed"
                );
                audit_manual_intervention(&verified.reference, &data.tour_id, &detail);
                return Ok(ConfirmationOutcome::RequiresManualIntervention {
                    payment_reference: verified.reference,
                    detail,
                });
            }
            Err(ProviderError::Unreachable(detail)) => {
                tracing::error!(
                    payment_reference = %verified.reference,
                    booking_payload = %serde_json::to_string(&data).unwrap_or_default(),
                    %detail,
                    "CRITICAL: payment succeeded but booking provider unreachable"
                );
                audit_manual_intervention(&verified.reference, &data.tour_id, &detail);
                return Ok(ConfirmationOutcome::RequiresManualIntervention {
                    payment_reference: verified.reference,
                    detail,
                });
            }
        };

        state = ConfirmationState::BookingCreated;
        let confirmation_code = booking.confirmation_code.clone();
        tracing::info!(state = ?state, %confirmation_code, "Booking recorded");
        audit_booking_confirmed(&booking);

        let email_sent = self.send_confirmation(&booking, &verified).await;
        state = ConfirmationState::ConfirmationSent;
        tracing::debug!(state = ?state, "Confirmation flow complete");

        Ok(ConfirmationOutcome::Completed {
            booking,
            confirmation_code,
            payment: verified,
            email_sent,
        })
    }

    async fn verify_payment(&self, payment: &PaymentHandle) -> Result<VerifiedPayment, VerifyError> {
        match payment {
            PaymentHandle::CardIntent(intent_id) => {
                match self.card.verify_payment(intent_id).await {
                    Ok(details) => Ok(VerifiedPayment {
                        method: "card".to_string(),
                        reference: details.intent_id,
                        amount: format!("{:.2}", details.amount_minor as f64 / 100.0),
                        currency: details.currency,
                    }),
                    Err(CardAdapterError::NotCompleted { status }) => {
                        Err(VerifyError::NotCompleted(format!("intent status {:?}", status)))
                    }
                    Err(CardAdapterError::Processor(e)) if e.retryable() => {
                        Err(VerifyError::Retryable(e))
                    }
                    Err(CardAdapterError::Processor(e)) => {
                        Err(VerifyError::NotCompleted(e.to_string()))
                    }
                    Err(CardAdapterError::Validation(errors)) => {
                        Err(VerifyError::NotCompleted(errors.join("; ")))
                    }
                }
            }
            PaymentHandle::WalletOrder(order_id) => match self.wallet.capture(order_id).await {
                Ok(details) => Ok(VerifiedPayment {
                    method: "wallet".to_string(),
                    reference: details.order_id,
                    amount: details.amount,
                    currency: details.currency,
                }),
                Err(WalletAdapterError::NotCompleted { status }) => {
                    Err(VerifyError::NotCompleted(format!("order status {}", status)))
                }
                Err(WalletAdapterError::Processor(e)) if e.retryable() => {
                    Err(VerifyError::Retryable(e))
                }
                Err(WalletAdapterError::Processor(e)) => {
                    Err(VerifyError::NotCompleted(e.to_string()))
                }
                Err(WalletAdapterError::Validation(errors)) => {
                    Err(VerifyError::NotCompleted(errors.join("; ")))
                }
            },
        }
    }

    /// Email delivery is a non-critical side effect: failures are logged and
    /// the booking is still reported as successful.
    async fn send_confirmation(&self, booking: &Booking, payment: &VerifiedPayment) -> bool {
        let email = ConfirmationEmail {
            to: booking.customer.email.as_str().to_string(),
            booking: booking.clone(),
            payment_reference: payment.reference.clone(),
            amount: payment.amount.clone(),
            currency: payment.currency.clone(),
        };
        match self.email.send_booking_confirmation(&email).await {
            Ok(()) => true,
            Err(EmailError::DeliveryFailed(reason)) => {
                tracing::warn!(
                    confirmation_code = %booking.confirmation_code,
                    %reason,
                    "Confirmation email failed; booking still confirmed"
                );
                false
            }
        }
    }
}

enum VerifyError {
    NotCompleted(String),
    Retryable(PaymentError),
}

// Audit events go to the structured log; an operator dashboard or queue
// consumer can pick them up from there.

fn audit_booking_confirmed(booking: &Booking) {
    let event = BookingConfirmedEvent {
        booking_id: booking.id,
        tour_id: booking.tour_id.clone(),
        confirmation_code: booking.confirmation_code.clone(),
        group_size: booking.group_size,
        timestamp: Utc::now().timestamp(),
    };
    if let Ok(payload) = serde_json::to_string(&event) {
        tracing::info!(event = "booking.confirmed", %payload, "Audit event");
    }
}

fn audit_manual_intervention(payment_reference: &str, tour_id: &str, detail: &str) {
    let event = ManualInterventionEvent {
        payment_reference: payment_reference.to_string(),
        tour_id: tour_id.to_string(),
        detail: detail.to_string(),
        timestamp: Utc::now().timestamp(),
    };
    if let Ok(payload) = serde_json::to_string(&event) {
        tracing::error!(event = "booking.manual_intervention", %payload, "Audit event");
    }
}

/// In-memory booking calendar standing in for the external provider.
/// A special-requests value of "fail-booking" simulates the provider
/// rejecting the slot after payment, for exercising the reconciliation path.
pub struct MockBookingProvider {
    fail_bookings: bool,
    sold_out: bool,
}

impl MockBookingProvider {
    pub fn new() -> Self {
        Self { fail_bookings: false, sold_out: false }
    }

    pub fn failing() -> Self {
        Self { fail_bookings: true, sold_out: false }
    }

    /// Calendar with no free slots on any date.
    pub fn sold_out() -> Self {
        Self { fail_bookings: false, sold_out: true }
    }
}

impl Default for MockBookingProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl BookingProvider for MockBookingProvider {
    async fn check_availability(
        &self,
        _tour_id: &str,
        _date: chrono::NaiveDate,
    ) -> Result<AvailabilityInfo, ProviderError> {
        if self.sold_out {
            return Ok(AvailabilityInfo { available: false, slots: Vec::new() });
        }
        Ok(AvailabilityInfo {
            available: true,
            slots: vec!["09:00".to_string(), "10:00".to_string(), "14:00".to_string()],
        })
    }

    async fn create_booking(&self, data: &BookingData) -> Result<BookingOutcome, ProviderError> {
        if self.fail_bookings || data.special_requests.as_deref() == Some("fail-booking") {
            return Ok(BookingOutcome {
                success: false,
                booking: None,
                confirmation_code: None,
                error: Some("Calendar rejected the slot".to_string()),
            });
        }

        let code = format!(
            "VLT-{}",
            Uuid::new_v4().simple().to_string()[..8].to_uppercase()
        );
        let booking = Booking {
            id: Uuid::new_v4(),
            confirmation_code: code.clone(),
            tour_id: data.tour_id.clone(),
            date: data.date,
            start_time: data.start_time.clone(),
            group_size: data.group_size,
            customer: data.customer.clone(),
            status: BookingStatus::Confirmed,
            created_at: Utc::now(),
        };
        Ok(BookingOutcome {
            success: true,
            booking: Some(booking),
            confirmation_code: Some(code),
            error: None,
        })
    }
}
