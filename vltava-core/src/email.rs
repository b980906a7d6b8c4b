use crate::provider::Booking;
use async_trait::async_trait;

#[derive(Debug, Clone)]
pub struct ConfirmationEmail {
    pub to: String,
    pub booking: Booking,
    pub payment_reference: String,
    pub amount: String,
    pub currency: String,
}

#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    #[error("Email delivery failed: {0}")]
    DeliveryFailed(String),
}

/// Outbound confirmation mail. Failures here are non-critical: the caller
/// logs them and still reports booking success to the customer.
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send_booking_confirmation(&self, email: &ConfirmationEmail) -> Result<(), EmailError>;
}

/// Default sender that only records the send via tracing. Used until a real
/// transactional-mail integration is wired in.
pub struct LogEmailSender;

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send_booking_confirmation(&self, email: &ConfirmationEmail) -> Result<(), EmailError> {
        tracing::info!(
            confirmation_code = %email.booking.confirmation_code,
            tour_id = %email.booking.tour_id,
            "Booking confirmation email queued"
        );
        Ok(())
    }
}
