use crate::models::BookingRequest;
use crate::validator::validate_complete_booking;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use vltava_catalog::TourCatalog;
use vltava_core::payment::{
    BookingMetadata, CardProcessor, PaymentError, PaymentIntent, PaymentStatus,
};

#[derive(Debug, thiserror::Error)]
pub enum CardAdapterError {
    #[error("Booking validation failed")]
    Validation(Vec<String>),

    /// Processor-side status is not succeeded. Non-retryable; the customer
    /// has to finish or restart the payment flow.
    #[error("Payment not completed (status {status:?})")]
    NotCompleted { status: PaymentStatus },

    #[error(transparent)]
    Processor(#[from] PaymentError),
}

/// Details of a verified card payment, safe to hand to the orchestrator.
#[derive(Debug, Clone)]
pub struct CardPaymentDetails {
    pub intent_id: String,
    pub amount_minor: i64,
    pub currency: String,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct CardIntentCreated {
    pub payment_intent_id: String,
    pub client_secret: Option<String>,
    pub amount_minor: i64,
    pub currency: String,
}

/// Adapter over the card processor: validates the booking before any
/// processor call, attaches booking metadata for traceability, and converts
/// amounts to the processor's minor-unit convention.
pub struct CardPaymentAdapter {
    processor: Arc<dyn CardProcessor>,
    catalog: Arc<TourCatalog>,
}

impl CardPaymentAdapter {
    pub fn new(processor: Arc<dyn CardProcessor>, catalog: Arc<TourCatalog>) -> Self {
        Self { processor, catalog }
    }

    pub async fn create_payment_intent(
        &self,
        request: &BookingRequest,
        currency: &str,
        now: DateTime<Utc>,
    ) -> Result<CardIntentCreated, CardAdapterError> {
        let validation = validate_complete_booking(request, &self.catalog, now);
        if !validation.valid {
            return Err(CardAdapterError::Validation(validation.errors));
        }

        let amount_minor = to_minor_units(request.total_price);
        let intent = self
            .processor
            .create_intent(amount_minor, currency, metadata_for(request))
            .await?;

        tracing::info!(
            intent_id = %intent.id,
            tour_id = %request.tour_id,
            amount_minor,
            "Card payment intent created"
        );

        Ok(CardIntentCreated {
            payment_intent_id: intent.id,
            client_secret: intent.client_secret,
            amount_minor,
            currency: currency.to_string(),
        })
    }

    /// Re-fetch the intent and require the processor to report succeeded.
    /// A client-supplied "payment succeeded" flag is never trusted.
    pub async fn verify_payment(
        &self,
        intent_id: &str,
    ) -> Result<CardPaymentDetails, CardAdapterError> {
        let intent = self.processor.retrieve_intent(intent_id).await?;
        if intent.status != PaymentStatus::Succeeded {
            return Err(CardAdapterError::NotCompleted { status: intent.status });
        }

        Ok(CardPaymentDetails {
            intent_id: intent.id,
            amount_minor: intent.amount_minor,
            currency: intent.currency,
        })
    }
}

pub fn to_minor_units(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

pub fn metadata_for(request: &BookingRequest) -> BookingMetadata {
    BookingMetadata {
        tour_id: request.tour_id.clone(),
        date: request.date.clone(),
        group_size: request.group_size,
        customer_email: request.customer.email.as_str().to_string(),
    }
}

/// In-memory processor standing in for the real card gateway. Intents are
/// created pending; `settle` moves them to a terminal status the way the
/// customer's browser flow would.
pub struct MockCardProcessor {
    intents: RwLock<HashMap<String, PaymentIntent>>,
    auto_succeed: bool,
}

impl MockCardProcessor {
    pub fn new(auto_succeed: bool) -> Self {
        Self {
            intents: RwLock::new(HashMap::new()),
            auto_succeed,
        }
    }

    /// Force an intent into a terminal status (simulates the client-side
    /// confirmation step).
    pub async fn settle(&self, intent_id: &str, status: PaymentStatus) {
        if let Some(intent) = self.intents.write().await.get_mut(intent_id) {
            intent.status = status;
        }
    }
}

#[async_trait::async_trait]
impl CardProcessor for MockCardProcessor {
    async fn create_intent(
        &self,
        amount_minor: i64,
        currency: &str,
        metadata: BookingMetadata,
    ) -> Result<PaymentIntent, PaymentError> {
        // Trigger for testing the unreachable-processor path.
        if metadata.customer_email.starts_with("unreachable@") {
            return Err(PaymentError::Unreachable("simulated outage".to_string()));
        }

        let id = format!("pi_{}", uuid::Uuid::new_v4().simple());
        let intent = PaymentIntent {
            id: id.clone(),
            amount_minor,
            currency: currency.to_string(),
            status: if self.auto_succeed {
                PaymentStatus::Succeeded
            } else {
                PaymentStatus::Pending
            },
            client_secret: Some(format!("{}_secret_{}", id, uuid::Uuid::new_v4().simple())),
            metadata,
            created_at: Utc::now(),
        };
        self.intents.write().await.insert(id, intent.clone());
        Ok(intent)
    }

    async fn retrieve_intent(&self, intent_id: &str) -> Result<PaymentIntent, PaymentError> {
        self.intents
            .read()
            .await
            .get(intent_id)
            .cloned()
            .ok_or_else(|| PaymentError::UnknownReference(intent_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vltava_core::provider::CustomerInfo;

    fn request() -> BookingRequest {
        BookingRequest {
            tour_id: "prague-castle".to_string(),
            date: "2026-02-14".to_string(),
            start_time: "10:00".to_string(),
            group_size: 2,
            customer: CustomerInfo {
                first_name: "Anna".to_string(),
                last_name: "Novak".to_string(),
                email: "anna@example.com".into(),
                phone: "+420777123456".into(),
            },
            special_requests: None,
            total_price: 90.0,
        }
    }

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-02-09T09:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn adapter(auto_succeed: bool) -> (CardPaymentAdapter, Arc<MockCardProcessor>) {
        let processor = Arc::new(MockCardProcessor::new(auto_succeed));
        let catalog = Arc::new(TourCatalog::prague_tours());
        (CardPaymentAdapter::new(processor.clone(), catalog), processor)
    }

    #[test]
    fn test_minor_unit_conversion() {
        assert_eq!(to_minor_units(90.0), 9000);
        assert_eq!(to_minor_units(103.5), 10350);
        assert_eq!(to_minor_units(245.81), 24581);
    }

    #[tokio::test]
    async fn test_create_intent_attaches_metadata() {
        let (adapter, processor) = adapter(false);
        let created = adapter
            .create_payment_intent(&request(), "EUR", now())
            .await
            .unwrap();

        assert!(created.client_secret.is_some());
        assert_eq!(created.amount_minor, 9000);

        let intent = processor.retrieve_intent(&created.payment_intent_id).await.unwrap();
        assert_eq!(intent.metadata.tour_id, "prague-castle");
        assert_eq!(intent.metadata.group_size, 2);
        assert_eq!(intent.metadata.customer_email, "anna@example.com");
    }

    #[tokio::test]
    async fn test_tampered_price_blocks_intent_creation() {
        let (adapter, _) = adapter(false);
        let mut bad = request();
        bad.total_price = 1.0;
        let err = adapter.create_payment_intent(&bad, "EUR", now()).await.unwrap_err();
        match err {
            CardAdapterError::Validation(errors) => {
                assert!(errors.iter().any(|e| e.contains("Price mismatch")));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_verify_requires_succeeded_status() {
        let (adapter, processor) = adapter(false);
        let created = adapter
            .create_payment_intent(&request(), "EUR", now())
            .await
            .unwrap();

        // Still pending: rejected.
        let err = adapter.verify_payment(&created.payment_intent_id).await.unwrap_err();
        assert!(matches!(err, CardAdapterError::NotCompleted { .. }));

        // Settled: verified.
        processor
            .settle(&created.payment_intent_id, PaymentStatus::Succeeded)
            .await;
        let details = adapter.verify_payment(&created.payment_intent_id).await.unwrap();
        assert_eq!(details.amount_minor, 9000);
    }

    #[tokio::test]
    async fn test_unknown_intent_rejected() {
        let (adapter, _) = adapter(false);
        let err = adapter.verify_payment("pi_missing").await.unwrap_err();
        assert!(matches!(
            err,
            CardAdapterError::Processor(PaymentError::UnknownReference(_))
        ));
    }

    #[tokio::test]
    async fn test_processor_outage_is_retryable() {
        let (adapter, _) = adapter(false);
        let mut bad = request();
        bad.customer.email = "unreachable@example.com".into();
        let err = adapter.create_payment_intent(&bad, "EUR", now()).await.unwrap_err();
        match err {
            CardAdapterError::Processor(e) => assert!(e.retryable()),
            other => panic!("expected processor error, got {:?}", other),
        }
    }
}
