use crate::card::metadata_for;
use crate::models::BookingRequest;
use crate::validator::validate_complete_booking;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use vltava_catalog::TourCatalog;
use vltava_core::payment::{
    BookingMetadata, PaymentError, WalletCapture, WalletOrder, WalletProcessor,
};

#[derive(Debug, thiserror::Error)]
pub enum WalletAdapterError {
    #[error("Booking validation failed")]
    Validation(Vec<String>),

    #[error("Wallet order not completed (status {status})")]
    NotCompleted { status: String },

    #[error(transparent)]
    Processor(#[from] PaymentError),
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct WalletOrderCreated {
    pub order_id: String,
    pub approval_url: String,
    pub amount: String,
    pub currency: String,
}

/// Details of a captured wallet payment.
#[derive(Debug, Clone)]
pub struct WalletPaymentDetails {
    pub order_id: String,
    pub capture_id: String,
    pub amount: String,
    pub currency: String,
}

/// Adapter over the wallet processor. Same contract as the card adapter with
/// the processor's own shapes: decimal-string amounts, approval URL instead
/// of a client secret, capture instead of confirm.
pub struct WalletPaymentAdapter {
    processor: Arc<dyn WalletProcessor>,
    catalog: Arc<TourCatalog>,
}

impl WalletPaymentAdapter {
    pub fn new(processor: Arc<dyn WalletProcessor>, catalog: Arc<TourCatalog>) -> Self {
        Self { processor, catalog }
    }

    pub async fn create_order(
        &self,
        request: &BookingRequest,
        currency: &str,
        now: DateTime<Utc>,
    ) -> Result<WalletOrderCreated, WalletAdapterError> {
        let validation = validate_complete_booking(request, &self.catalog, now);
        if !validation.valid {
            return Err(WalletAdapterError::Validation(validation.errors));
        }

        let amount = format!("{:.2}", request.total_price);
        let order = self
            .processor
            .create_order(&amount, currency, metadata_for(request))
            .await?;

        tracing::info!(
            order_id = %order.order_id,
            tour_id = %request.tour_id,
            %amount,
            "Wallet order created"
        );

        Ok(WalletOrderCreated {
            order_id: order.order_id,
            approval_url: order.approval_url,
            amount,
            currency: currency.to_string(),
        })
    }

    /// Capture the order and require the processor to report COMPLETED.
    pub async fn capture(&self, order_id: &str) -> Result<WalletPaymentDetails, WalletAdapterError> {
        let capture = self.processor.capture_order(order_id).await?;
        if capture.status != "COMPLETED" {
            return Err(WalletAdapterError::NotCompleted { status: capture.status });
        }

        Ok(WalletPaymentDetails {
            order_id: capture.order_id,
            capture_id: capture.capture_id,
            amount: capture.amount,
            currency: capture.currency,
        })
    }
}

/// In-memory wallet gateway. Orders start CREATED; `approve` simulates the
/// customer completing the approval redirect.
pub struct MockWalletProcessor {
    orders: RwLock<HashMap<String, WalletOrder>>,
    auto_approve: bool,
}

impl MockWalletProcessor {
    pub fn new(auto_approve: bool) -> Self {
        Self {
            orders: RwLock::new(HashMap::new()),
            auto_approve,
        }
    }

    pub async fn approve(&self, order_id: &str) {
        if let Some(order) = self.orders.write().await.get_mut(order_id) {
            order.status = "APPROVED".to_string();
        }
    }
}

#[async_trait::async_trait]
impl WalletProcessor for MockWalletProcessor {
    async fn create_order(
        &self,
        amount: &str,
        currency: &str,
        metadata: BookingMetadata,
    ) -> Result<WalletOrder, PaymentError> {
        if metadata.customer_email.starts_with("unreachable@") {
            return Err(PaymentError::Unreachable("simulated outage".to_string()));
        }

        let order_id = format!("wo_{}", uuid::Uuid::new_v4().simple());
        let order = WalletOrder {
            order_id: order_id.clone(),
            approval_url: format!("https://wallet.example.com/checkout?token={}", order_id),
            status: if self.auto_approve { "APPROVED" } else { "CREATED" }.to_string(),
            amount: amount.to_string(),
            currency: currency.to_string(),
        };
        self.orders.write().await.insert(order_id, order.clone());
        Ok(order)
    }

    async fn get_order(&self, order_id: &str) -> Result<WalletOrder, PaymentError> {
        self.orders
            .read()
            .await
            .get(order_id)
            .cloned()
            .ok_or_else(|| PaymentError::UnknownReference(order_id.to_string()))
    }

    async fn capture_order(&self, order_id: &str) -> Result<WalletCapture, PaymentError> {
        let mut orders = self.orders.write().await;
        let order = orders
            .get_mut(order_id)
            .ok_or_else(|| PaymentError::UnknownReference(order_id.to_string()))?;

        // Only approved orders capture; anything else stays pending.
        let status = if order.status == "APPROVED" {
            order.status = "COMPLETED".to_string();
            "COMPLETED"
        } else {
            "PENDING"
        };

        Ok(WalletCapture {
            order_id: order.order_id.clone(),
            capture_id: format!("cap_{}", uuid::Uuid::new_v4().simple()),
            status: status.to_string(),
            amount: order.amount.clone(),
            currency: order.currency.clone(),
        })
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

    fn adapter(auto_approve: bool) -> (WalletPaymentAdapter, Arc<MockWalletProcessor>) {
        let processor = Arc::new(MockWalletProcessor::new(auto_approve));
        let catalog = Arc::new(TourCatalog::prague_tours());
        (WalletPaymentAdapter::new(processor.clone(), catalog), processor)
    }

    #[tokio::test]
    async fn test_create_order_returns_approval_url() {
        let (adapter, _) = adapter(false);
        let created = adapter.create_order(&request(), "EUR", now()).await.unwrap();
        assert!(created.approval_url.contains(&created.order_id));
        assert_eq!(created.amount, "90.00");
    }

    #[tokio::test]
    async fn test_capture_requires_approval() {
        let (adapter, processor) = adapter(false);
        let created = adapter.create_order(&request(), "EUR", now()).await.unwrap();

        let err = adapter.capture(&created.order_id).await.unwrap_err();
        assert!(matches!(err, WalletAdapterError::NotCompleted { .. }));

        processor.approve(&created.order_id).await;
        let details = adapter.capture(&created.order_id).await.unwrap();
        assert_eq!(details.amount, "90.00");
        assert!(details.capture_id.starts_with("cap_"));
    }

    #[tokio::test]
    async fn test_invalid_booking_blocks_order() {
        let (adapter, _) = adapter(true);
        let mut bad = request();
        bad.group_size = 0;
        bad.total_price = 0.0;
        let err = adapter.create_order(&bad, "EUR", now()).await.unwrap_err();
        assert!(matches!(err, WalletAdapterError::Validation(_)));
    }
}
