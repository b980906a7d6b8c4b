use crate::webhooks::PaymentMonitor;
use std::sync::Arc;
use vltava_booking::card::CardPaymentAdapter;
use vltava_booking::orchestrator::ConfirmationOrchestrator;
use vltava_booking::wallet::WalletPaymentAdapter;
use vltava_core::provider::BookingProvider;
use vltava_core::session::SessionManager;
use vltava_store::RateLimiter;

#[derive(Clone)]
pub struct WebhookConfig {
    pub signing_secret: String,
    pub tolerance_seconds: i64,
}

#[derive(Clone)]
pub struct AppState {
    pub card: Arc<CardPaymentAdapter>,
    pub wallet: Arc<WalletPaymentAdapter>,
    pub orchestrator: Arc<ConfirmationOrchestrator>,
    pub provider: Arc<dyn BookingProvider>,
    pub sessions: Arc<SessionManager>,
    pub rate_limiter: Arc<RateLimiter>,
    pub monitor: Arc<PaymentMonitor>,
    pub webhook: WebhookConfig,
    pub currency: String,
}
