use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vltava_api::{app, state::{AppState, WebhookConfig}};
use vltava_booking::card::{CardPaymentAdapter, MockCardProcessor};
use vltava_booking::orchestrator::{ConfirmationOrchestrator, MockBookingProvider};
use vltava_booking::wallet::{MockWalletProcessor, WalletPaymentAdapter};
use vltava_catalog::TourCatalog;
use vltava_core::email::LogEmailSender;
use vltava_core::session::SessionManager;
use vltava_store::{InMemoryRateLimitStore, RateLimitProfile, RateLimiter};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vltava_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = vltava_store::Config::load().expect("Failed to load config");
    tracing::info!("Starting Vltava booking engine on port {}", config.server.port);

    let catalog = Arc::new(TourCatalog::prague_tours());

    // Sandbox stand-ins until the live processor/provider credentials from
    // config.payments are wired to real gateway clients.
    let card_processor = Arc::new(MockCardProcessor::new(true));
    let wallet_processor = Arc::new(MockWalletProcessor::new(true));
    let provider = Arc::new(MockBookingProvider::new());
    let email = Arc::new(LogEmailSender);

    let card = Arc::new(CardPaymentAdapter::new(card_processor, catalog.clone()));
    let wallet = Arc::new(WalletPaymentAdapter::new(wallet_processor, catalog.clone()));
    let orchestrator = Arc::new(ConfirmationOrchestrator::new(
        catalog.clone(),
        card.clone(),
        wallet.clone(),
        provider.clone(),
        email,
    ));

    let sessions = Arc::new(SessionManager::new(
        config.session.secret.clone(),
        config.session.ttl_seconds,
        config.session.booking_ttl_seconds,
    ));

    let rate_limiter = Arc::new(RateLimiter::new(
        Arc::new(InMemoryRateLimitStore::new()),
        RateLimitProfile::new(
            config.rate_limit.booking_max_attempts,
            config.rate_limit.booking_window_seconds,
        ),
    ));

    let state = AppState {
        card,
        wallet,
        orchestrator,
        provider,
        sessions,
        rate_limiter,
        monitor: Arc::new(vltava_api::webhooks::PaymentMonitor::new()),
        webhook: WebhookConfig {
            signing_secret: config.payments.webhook_signing_secret.clone(),
            tolerance_seconds: config.payments.webhook_tolerance_seconds,
        },
        currency: config.payments.currency.clone(),
    };

    let app = app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Server error");
}
