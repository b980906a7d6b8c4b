use axum::{
    extract::{ConnectInfo, Request, State},
    http::Method,
    middleware::Next,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod error;
pub mod health;
pub mod payments;
pub mod session;
pub mod state;
pub mod webhooks;

pub use state::AppState;

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::USER_AGENT,
            axum::http::header::HeaderName::from_static(session::CSRF_HEADER),
        ]);

    Router::new()
        .route("/v1/health", get(health::health))
        .route("/v1/session", post(session::create_session))
        .route("/v1/payments/intent", post(payments::create_payment_intent))
        .route("/v1/payments/confirm", post(payments::confirm_card_payment))
        .route(
            "/v1/payments/wallet",
            post(payments::create_wallet_order).put(payments::capture_wallet_order),
        )
        .route("/v1/payments/webhook", post(webhooks::handle_payment_webhook))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            session::csrf_middleware,
        ))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Per-IP attempt budget on the payment endpoints. The webhook is exempt:
/// the processor retries it and authenticates by signature instead.
async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let path = req.uri().path();
    if !path.starts_with("/v1/payments") || path == "/v1/payments/webhook" {
        return next.run(req).await;
    }

    let ip = session::client_ip(
        req.headers(),
        req.extensions().get::<ConnectInfo<SocketAddr>>(),
    );
    let decision = state.rate_limiter.check(&ip).await;
    if !decision.allowed {
        return error::ApiError::RateLimited { reset_at: decision.reset_at }.into_response();
    }
    next.run(req).await
}
