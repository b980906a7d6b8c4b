use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::{Datelike, Duration, Utc, Weekday};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use vltava_api::state::{AppState, WebhookConfig};
use vltava_api::webhooks::PaymentMonitor;
use vltava_api::{app, session::CSRF_HEADER, webhooks::SIGNATURE_HEADER};
use vltava_booking::card::{CardPaymentAdapter, MockCardProcessor};
use vltava_booking::orchestrator::{ConfirmationOrchestrator, MockBookingProvider};
use vltava_booking::wallet::{MockWalletProcessor, WalletPaymentAdapter};
use vltava_catalog::{calculate_total_price, TourCatalog};
use vltava_core::email::LogEmailSender;
use vltava_core::session::SessionManager;
use vltava_core::webhook::sign_payload;
use vltava_store::{InMemoryRateLimitStore, RateLimitProfile, RateLimiter};

const WEBHOOK_SECRET: &str = "whsec_test";
const CLIENT_IP: &str = "203.0.113.7";

struct TestApp {
    router: Router,
    card_processor: Arc<MockCardProcessor>,
    monitor: Arc<PaymentMonitor>,
}

fn test_app(booking_provider: MockBookingProvider) -> TestApp {
    let catalog = Arc::new(TourCatalog::prague_tours());
    let card_processor = Arc::new(MockCardProcessor::new(false));
    let wallet_processor = Arc::new(MockWalletProcessor::new(true));
    let provider = Arc::new(booking_provider);
    let monitor = Arc::new(PaymentMonitor::new());

    let card = Arc::new(CardPaymentAdapter::new(
        card_processor.clone(),
        catalog.clone(),
    ));
    let wallet = Arc::new(WalletPaymentAdapter::new(
        wallet_processor.clone(),
        catalog.clone(),
    ));
    let orchestrator = Arc::new(ConfirmationOrchestrator::new(
        catalog.clone(),
        card.clone(),
        wallet.clone(),
        provider.clone(),
        Arc::new(LogEmailSender),
    ));

    let state = AppState {
        card,
        wallet,
        orchestrator,
        provider,
        sessions: Arc::new(SessionManager::new("test-secret".to_string(), 86_400, 1_800)),
        rate_limiter: Arc::new(RateLimiter::new(
            Arc::new(InMemoryRateLimitStore::new()),
            RateLimitProfile::new(5, 900),
        )),
        monitor: monitor.clone(),
        webhook: WebhookConfig {
            signing_secret: WEBHOOK_SECRET.to_string(),
            tolerance_seconds: 300,
        },
        currency: "czk".to_string(),
    };

    TestApp {
        router: app(state),
        card_processor,
        monitor,
    }
}

/// An upcoming date on which prague-castle operates (closed Mondays).
fn upcoming_tour_date() -> String {
    let mut date = Utc::now().date_naive() + Duration::days(14);
    if date.weekday() == Weekday::Mon {
        date += Duration::days(1);
    }
    date.format("%Y-%m-%d").to_string()
}

fn booking_json(date: &str) -> Value {
    let catalog = TourCatalog::prague_tours();
    let parsed = chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap();
    let total = calculate_total_price(&catalog, "prague-castle", 2, parsed);
    json!({
        "tour_id": "prague-castle",
        "date": date,
        "start_time": "10:00",
        "group_size": 2,
        "customer": {
            "first_name": "Anna",
            "last_name": "Novak",
            "email": "anna@example.com",
            "phone": "+420777123456"
        },
        "special_requests": null,
        "total_price": total
    })
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Issue a session and return (cookie pair, csrf token).
async fn open_session(router: &Router) -> (String, String) {
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/session")
                .header("x-forwarded-for", CLIENT_IP)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({ "scope": "booking" }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("session cookie issued")
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string();

    let body = body_json(response).await;
    let csrf = body["csrf_token"].as_str().unwrap().to_string();
    assert!(!csrf.is_empty());
    (cookie, csrf)
}

fn authed_post(uri: &str, cookie: &str, csrf: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("x-forwarded-for", CLIENT_IP)
        .header(header::COOKIE, cookie)
        .header(CSRF_HEADER, csrf)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health_reports_ok() {
    let t = test_app(MockBookingProvider::new());
    let response = t
        .router
        .oneshot(
            Request::builder()
                .uri("/v1/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_payment_endpoint_requires_session() {
    let t = test_app(MockBookingProvider::new());
    let response = t
        .router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/payments/intent")
                .header("x-forwarded-for", CLIENT_IP)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({ "booking": booking_json(&upcoming_tour_date()) }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_csrf_mismatch_rejected() {
    let t = test_app(MockBookingProvider::new());
    let (cookie, _) = open_session(&t.router).await;

    let response = t
        .router
        .oneshot(authed_post(
            "/v1/payments/intent",
            &cookie,
            "not-the-issued-token",
            json!({ "booking": booking_json(&upcoming_tour_date()) }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_tampered_price_rejected() {
    let t = test_app(MockBookingProvider::new());
    let (cookie, csrf) = open_session(&t.router).await;

    let mut booking = booking_json(&upcoming_tour_date());
    booking["total_price"] = json!(1.0);

    let response = t
        .router
        .oneshot(authed_post(
            "/v1/payments/intent",
            &cookie,
            &csrf,
            json!({ "booking": booking }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    let details = body["details"].as_array().unwrap();
    assert!(details
        .iter()
        .any(|e| e.as_str().unwrap().contains("Price mismatch")));
}

#[tokio::test]
async fn test_card_checkout_happy_path() {
    let t = test_app(MockBookingProvider::new());
    let (cookie, csrf) = open_session(&t.router).await;
    let booking = booking_json(&upcoming_tour_date());

    let response = t
        .router
        .clone()
        .oneshot(authed_post(
            "/v1/payments/intent",
            &cookie,
            &csrf,
            json!({ "booking": booking }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let intent = body_json(response).await;
    let intent_id = intent["payment_intent_id"].as_str().unwrap().to_string();
    assert!(intent["client_secret"].as_str().is_some());

    // Simulate the browser-side confirmation step.
    t.card_processor
        .settle(&intent_id, vltava_core::payment::PaymentStatus::Succeeded)
        .await;

    let response = t
        .router
        .oneshot(authed_post(
            "/v1/payments/confirm",
            &cookie,
            &csrf,
            json!({ "payment_intent_id": intent_id, "booking": booking }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let confirmed = body_json(response).await;
    assert_eq!(confirmed["success"], true);
    assert!(confirmed["confirmation_code"]
        .as_str()
        .unwrap()
        .starts_with("VLT-"));
    assert_eq!(confirmed["payment"]["method"], "card");
    assert_eq!(confirmed["email_sent"], true);
}

#[tokio::test]
async fn test_wallet_checkout_happy_path() {
    let t = test_app(MockBookingProvider::new());
    let (cookie, csrf) = open_session(&t.router).await;
    let booking = booking_json(&upcoming_tour_date());

    let response = t
        .router
        .clone()
        .oneshot(authed_post(
            "/v1/payments/wallet",
            &cookie,
            &csrf,
            json!({ "booking": booking }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let order = body_json(response).await;
    let order_id = order["order_id"].as_str().unwrap().to_string();
    assert!(order["approval_url"].as_str().unwrap().contains(&order_id));

    let mut capture = authed_post(
        "/v1/payments/wallet",
        &cookie,
        &csrf,
        json!({ "order_id": order_id, "booking": booking }),
    );
    *capture.method_mut() = axum::http::Method::PUT;

    let response = t.router.oneshot(capture).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let confirmed = body_json(response).await;
    assert_eq!(confirmed["success"], true);
    assert_eq!(confirmed["payment"]["method"], "wallet");
}

#[tokio::test]
async fn test_sold_out_date_conflicts_before_payment() {
    let t = test_app(MockBookingProvider::sold_out());
    let (cookie, csrf) = open_session(&t.router).await;

    let response = t
        .router
        .oneshot(authed_post(
            "/v1/payments/intent",
            &cookie,
            &csrf,
            json!({ "booking": booking_json(&upcoming_tour_date()) }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_booking_failure_after_payment_reports_manual_intervention() {
    let t = test_app(MockBookingProvider::failing());
    let (cookie, csrf) = open_session(&t.router).await;
    let booking = booking_json(&upcoming_tour_date());

    let response = t
        .router
        .clone()
        .oneshot(authed_post(
            "/v1/payments/intent",
            &cookie,
            &csrf,
            json!({ "booking": booking }),
        ))
        .await
        .unwrap();
    let intent = body_json(response).await;
    let intent_id = intent["payment_intent_id"].as_str().unwrap().to_string();
    t.card_processor
        .settle(&intent_id, vltava_core::payment::PaymentStatus::Succeeded)
        .await;

    let response = t
        .router
        .oneshot(authed_post(
            "/v1/payments/confirm",
            &cookie,
            &csrf,
            json!({ "payment_intent_id": intent_id, "booking": booking }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["requires_manual_intervention"], true);
    // The payment reference survives into the error so support can refund.
    assert_eq!(body["payment_reference"], intent_id.as_str());
}

#[tokio::test]
async fn test_unpaid_intent_not_confirmed() {
    let t = test_app(MockBookingProvider::new());
    let (cookie, csrf) = open_session(&t.router).await;
    let booking = booking_json(&upcoming_tour_date());

    let response = t
        .router
        .clone()
        .oneshot(authed_post(
            "/v1/payments/intent",
            &cookie,
            &csrf,
            json!({ "booking": booking }),
        ))
        .await
        .unwrap();
    let intent = body_json(response).await;
    let intent_id = intent["payment_intent_id"].as_str().unwrap();

    // No settle: the intent is still pending.
    let response = t
        .router
        .oneshot(authed_post(
            "/v1/payments/confirm",
            &cookie,
            &csrf,
            json!({ "payment_intent_id": intent_id, "booking": booking }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
}

#[tokio::test]
async fn test_rate_limit_blocks_sixth_attempt() {
    let t = test_app(MockBookingProvider::new());

    for attempt in 1..=5 {
        let response = t
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/v1/payments/intent")
                    .header("x-forwarded-for", CLIENT_IP)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();
        // Counted against the budget even though the session check fails.
        assert_ne!(
            response.status(),
            StatusCode::TOO_MANY_REQUESTS,
            "attempt {} should not be throttled",
            attempt
        );
    }

    let response = t
        .router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/payments/intent")
                .header("x-forwarded-for", CLIENT_IP)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let body = body_json(response).await;
    assert!(body["reset_at"].as_str().is_some());
}

#[tokio::test]
async fn test_webhook_invalid_signature_rejected() {
    let t = test_app(MockBookingProvider::new());
    let payload = json!({
        "id": "evt_1",
        "type": "payment_intent.succeeded",
        "data": { "object": { "id": "pi_123", "status": "succeeded" } }
    })
    .to_string();

    let response = t
        .router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/payments/webhook")
                .header(SIGNATURE_HEADER, "t=0,v1=deadbeef")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let snapshot = t.monitor.snapshot().await;
    assert_eq!(snapshot.succeeded, 0);
    assert!(snapshot.last_event_id.is_none());
}

#[tokio::test]
async fn test_webhook_valid_signature_recorded() {
    let t = test_app(MockBookingProvider::new());
    let payload = json!({
        "id": "evt_42",
        "type": "payment_intent.succeeded",
        "data": { "object": { "id": "pi_123", "status": "succeeded" } }
    })
    .to_string();
    let header_value = sign_payload(payload.as_bytes(), WEBHOOK_SECRET, Utc::now().timestamp());

    let response = t
        .router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/payments/webhook")
                .header(SIGNATURE_HEADER, header_value)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let snapshot = t.monitor.snapshot().await;
    assert_eq!(snapshot.succeeded, 1);
    assert_eq!(snapshot.last_event_id.as_deref(), Some("evt_42"));
}
