use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, Method},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use vltava_core::session::{csrf_matches, SessionScope};

use crate::error::ApiError;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "vltava_session";
pub const CSRF_HEADER: &str = "x-csrf-token";

#[derive(Debug, Deserialize, Default)]
pub struct CreateSessionRequest {
    /// "booking" for the short-lived checkout session.
    #[serde(default)]
    pub scope: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub csrf_token: String,
    pub expires_at: i64,
}

/// POST /v1/session
/// Issue a signed session cookie and the CSRF token the client must echo in
/// the x-csrf-token header on mutating requests.
pub async fn create_session(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    request: Request,
) -> Result<(CookieJar, Json<SessionResponse>), ApiError> {
    let body = axum::body::to_bytes(request.into_body(), 16 * 1024)
        .await
        .map_err(|e| ApiError::Validation(vec![format!("Unreadable body: {}", e)]))?;
    let req: CreateSessionRequest = if body.is_empty() {
        CreateSessionRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::Validation(vec![format!("Invalid JSON body: {}", e)]))?
    };

    let scope = match req.scope.as_deref() {
        Some("booking") => SessionScope::Booking,
        _ => SessionScope::General,
    };

    let ip = client_ip(&headers, None);
    let user_agent = headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");

    let issued = state
        .sessions
        .issue(scope, &ip, user_agent, Utc::now())
        .map_err(|e| ApiError::Unauthorized(e.to_string()))?;

    let cookie = Cookie::build((SESSION_COOKIE, issued.token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();

    Ok((
        jar.add(cookie),
        Json(SessionResponse {
            csrf_token: issued.claims.csrf,
            expires_at: issued.claims.exp,
        }),
    ))
}

/// CSRF double-submit middleware: on non-idempotent methods the session
/// cookie must verify and its embedded CSRF token must equal the request
/// header. GET/HEAD/OPTIONS are exempt, as is the webhook path (payload
/// signature verification applies there) and session issuance itself.
pub async fn csrf_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    if matches!(*req.method(), Method::GET | Method::HEAD | Method::OPTIONS) {
        return next.run(req).await;
    }
    let path = req.uri().path();
    if path == "/v1/payments/webhook" || path == "/v1/session" {
        return next.run(req).await;
    }

    let Some(cookie) = jar.get(SESSION_COOKIE) else {
        return ApiError::Unauthorized("Session required".to_string()).into_response();
    };

    let claims = match state.sessions.verify(cookie.value(), Utc::now()) {
        Ok(claims) => claims,
        Err(e) => return ApiError::Unauthorized(e.to_string()).into_response(),
    };

    let header_token = req
        .headers()
        .get(CSRF_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if !csrf_matches(&claims, header_token) {
        return ApiError::Forbidden("CSRF token mismatch".to_string()).into_response();
    }

    req.extensions_mut().insert(claims);
    next.run(req).await
}

/// Client identity for fingerprints and rate-limit keys: proxy header first,
/// then the connection address, then a fixed fallback (in-process tests have
/// neither).
pub fn client_ip(headers: &HeaderMap, connect_info: Option<&ConnectInfo<SocketAddr>>) -> String {
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }
    connect_info
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
