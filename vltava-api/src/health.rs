use axum::{extract::State, http::StatusCode, Json};
use chrono::{Datelike, Duration, Utc};
use serde::Serialize;
use std::time::Duration as StdDuration;

use crate::state::AppState;

const PROBE_TIMEOUT: StdDuration = StdDuration::from_secs(5);

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub provider: &'static str,
}

/// GET /v1/health
/// Probes the booking provider with a bounded availability call. The engine
/// itself is up if we can answer at all, so a slow or down provider reports
/// degraded rather than failing the check outright.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let probe_date = (Utc::now() + Duration::days(7)).date_naive();
    // Tuesday onward so the probe never lands on a closed weekday.
    let probe_date = match probe_date.weekday() {
        chrono::Weekday::Mon => probe_date + Duration::days(1),
        _ => probe_date,
    };

    let probe = tokio::time::timeout(
        PROBE_TIMEOUT,
        state.provider.check_availability("prague-castle", probe_date),
    )
    .await;

    match probe {
        Ok(Ok(_)) => (
            StatusCode::OK,
            Json(HealthResponse { status: "ok", provider: "ok" }),
        ),
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "Health probe: booking provider errored");
            (
                StatusCode::OK,
                Json(HealthResponse { status: "degraded", provider: "error" }),
            )
        }
        Err(_) => {
            tracing::warn!("Health probe: booking provider timed out");
            (
                StatusCode::OK,
                Json(HealthResponse { status: "degraded", provider: "timeout" }),
            )
        }
    }
}
