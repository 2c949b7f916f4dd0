use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/live", get(live))
        .route("/ready", get(ready))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    database: &'static str,
    timestamp: String,
    uptime_seconds: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LivenessResponse {
    status: &'static str,
    timestamp: String,
    uptime_seconds: u64,
    start_time: String,
    version: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReadinessResponse {
    status: &'static str,
    timestamp: String,
    database: DatabaseCheck,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DatabaseCheck {
    healthy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

async fn root(State(state): State<AppState>) -> Response {
    let check = state.database().check_health().await;

    let response = HealthResponse {
        status: if check.healthy { "ok" } else { "degraded" },
        database: if check.healthy { "connected" } else { "disconnected" },
        timestamp: now_iso(),
        uptime_seconds: state.uptime_seconds(),
    };

    let status_code = if check.healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status_code, Json(response)).into_response()
}

async fn live(State(state): State<AppState>) -> Response {
    let response = LivenessResponse {
        status: "healthy",
        timestamp: now_iso(),
        uptime_seconds: state.uptime_seconds(),
        start_time: DateTime::<Utc>::from(state.started_at_system())
            .to_rfc3339_opts(SecondsFormat::Millis, true),
        version: env!("CARGO_PKG_VERSION"),
    };

    Json(response).into_response()
}

async fn ready(State(state): State<AppState>) -> Response {
    let check = state.database().check_health().await;
    let healthy = check.healthy;

    let response = ReadinessResponse {
        status: if healthy { "healthy" } else { "unhealthy" },
        timestamp: now_iso(),
        database: DatabaseCheck {
            healthy,
            latency_ms: check.latency.map(|latency| latency.as_millis() as u64),
            error: check.error,
        },
    };

    let status_code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status_code, Json(response)).into_response()
}

fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
