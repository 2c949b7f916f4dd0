use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use lexis_algo::{PresentationOrder, SessionPolicy, SlotPolicy};
use serde::{Deserialize, Serialize};

use crate::config::MAX_SESSION_SIZE;
use crate::response::AppError;
use crate::services::SessionRequest;
use crate::state::AppState;

/// Set by the upstream authentication layer.
pub const LEARNER_HEADER: &str = "x-user-id";

#[derive(Debug, Default, Deserialize)]
struct SessionQuery {
    dictionary_id: Option<String>,
    size: Option<String>,
    policy: Option<String>,
    order: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct StatsQuery {
    dictionary_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SubmitResultRequest {
    word_id: i64,
    success: bool,
}

#[derive(Debug, Serialize)]
struct StatusResponse {
    status: &'static str,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/session", get(generate_session))
        .route("/result", post(submit_result))
        .route("/stats", get(learner_stats))
}

async fn generate_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<SessionQuery>,
) -> Result<impl IntoResponse, AppError> {
    let learner_id = require_learner(&headers)?;
    let defaults = state.session_defaults();

    let dictionary_id = parse_dictionary_filter(query.dictionary_id.as_deref())?;
    let size = match query.size.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => parse_size(raw)?,
        None => defaults.size,
    };
    let slots = match query.policy.as_deref().filter(|s| !s.trim().is_empty()) {
        Some(raw) => raw
            .parse::<SlotPolicy>()
            .map_err(|err| AppError::validation(err.to_string()))?,
        None => defaults.policy.slots,
    };
    let order = match query.order.as_deref().filter(|s| !s.trim().is_empty()) {
        Some(raw) => raw
            .parse::<PresentationOrder>()
            .map_err(|err| AppError::validation(err.to_string()))?,
        None => defaults.policy.order,
    };

    let request = SessionRequest::new(learner_id, dictionary_id, size, SessionPolicy::new(slots, order));
    let items = state.engine().generate_session(request).await?;

    Ok(Json(items))
}

async fn submit_result(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let learner_id = require_learner(&headers)?;
    let payload: SubmitResultRequest = serde_json::from_slice(&body)
        .map_err(|err| AppError::validation(format!("invalid request body: {err}")))?;
    if payload.word_id <= 0 {
        return Err(AppError::validation("word_id must be a positive integer"));
    }

    state
        .engine()
        .submit_result(learner_id, payload.word_id, payload.success)
        .await?;

    Ok(Json(StatusResponse { status: "ok" }))
}

async fn learner_stats(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<StatsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let learner_id = require_learner(&headers)?;
    let dictionary_id = parse_dictionary_filter(query.dictionary_id.as_deref())?;

    let stats = state.engine().learner_stats(learner_id, dictionary_id).await?;
    Ok(Json(stats))
}

fn require_learner(headers: &HeaderMap) -> Result<i64, AppError> {
    let raw = headers
        .get(LEARNER_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| AppError::unauthorized("missing learner identity"))?;

    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(AppError::unauthorized("invalid learner identity")),
    }
}

/// Absent, empty and `0` all mean "every dictionary".
fn parse_dictionary_filter(raw: Option<&str>) -> Result<Option<i64>, AppError> {
    let Some(raw) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(None);
    };

    match raw.parse::<i64>() {
        Ok(0) => Ok(None),
        Ok(id) if id > 0 => Ok(Some(id)),
        _ => Err(AppError::validation("dictionary_id must be a non-negative integer")),
    }
}

fn parse_size(raw: &str) -> Result<usize, AppError> {
    match raw.parse::<usize>() {
        Ok(size) if (1..=MAX_SESSION_SIZE).contains(&size) => Ok(size),
        _ => Err(AppError::validation(format!(
            "size must be an integer between 1 and {MAX_SESSION_SIZE}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, StatusCode};

    #[test]
    fn test_require_learner() {
        let mut headers = HeaderMap::new();
        assert_eq!(require_learner(&headers).unwrap_err().status(), StatusCode::UNAUTHORIZED);

        headers.insert(LEARNER_HEADER, HeaderValue::from_static("abc"));
        assert!(require_learner(&headers).is_err());

        headers.insert(LEARNER_HEADER, HeaderValue::from_static(" 42 "));
        assert_eq!(require_learner(&headers).unwrap(), 42);
    }

    #[test]
    fn test_dictionary_filter() {
        assert_eq!(parse_dictionary_filter(None).unwrap(), None);
        assert_eq!(parse_dictionary_filter(Some("0")).unwrap(), None);
        assert_eq!(parse_dictionary_filter(Some("")).unwrap(), None);
        assert_eq!(parse_dictionary_filter(Some("7")).unwrap(), Some(7));
        assert!(parse_dictionary_filter(Some("-1")).is_err());
        assert!(parse_dictionary_filter(Some("seven")).is_err());
    }

    #[test]
    fn test_submit_body_shape() {
        let payload: SubmitResultRequest =
            serde_json::from_slice(br#"{"word_id": 3, "success": true}"#).unwrap();
        assert_eq!(payload.word_id, 3);
        assert!(payload.success);

        assert!(serde_json::from_slice::<SubmitResultRequest>(br#"{"word_id": 3}"#).is_err());
        assert!(serde_json::from_slice::<SubmitResultRequest>(b"word_id=3").is_err());
    }

    #[test]
    fn test_size_bounds() {
        assert_eq!(parse_size("1").unwrap(), 1);
        assert_eq!(parse_size("100").unwrap(), 100);
        assert!(parse_size("0").is_err());
        assert!(parse_size("101").is_err());
        assert!(parse_size("-3").is_err());
        assert!(parse_size("2.5").is_err());
    }
}
