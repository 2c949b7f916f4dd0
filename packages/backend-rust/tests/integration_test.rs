use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use lexis_backend::seed::{seed_demo_dictionary, SeedOutcome};
use serde_json::json;
use tower::ServiceExt;

mod common;

use common::{body_json, build_test_app, seed_words, test_database};

fn get(uri: &str, learner: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(learner) = learner {
        builder = builder.header("X-User-ID", learner);
    }
    builder.body(Body::empty()).unwrap()
}

fn post_result(learner: &str, word_id: i64, success: bool) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/result")
        .header("X-User-ID", learner)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({ "word_id": word_id, "success": success }).to_string(),
        ))
        .unwrap()
}

#[tokio::test]
async fn test_health_root() {
    let db = test_database().await;
    let app = build_test_app(db.database.clone(), None);

    let response = app.oneshot(get("/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "connected");
    assert!(body["uptimeSeconds"].is_u64());
}

#[tokio::test]
async fn test_health_live_and_ready() {
    let db = test_database().await;
    let app = build_test_app(db.database.clone(), None);

    let response = app.clone().oneshot(get("/health/live", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get("/health/ready", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["database"]["healthy"], true);
}

#[tokio::test]
async fn test_unknown_route_returns_json_404() {
    let db = test_database().await;
    let app = build_test_app(db.database.clone(), None);

    let response = app.oneshot(get("/api/nope", Some("1"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_session_requires_learner_header() {
    let db = test_database().await;
    let app = build_test_app(db.database.clone(), None);

    let response = app.clone().oneshot(get("/api/session", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app.oneshot(get("/api/session", Some("bob"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_session_rejects_bad_parameters() {
    let db = test_database().await;
    let app = build_test_app(db.database.clone(), None);

    for uri in [
        "/api/session?size=0",
        "/api/session?size=101",
        "/api/session?size=ten",
        "/api/session?policy=lottery",
        "/api/session?order=backwards",
        "/api/session?dictionary_id=x",
    ] {
        let response = app.clone().oneshot(get(uri, Some("1"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
        let body = body_json(response).await;
        assert_eq!(body["code"], "VALIDATION_ERROR", "{uri}");
    }
}

#[tokio::test]
async fn test_fresh_learner_session_is_all_new() {
    let db = test_database().await;
    let (dictionary_id, _) = seed_words(&db.database, "fresh", 15).await;
    seed_words(&db.database, "other", 5).await;
    let app = build_test_app(db.database.clone(), Some(7));

    let uri = format!("/api/session?dictionary_id={dictionary_id}&size=12");
    let response = app.oneshot(get(&uri, Some("3"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let items = body.as_array().expect("bare array");
    assert_eq!(items.len(), 12);
    for item in items {
        assert_eq!(item["proficiency"], 0);
        assert_eq!(item["pool"], "new");
        assert_eq!(item["dictionary_id"], dictionary_id);
        assert!(item["text"].is_string());
    }
}

#[tokio::test]
async fn test_default_session_size_and_zero_filter() {
    let db = test_database().await;
    seed_words(&db.database, "a", 8).await;
    seed_words(&db.database, "b", 8).await;
    let app = build_test_app(db.database.clone(), Some(1));

    let response = app
        .oneshot(get("/api/session?dictionary_id=0", Some("1")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 10);
}

#[tokio::test]
async fn test_submit_then_review_flow() {
    let db = test_database().await;
    let (_, ids) = seed_words(&db.database, "flow", 3).await;
    let app = build_test_app(db.database.clone(), Some(5));

    let response = app.clone().oneshot(post_result("9", ids[0], false)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "status": "ok" }));

    let response = app.clone().oneshot(post_result("9", ids[1], true)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(get("/api/session?order=priority&size=3", Some("9")))
        .await
        .unwrap();
    let body = body_json(response).await;
    let items = body.as_array().unwrap();
    assert_eq!(items.len(), 3);

    // nothing is due yet: the failed word is weak, one word is new and the
    // passed word fills in from the review-ahead pool
    assert_eq!(items[0]["id"], ids[0]);
    assert_eq!(items[0]["pool"], "weak");
    assert_eq!(items[0]["proficiency"], 2);
    assert_eq!(items[1]["id"], ids[2]);
    assert_eq!(items[1]["pool"], "new");
    assert_eq!(items[2]["id"], ids[1]);
    assert_eq!(items[2]["pool"], "ahead");
    assert_eq!(items[2]["proficiency"], 5);

    let response = app.oneshot(get("/api/stats", Some("9"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let stats = body_json(response).await;
    assert_eq!(stats["learner_id"], 9);
    assert_eq!(stats["total_words"], 3);
    assert_eq!(stats["mastered_words"], 0);
    assert_eq!(stats["learning_words"], 2);
    assert_eq!(stats["new_words"], 1);
}

#[tokio::test]
async fn test_submit_rejects_bad_word_id() {
    let db = test_database().await;
    let app = build_test_app(db.database.clone(), None);

    let response = app.oneshot(post_result("1", 0, true)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_submit_malformed_body_uses_error_envelope() {
    let db = test_database().await;
    let app = build_test_app(db.database.clone(), None);

    for body in ["{not json", r#"{"word_id": 1}"#, ""] {
        let request = Request::builder()
            .method("POST")
            .uri("/api/result")
            .header("X-User-ID", "1")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body {body:?}");

        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["code"], "VALIDATION_ERROR");
        assert!(json["error"].as_str().unwrap().starts_with("invalid request body"));
    }
}

#[tokio::test]
async fn test_submit_unknown_word_is_internal_error() {
    let db = test_database().await;
    let app = build_test_app(db.database.clone(), None);

    // foreign key violation surfaces as an opaque failure
    let response = app.oneshot(post_result("1", 999, true)).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["error"], "internal server error");
}

#[tokio::test]
async fn test_demo_seed_is_idempotent() {
    let db = test_database().await;

    let first = seed_demo_dictionary(db.database.pool()).await.unwrap();
    let SeedOutcome::Seeded { dictionary_id, words } = first else {
        panic!("expected a fresh seed, got {first:?}");
    };
    assert!(words > 0);

    let second = seed_demo_dictionary(db.database.pool()).await.unwrap();
    assert_eq!(second, SeedOutcome::AlreadyPresent { dictionary_id });
}
