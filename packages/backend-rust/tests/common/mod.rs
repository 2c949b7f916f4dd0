#![allow(dead_code)]

use axum::body::Body;
use axum::http::Response;
use axum::Router;
use chrono::{DateTime, TimeZone, Utc};
use lexis_backend::config::SessionDefaults;
use lexis_backend::db::config::DbConfig;
use lexis_backend::db::operations::content::{insert_dictionary, insert_words, NewWord};
use lexis_backend::db::Database;
use lexis_backend::state::AppState;
use tempfile::TempDir;

/// Keeps the temporary directory alive as long as the database is in use.
pub struct TestDb {
    pub dir: TempDir,
    pub database: Database,
}

pub async fn test_database() -> TestDb {
    test_database_with(|_| {}).await
}

pub async fn test_database_with(configure: impl FnOnce(&mut DbConfig)) -> TestDb {
    let dir = tempfile::tempdir().expect("create temp dir");
    let mut config = DbConfig::at_path(dir.path().join("lexis-test.db"));
    configure(&mut config);
    let database = Database::connect(config).await.expect("open sqlite database");
    TestDb { dir, database }
}

pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

/// Insert a dictionary holding `count` words. Returns the dictionary id and
/// the word ids in insertion order.
pub async fn seed_words(database: &Database, name: &str, count: usize) -> (i64, Vec<i64>) {
    let dictionary_id = insert_dictionary(database.pool(), name, "test words", true)
        .await
        .expect("insert dictionary");
    let words: Vec<NewWord> = (0..count)
        .map(|i| NewWord::new(format!("{name}-{i}"), format!("meaning {i}"), 1))
        .collect();
    let ids = insert_words(database.pool(), dictionary_id, &words)
        .await
        .expect("insert words");
    (dictionary_id, ids)
}

pub fn build_test_app(database: Database, rng_seed: Option<u64>) -> Router {
    let defaults = SessionDefaults {
        rng_seed,
        ..SessionDefaults::default()
    };
    lexis_backend::build_app(AppState::new(database, defaults))
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}
