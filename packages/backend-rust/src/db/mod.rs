pub mod config;
pub mod operations;
pub mod schema;

use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use thiserror::Error;

use crate::db::config::DbConfig;
use crate::db::schema::{split_sql_statements, strip_comment_lines, SCHEMA_SQL, SCHEMA_VERSION};

#[derive(Clone)]
pub struct Database {
    config: DbConfig,
    pool: SqlitePool,
}

impl Database {
    pub async fn from_env() -> Result<Self, DbInitError> {
        Self::connect(DbConfig::from_env()).await
    }

    pub async fn connect(config: DbConfig) -> Result<Self, DbInitError> {
        if let Some(parent) = config.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| DbInitError::Io(e.to_string()))?;
        }

        let options = SqliteConnectOptions::new()
            .filename(&config.path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(config.busy_timeout)
            .foreign_keys(config.foreign_keys);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .connect_with(options)
            .await?;

        run_migrations(&pool).await?;

        tracing::info!(path = %config.path.display(), "sqlite database ready");

        Ok(Self { config, pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn check_health(&self) -> HealthCheckResult {
        let started = std::time::Instant::now();
        let result = tokio::time::timeout(
            self.config.health_check_timeout,
            sqlx::query("SELECT 1").execute(&self.pool),
        )
        .await;

        match result {
            Ok(Ok(_)) => HealthCheckResult::healthy(started.elapsed()),
            Ok(Err(err)) => HealthCheckResult::unhealthy(err.to_string()),
            Err(_) => HealthCheckResult::unhealthy("timeout".to_string()),
        }
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

async fn run_migrations(pool: &SqlitePool) -> Result<(), DbInitError> {
    // The metadata table does not exist on a fresh database
    let version: Option<String> =
        sqlx::query_scalar(r#"SELECT "value" FROM "_db_metadata" WHERE "key" = 'schema_version'"#)
            .fetch_optional(pool)
            .await
            .unwrap_or(None);

    if version.as_deref() == Some(SCHEMA_VERSION) {
        return Ok(());
    }

    for stmt in split_sql_statements(SCHEMA_SQL) {
        let Some(sql) = strip_comment_lines(&stmt) else {
            continue;
        };
        sqlx::query(&sql).execute(pool).await?;
    }

    sqlx::query(r#"INSERT OR REPLACE INTO "_db_metadata" ("key", "value") VALUES ('schema_version', ?)"#)
        .bind(SCHEMA_VERSION)
        .execute(pool)
        .await?;

    tracing::info!(version = SCHEMA_VERSION, "sqlite schema applied");
    Ok(())
}

#[derive(Debug, Clone)]
pub struct HealthCheckResult {
    pub healthy: bool,
    pub latency: Option<Duration>,
    pub error: Option<String>,
}

impl HealthCheckResult {
    fn healthy(latency: Duration) -> Self {
        Self {
            healthy: true,
            latency: Some(latency),
            error: None,
        }
    }

    fn unhealthy(error: String) -> Self {
        Self {
            healthy: false,
            latency: None,
            error: Some(error),
        }
    }
}

#[derive(Debug, Error)]
pub enum DbInitError {
    #[error("IO error: {0}")]
    Io(String),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}
