use std::collections::HashMap;

use chrono::{DateTime, Utc};
use lexis_algo::sanitize::sanitize_record;
use lexis_algo::{MasteryRecord, DEFAULT_EASE_FACTOR, MASTERED_MIN_ATTEMPTS, MASTERED_RATIO, WEAK_RATIO};
use rand::seq::IndexedRandom;
use rand::Rng;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};

use crate::db::operations::content::map_word;
use crate::services::progress_store::{Candidate, LearnerStats, ProgressStore, Scope, StoreError};

const CANDIDATE_COLUMNS: &str = r#"
    w."id", w."dictionary_id", w."text", w."definition", w."difficulty", w."pronunciation_url",
    p."attempts", p."successes", p."last_played_at", p."next_review_at",
    p."interval", p."ease_factor", p."stage"
"#;

/// SQLite-backed progress store.
#[derive(Clone)]
pub struct SqliteProgressStore {
    pool: SqlitePool,
}

impl SqliteProgressStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn candidates_by_due(
        &self,
        scope: Scope,
        now: DateTime<Utc>,
        limit: usize,
        ahead: bool,
    ) -> Result<Vec<Candidate>, StoreError> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT ");
        qb.push(CANDIDATE_COLUMNS);
        qb.push(
            r#" FROM "mastery_records" p JOIN "words" w ON w."id" = p."word_id" WHERE p."learner_id" = "#,
        );
        qb.push_bind(scope.learner_id);
        if ahead {
            qb.push(r#" AND p."next_review_at" > "#);
            qb.push_bind(now.timestamp_millis());
        } else {
            qb.push(r#" AND (p."next_review_at" IS NULL OR p."next_review_at" <= "#);
            qb.push_bind(now.timestamp_millis());
            qb.push(")");
        }
        push_dictionary_filter(&mut qb, scope);
        qb.push(r#" ORDER BY p."next_review_at" ASC, p."word_id" ASC LIMIT "#);
        qb.push_bind(sql_limit(limit));

        let rows = qb.build().fetch_all(&self.pool).await?;
        rows.iter()
            .map(|row| map_candidate(row, scope.learner_id))
            .collect::<Result<Vec<_>, _>>()
            .map_err(StoreError::from)
    }

    /// Load candidates for `ids`, keeping the order of `ids`.
    async fn candidates_by_ids(&self, learner_id: i64, ids: &[i64]) -> Result<Vec<Candidate>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT ");
        qb.push(CANDIDATE_COLUMNS);
        qb.push(r#" FROM "words" w LEFT JOIN "mastery_records" p ON p."word_id" = w."id" AND p."learner_id" = "#);
        qb.push_bind(learner_id);
        qb.push(r#" WHERE w."id" IN ("#);
        let mut separated = qb.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        let rows = qb.build().fetch_all(&self.pool).await?;
        let mut by_id = HashMap::with_capacity(rows.len());
        for row in &rows {
            let candidate = map_candidate(row, learner_id)?;
            by_id.insert(candidate.word.id, candidate);
        }

        Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }

    async fn sample_pool<R>(
        &self,
        scope: Scope,
        mut qb: QueryBuilder<'_, Sqlite>,
        limit: usize,
        rng: &mut R,
    ) -> Result<Vec<Candidate>, StoreError>
    where
        R: Rng + Send + ?Sized,
    {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let pool_ids: Vec<i64> = qb.build_query_scalar().fetch_all(&self.pool).await?;
        let sampled: Vec<i64> = pool_ids.choose_multiple(rng, limit).copied().collect();
        self.candidates_by_ids(scope.learner_id, &sampled).await
    }
}

impl ProgressStore for SqliteProgressStore {
    async fn get(&self, learner_id: i64, word_id: i64) -> Result<Option<MasteryRecord>, StoreError> {
        Ok(fetch_record(&self.pool, learner_id, word_id).await?)
    }

    async fn upsert(&self, record: &MasteryRecord) -> Result<(), StoreError> {
        write_record(&self.pool, record).await?;
        Ok(())
    }

    async fn modify<F>(&self, learner_id: i64, word_id: i64, f: F) -> Result<MasteryRecord, StoreError>
    where
        F: FnOnce(Option<MasteryRecord>) -> MasteryRecord + Send,
    {
        // Dropping `tx` before commit rolls back, so a cancelled submit
        // never returns a connection to the pool mid-transaction
        let mut tx = self.pool.begin().await?;

        // Take the write lock before reading so two submits for the same
        // pair cannot both read the old counters
        sqlx::query(
            r#"UPDATE "mastery_records" SET "attempts" = "attempts" WHERE "learner_id" = ? AND "word_id" = ?"#,
        )
        .bind(learner_id)
        .bind(word_id)
        .execute(&mut *tx)
        .await?;

        let current = fetch_record(&mut *tx, learner_id, word_id).await?;
        let next = f(current);
        write_record(&mut *tx, &next).await?;

        tx.commit().await?;
        Ok(next)
    }

    async fn due_for_review(
        &self,
        scope: Scope,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Candidate>, StoreError> {
        self.candidates_by_due(scope, now, limit, false).await
    }

    async fn weak<R>(&self, scope: Scope, limit: usize, rng: &mut R) -> Result<Vec<Candidate>, StoreError>
    where
        R: Rng + Send + ?Sized,
    {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
            r#"SELECT p."word_id" FROM "mastery_records" p JOIN "words" w ON w."id" = p."word_id" WHERE p."learner_id" = "#,
        );
        qb.push_bind(scope.learner_id);
        qb.push(r#" AND p."attempts" > 0 AND CAST(p."successes" AS REAL) / p."attempts" < "#);
        qb.push_bind(WEAK_RATIO);
        push_dictionary_filter(&mut qb, scope);
        qb.push(r#" ORDER BY p."word_id""#);

        self.sample_pool(scope, qb, limit, rng).await
    }

    async fn never_attempted<R>(
        &self,
        scope: Scope,
        limit: usize,
        rng: &mut R,
    ) -> Result<Vec<Candidate>, StoreError>
    where
        R: Rng + Send + ?Sized,
    {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
            r#"SELECT w."id" FROM "words" w LEFT JOIN "mastery_records" p ON p."word_id" = w."id" AND p."learner_id" = "#,
        );
        qb.push_bind(scope.learner_id);
        qb.push(r#" WHERE (p."word_id" IS NULL OR p."attempts" = 0)"#);
        push_dictionary_filter(&mut qb, scope);
        qb.push(r#" ORDER BY w."id""#);

        self.sample_pool(scope, qb, limit, rng).await
    }

    async fn scheduled_ahead(
        &self,
        scope: Scope,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Candidate>, StoreError> {
        self.candidates_by_due(scope, now, limit, true).await
    }

    async fn learner_stats(&self, scope: Scope) -> Result<LearnerStats, StoreError> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
            r#"SELECT
                COALESCE(SUM(CASE WHEN p."attempts" >= "#,
        );
        qb.push_bind(MASTERED_MIN_ATTEMPTS);
        qb.push(r#" AND CAST(p."successes" AS REAL) / p."attempts" >= "#);
        qb.push_bind(MASTERED_RATIO);
        qb.push(r#" THEN 1 ELSE 0 END), 0) AS "mastered", COUNT(*) AS "recorded"
            FROM "mastery_records" p JOIN "words" w ON w."id" = p."word_id"
            WHERE p."learner_id" = "#);
        qb.push_bind(scope.learner_id);
        push_dictionary_filter(&mut qb, scope);

        let row = qb.build().fetch_one(&self.pool).await?;
        let mastered: i64 = row.try_get("mastered")?;
        let recorded: i64 = row.try_get("recorded")?;

        let total = crate::db::operations::content::count_words(&self.pool, scope.dictionary_id).await?;

        Ok(LearnerStats::from_counts(
            scope.learner_id,
            total,
            mastered,
            recorded - mastered,
        ))
    }
}

fn push_dictionary_filter(qb: &mut QueryBuilder<'_, Sqlite>, scope: Scope) {
    if let Some(dictionary_id) = scope.dictionary_id {
        qb.push(r#" AND w."dictionary_id" = "#);
        qb.push_bind(dictionary_id);
    }
}

fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

async fn fetch_record<'e, E>(
    executor: E,
    learner_id: i64,
    word_id: i64,
) -> Result<Option<MasteryRecord>, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query(
        r#"SELECT "learner_id", "word_id", "attempts", "successes", "last_played_at", "next_review_at",
                  "interval", "ease_factor", "stage"
           FROM "mastery_records" WHERE "learner_id" = ? AND "word_id" = ?"#,
    )
    .bind(learner_id)
    .bind(word_id)
    .fetch_optional(executor)
    .await?;

    row.map(|r| map_record(&r, learner_id, word_id)).transpose()
}

async fn write_record<'e, E>(executor: E, record: &MasteryRecord) -> Result<(), sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO "mastery_records" (
            "learner_id", "word_id", "attempts", "successes", "last_played_at",
            "next_review_at", "interval", "ease_factor", "stage"
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT ("learner_id", "word_id") DO UPDATE SET
            "attempts" = excluded."attempts",
            "successes" = excluded."successes",
            "last_played_at" = excluded."last_played_at",
            "next_review_at" = excluded."next_review_at",
            "interval" = excluded."interval",
            "ease_factor" = excluded."ease_factor",
            "stage" = excluded."stage"
        "#,
    )
    .bind(record.learner_id)
    .bind(record.word_id)
    .bind(record.attempts)
    .bind(record.successes)
    .bind(record.last_played_at.map(|at| at.timestamp_millis()))
    .bind(record.next_review_at.map(|at| at.timestamp_millis()))
    .bind(record.interval)
    .bind(record.ease_factor)
    .bind(record.stage)
    .execute(executor)
    .await?;
    Ok(())
}

fn map_record(row: &SqliteRow, learner_id: i64, word_id: i64) -> Result<MasteryRecord, sqlx::Error> {
    let mut record = MasteryRecord {
        learner_id,
        word_id,
        attempts: row.try_get("attempts")?,
        successes: row.try_get("successes")?,
        last_played_at: millis_to_datetime(row.try_get("last_played_at")?),
        next_review_at: millis_to_datetime(row.try_get("next_review_at")?),
        interval: row.try_get::<Option<f64>, _>("interval")?.unwrap_or(1.0),
        ease_factor: row
            .try_get::<Option<f64>, _>("ease_factor")?
            .unwrap_or(DEFAULT_EASE_FACTOR),
        stage: row.try_get::<Option<i64>, _>("stage")?.unwrap_or(0),
    };

    if sanitize_record(&mut record) {
        tracing::debug!(learner_id, word_id, "repaired inconsistent mastery record");
    }

    Ok(record)
}

fn map_candidate(row: &SqliteRow, learner_id: i64) -> Result<Candidate, sqlx::Error> {
    let word = map_word(row)?;
    // LEFT JOIN miss: no record for this learner yet
    let has_record = row.try_get::<Option<i64>, _>("attempts")?.is_some();
    let record = if has_record {
        Some(map_record(row, learner_id, word.id)?)
    } else {
        None
    };

    Ok(Candidate { word, record })
}

fn millis_to_datetime(value: Option<i64>) -> Option<DateTime<Utc>> {
    value.and_then(DateTime::<Utc>::from_timestamp_millis)
}
