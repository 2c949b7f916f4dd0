use std::future::Future;

use chrono::{DateTime, Utc};
use lexis_algo::{classify, MasteryRecord, ProficiencyTag};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::operations::content::Word;

// ========== Types ==========

/// Learner and optional dictionary a pool query is restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scope {
    pub learner_id: i64,
    pub dictionary_id: Option<i64>,
}

impl Scope {
    pub fn new(learner_id: i64, dictionary_id: Option<i64>) -> Self {
        Self {
            learner_id,
            dictionary_id,
        }
    }

    pub fn includes(&self, word: &Word) -> bool {
        self.dictionary_id.map_or(true, |id| word.dictionary_id == id)
    }
}

/// A pool entry: the word plus the learner's record for it, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub word: Word,
    pub record: Option<MasteryRecord>,
}

impl Candidate {
    pub fn proficiency(&self) -> ProficiencyTag {
        match &self.record {
            Some(record) => classify(record.attempts, record.successes),
            None => ProficiencyTag::New,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearnerStats {
    pub learner_id: i64,
    pub total_words: i64,
    pub mastered_words: i64,
    pub learning_words: i64,
    pub new_words: i64,
}

impl LearnerStats {
    /// Words without a mastered/learning record count as new.
    pub fn from_counts(learner_id: i64, total_words: i64, mastered: i64, learning: i64) -> Self {
        Self {
            learner_id,
            total_words,
            mastered_words: mastered,
            learning_words: learning,
            new_words: (total_words - mastered - learning).max(0),
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

// ========== Contract ==========

/// Durable per-(learner, word) mastery storage plus the pool queries session
/// composition reads from. Implementations hold no scheduling logic.
pub trait ProgressStore: Send + Sync {
    fn get(
        &self,
        learner_id: i64,
        word_id: i64,
    ) -> impl Future<Output = Result<Option<MasteryRecord>, StoreError>> + Send;

    /// Insert or overwrite every field of the record keyed by (learner, word).
    fn upsert(&self, record: &MasteryRecord) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Atomic read-modify-write: `f` sees the current record (or `None`) and
    /// its result is stored before any concurrent `modify` on the same pair
    /// can read. On error the stored record is unchanged.
    fn modify<F>(
        &self,
        learner_id: i64,
        word_id: i64,
        f: F,
    ) -> impl Future<Output = Result<MasteryRecord, StoreError>> + Send
    where
        F: FnOnce(Option<MasteryRecord>) -> MasteryRecord + Send;

    /// `next_review_at <= now` or unset, oldest due first (unset first).
    fn due_for_review(
        &self,
        scope: Scope,
        now: DateTime<Utc>,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Candidate>, StoreError>> + Send;

    /// Attempted with a success ratio under 0.6, sampled with `rng`.
    fn weak<R>(
        &self,
        scope: Scope,
        limit: usize,
        rng: &mut R,
    ) -> impl Future<Output = Result<Vec<Candidate>, StoreError>> + Send
    where
        R: Rng + Send + ?Sized;

    /// No record or zero attempts, sampled with `rng`.
    fn never_attempted<R>(
        &self,
        scope: Scope,
        limit: usize,
        rng: &mut R,
    ) -> impl Future<Output = Result<Vec<Candidate>, StoreError>> + Send
    where
        R: Rng + Send + ?Sized;

    /// `next_review_at > now`, soonest first.
    fn scheduled_ahead(
        &self,
        scope: Scope,
        now: DateTime<Utc>,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Candidate>, StoreError>> + Send;

    fn learner_stats(
        &self,
        scope: Scope,
    ) -> impl Future<Output = Result<LearnerStats, StoreError>> + Send;
}
