//! Common Types and Constants
//!
//! Shared data structures used across all algorithm modules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==================== Constants ====================

/// Lower bound for the ease factor
pub const MIN_EASE_FACTOR: f64 = 1.3;

/// Ease factor of a record that has never been scheduled
pub const DEFAULT_EASE_FACTOR: f64 = 2.5;

/// Ease factor bonus applied on every success
pub const EASE_BONUS: f64 = 0.1;

/// Ease factor penalty applied on every failure
pub const EASE_PENALTY: f64 = 0.2;

/// Interval (days) after the first success
pub const FIRST_INTERVAL_DAYS: f64 = 1.0;

/// Interval (days) after the second consecutive success
pub const SECOND_INTERVAL_DAYS: f64 = 6.0;

/// Interval (days) after any failure: back in the next session
pub const LAPSE_INTERVAL_DAYS: f64 = 0.5;

/// Success ratio below which an attempted word counts as weak
pub const WEAK_RATIO: f64 = 0.6;

/// Review slots reserved by the fixed-quota policy
pub const REVIEW_QUOTA: usize = 3;

/// Minimum attempts before a word can be counted as mastered in stats
pub const MASTERED_MIN_ATTEMPTS: i64 = 3;

/// Success ratio at or above which a word counts as mastered in stats
pub const MASTERED_RATIO: f64 = 0.8;

// ==================== SRS Types ====================

/// Per-learner, per-word mastery state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MasteryRecord {
    pub learner_id: i64,
    pub word_id: i64,
    /// Total submitted results
    pub attempts: i64,
    /// Successful results, never more than `attempts`
    pub successes: i64,
    pub last_played_at: Option<DateTime<Utc>>,
    /// Unset means "due now"
    pub next_review_at: Option<DateTime<Utc>>,
    /// Days until the next review
    pub interval: f64,
    pub ease_factor: f64,
    /// 0 = new or just failed
    pub stage: i64,
}

impl MasteryRecord {
    /// Zero state used when the learner has no record for the word yet.
    pub fn new(learner_id: i64, word_id: i64) -> Self {
        Self {
            learner_id,
            word_id,
            attempts: 0,
            successes: 0,
            last_played_at: None,
            next_review_at: None,
            interval: 0.0,
            ease_factor: DEFAULT_EASE_FACTOR,
            stage: 0,
        }
    }

    /// `successes / attempts`, or `None` before the first attempt.
    pub fn success_ratio(&self) -> Option<f64> {
        success_ratio(self.attempts, self.successes)
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_review_at.map_or(true, |at| at <= now)
    }
}

pub fn success_ratio(attempts: i64, successes: i64) -> Option<f64> {
    if attempts <= 0 {
        return None;
    }
    Some(successes as f64 / attempts as f64)
}
