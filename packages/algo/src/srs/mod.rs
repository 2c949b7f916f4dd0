//! Boolean SM-2 Scheduler
//!
//! A pass/fail simplification of SM-2: quality is binary, so the ease factor
//! moves by fixed deltas instead of a quality-weighted formula.
//!
//! | stage | success                                  | failure             |
//! |-------|------------------------------------------|---------------------|
//! | 0     | interval 1, stage 1                      | interval 0.5, stage 0 |
//! | 1     | interval 6, stage 2                      | interval 0.5, stage 0 |
//! | >= 2  | interval ceil(interval * ease), stage+1  | interval 0.5, stage 0 |

use chrono::{DateTime, Duration, Utc};

use crate::types::{
    MasteryRecord, EASE_BONUS, EASE_PENALTY, FIRST_INTERVAL_DAYS, LAPSE_INTERVAL_DAYS,
    MIN_EASE_FACTOR, SECOND_INTERVAL_DAYS,
};

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Apply one pass/fail outcome to a record. Total: never fails.
pub fn advance(record: &MasteryRecord, success: bool, now: DateTime<Utc>) -> MasteryRecord {
    let mut next = record.clone();
    next.attempts += 1;
    next.last_played_at = Some(now);

    if success {
        next.successes += 1;

        if next.ease_factor < MIN_EASE_FACTOR {
            next.ease_factor = MIN_EASE_FACTOR;
        }

        match next.stage {
            0 => {
                next.interval = FIRST_INTERVAL_DAYS;
                next.stage = 1;
            }
            1 => {
                next.interval = SECOND_INTERVAL_DAYS;
                next.stage = 2;
            }
            _ => {
                next.interval = (next.interval * next.ease_factor).ceil();
                next.stage += 1;
            }
        }

        next.ease_factor += EASE_BONUS;
    } else {
        next.stage = 0;
        next.interval = LAPSE_INTERVAL_DAYS;
        next.ease_factor = (next.ease_factor - EASE_PENALTY).max(MIN_EASE_FACTOR);
    }

    // Runaway intervals saturate at the latest representable instant
    next.next_review_at = Some(
        now.checked_add_signed(interval_duration(next.interval))
            .unwrap_or(DateTime::<Utc>::MAX_UTC),
    );
    next
}

/// Convert an interval in (fractional) days into a duration, saturating at
/// `Duration::MAX`.
pub fn interval_duration(interval_days: f64) -> Duration {
    if interval_days.is_nan() || interval_days <= 0.0 {
        return Duration::zero();
    }
    // `as` saturates, so infinity maps to i64::MAX
    let millis = (interval_days * MILLIS_PER_DAY).round() as i64;
    Duration::try_milliseconds(millis).unwrap_or(Duration::MAX)
}
