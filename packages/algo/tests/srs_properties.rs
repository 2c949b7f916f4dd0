//! Property-Based Tests for the boolean SM-2 scheduler
//!
//! Invariants:
//! - Ease floor: ease factor never drops below 1.3
//! - Failure reset: stage 0, interval 0.5 regardless of prior stage
//! - Counters: attempts +1 per call, successes +1 iff success
//! - Growth: stage >= 2 success multiplies the interval by the ease factor

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;

use lexis_algo::sanitize::is_consistent;
use lexis_algo::{advance, MasteryRecord, MIN_EASE_FACTOR};

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_now() -> impl Strategy<Value = DateTime<Utc>> {
    (0i64..=400 * 24 * 3600).prop_map(|offset| {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::seconds(offset)
    })
}

fn arb_record() -> impl Strategy<Value = MasteryRecord> {
    (
        0i64..=500,             // attempts
        0u32..=1000,            // success share (per mille)
        0u32..=3650,            // interval, in tenths of a day
        1300u32..=4000,         // ease factor, thousandths
        0i64..=20,              // stage
    )
        .prop_map(|(attempts, share, interval, ease, stage)| MasteryRecord {
            attempts,
            successes: attempts * share as i64 / 1000,
            interval: interval as f64 / 10.0,
            ease_factor: ease as f64 / 1000.0,
            stage,
            ..MasteryRecord::new(1, 1)
        })
}

proptest! {
    #[test]
    fn prop_ease_never_below_floor(
        record in arb_record(),
        outcomes in proptest::collection::vec(any::<bool>(), 1..30),
        now in arb_now(),
    ) {
        let mut current = record;
        for success in outcomes {
            current = advance(&current, success, now);
            prop_assert!(current.ease_factor >= MIN_EASE_FACTOR);
            prop_assert!(is_consistent(&current));
        }
    }

    #[test]
    fn prop_failure_always_resets(record in arb_record(), now in arb_now()) {
        let next = advance(&record, false, now);
        prop_assert_eq!(next.stage, 0);
        prop_assert_eq!(next.interval, 0.5);
        prop_assert_eq!(next.next_review_at, Some(now + Duration::hours(12)));
    }

    #[test]
    fn prop_counters_track_outcome(record in arb_record(), success in any::<bool>(), now in arb_now()) {
        let next = advance(&record, success, now);
        prop_assert_eq!(next.attempts, record.attempts + 1);
        prop_assert_eq!(next.successes, record.successes + i64::from(success));
        prop_assert_eq!(next.last_played_at, Some(now));
    }

    #[test]
    fn prop_mature_success_grows_interval(record in arb_record(), now in arb_now()) {
        prop_assume!(record.stage >= 2);
        let next = advance(&record, true, now);
        prop_assert_eq!(next.stage, record.stage + 1);
        prop_assert_eq!(next.interval, (record.interval * record.ease_factor).ceil());
        prop_assert!(next.next_review_at.unwrap() >= now);
    }
}
