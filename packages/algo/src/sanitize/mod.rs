//! Data Sanitization
//!
//! Repairs mastery records loaded from storage so the scheduler only ever
//! sees values inside its invariants. Rows written by older schema versions
//! may carry NULL-defaulted or out-of-range columns.

use crate::types::{MasteryRecord, DEFAULT_EASE_FACTOR, MIN_EASE_FACTOR};

/// Whether every field satisfies the record invariants.
pub fn is_consistent(record: &MasteryRecord) -> bool {
    record.attempts >= 0
        && record.successes >= 0
        && record.successes <= record.attempts
        && record.interval.is_finite()
        && record.interval >= 0.0
        && record.ease_factor.is_finite()
        && record.ease_factor >= MIN_EASE_FACTOR
        && record.stage >= 0
}

/// Clamp a record into its invariants in place. Returns `true` if anything
/// changed.
pub fn sanitize_record(record: &mut MasteryRecord) -> bool {
    if is_consistent(record) {
        return false;
    }

    record.attempts = record.attempts.max(0);
    record.successes = record.successes.clamp(0, record.attempts);
    record.stage = record.stage.max(0);

    if !record.interval.is_finite() || record.interval < 0.0 {
        record.interval = 0.0;
    }

    // NaN/inf means the column was never written: restore the starting ease
    if !record.ease_factor.is_finite() {
        record.ease_factor = DEFAULT_EASE_FACTOR;
    } else if record.ease_factor < MIN_EASE_FACTOR {
        record.ease_factor = MIN_EASE_FACTOR;
    }

    true
}
