//! # lexis-algo - vocabulary learning core algorithms
//!
//! Pure Rust, no I/O:
//!
//! - **Boolean SM-2** - pass/fail spaced-repetition scheduling
//! - **Proficiency tagging** - success-ratio classification for session items
//! - **Slot allocation** - pool priority, quotas and deduplication for sessions
//!
//! ## Modules
//!
//! - [`srs`] - the scheduler (`advance`)
//! - [`proficiency`] - `ProficiencyTag` and ratio classification
//! - [`session`] - slot policies, presentation order, `SessionBuilder`
//! - [`sanitize`] - repairing records loaded from storage
//! - [`types`] - shared types and constants
//!
//! ## Example
//!
//! ```rust
//! use chrono::Utc;
//! use lexis_algo::{advance, MasteryRecord};
//!
//! let fresh = MasteryRecord::new(1, 42);
//! let next = advance(&fresh, true, Utc::now());
//! assert_eq!(next.stage, 1);
//! assert_eq!(next.interval, 1.0);
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod proficiency;
pub mod sanitize;
pub mod session;
pub mod srs;
pub mod types;

// ============================================================================
// Re-exports
// ============================================================================

pub use types::*;

pub use proficiency::{classify, ProficiencyTag};

pub use session::{
    ParsePolicyError, Placed, PoolKind, PresentationOrder, SessionBuilder, SessionPolicy,
    SlotPolicy,
};

pub use srs::advance;
