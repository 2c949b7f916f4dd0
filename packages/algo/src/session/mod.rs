//! Session Slot Allocation
//!
//! Pure half of session composition: which pools are consulted in which
//! order, how many slots each may take, duplicate suppression across pools,
//! and the final presentation order. Storage access lives with the caller.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::types::REVIEW_QUOTA;

// ==================== Pools ====================

/// Candidate pool a session item was drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolKind {
    /// Scheduled review time has passed (or was never set)
    Review,
    /// Attempted with a success ratio under 0.6
    Weak,
    /// Never attempted
    New,
    /// Scheduled in the future, used as filler
    Ahead,
}

impl PoolKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Review => "review",
            Self::Weak => "weak",
            Self::New => "new",
            Self::Ahead => "ahead",
        }
    }
}

// ==================== Policies ====================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsePolicyError(String);

impl fmt::Display for ParsePolicyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown session policy value: {}", self.0)
    }
}

impl std::error::Error for ParsePolicyError {}

/// How slots are split between pools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SlotPolicy {
    /// Review fixed at `min(3, size)`, then weak, new, review-ahead.
    #[default]
    FixedReviewQuota,
    /// Every due word first, then new, review-ahead.
    GreedyReview,
}

impl SlotPolicy {
    const FIXED_POOLS: [PoolKind; 4] =
        [PoolKind::Review, PoolKind::Weak, PoolKind::New, PoolKind::Ahead];
    const GREEDY_POOLS: [PoolKind; 3] = [PoolKind::Review, PoolKind::New, PoolKind::Ahead];

    /// Pools in priority order.
    pub fn pools(self) -> &'static [PoolKind] {
        match self {
            Self::FixedReviewQuota => &Self::FIXED_POOLS,
            Self::GreedyReview => &Self::GREEDY_POOLS,
        }
    }

    /// Slots `pool` may fill in a session of `size` with `remaining` open slots.
    pub fn quota(self, pool: PoolKind, size: usize, remaining: usize) -> usize {
        match (self, pool) {
            (Self::FixedReviewQuota, PoolKind::Review) => REVIEW_QUOTA.min(size).min(remaining),
            _ => remaining,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::FixedReviewQuota => "fixed-review-quota",
            Self::GreedyReview => "greedy-review",
        }
    }
}

impl FromStr for SlotPolicy {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "fixed-review-quota" | "fixed" => Ok(Self::FixedReviewQuota),
            "greedy-review" | "greedy" => Ok(Self::GreedyReview),
            _ => Err(ParsePolicyError(s.to_string())),
        }
    }
}

/// Order in which the assembled batch is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PresentationOrder {
    /// Keep pool priority order (review, weak, new, ahead)
    Priority,
    /// Fully shuffled (cramming mode)
    #[default]
    Shuffled,
}

impl PresentationOrder {
    pub fn arrange<T, R: Rng + ?Sized>(self, items: &mut [T], rng: &mut R) {
        if self == Self::Shuffled {
            items.shuffle(rng);
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Priority => "priority",
            Self::Shuffled => "shuffled",
        }
    }
}

impl FromStr for PresentationOrder {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "priority" | "arranged" => Ok(Self::Priority),
            "shuffled" | "shuffle" | "random" => Ok(Self::Shuffled),
            _ => Err(ParsePolicyError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionPolicy {
    pub slots: SlotPolicy,
    pub order: PresentationOrder,
}

impl SessionPolicy {
    pub fn new(slots: SlotPolicy, order: PresentationOrder) -> Self {
        Self { slots, order }
    }
}

// ==================== Builder ====================

/// An item together with the pool that placed it.
#[derive(Debug, Clone, PartialEq)]
pub struct Placed<T> {
    pub pool: PoolKind,
    pub item: T,
}

/// Collects at most `capacity` items with distinct word ids.
#[derive(Debug)]
pub struct SessionBuilder<T> {
    capacity: usize,
    seen: HashSet<i64>,
    placed: Vec<Placed<T>>,
}

impl<T> SessionBuilder<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            seen: HashSet::with_capacity(capacity),
            placed: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.placed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placed.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.capacity.saturating_sub(self.placed.len())
    }

    pub fn is_full(&self) -> bool {
        self.remaining() == 0
    }

    pub fn contains(&self, word_id: i64) -> bool {
        self.seen.contains(&word_id)
    }

    /// Place up to `quota` unseen candidates from `pool`, in the order given.
    /// Already-placed ids are skipped without using a slot. Returns the
    /// number placed.
    pub fn fill<I>(&mut self, pool: PoolKind, quota: usize, candidates: I) -> usize
    where
        I: IntoIterator<Item = (i64, T)>,
    {
        let quota = quota.min(self.remaining());
        let mut taken = 0;

        for (word_id, item) in candidates {
            if taken == quota {
                break;
            }
            if !self.seen.insert(word_id) {
                continue;
            }
            self.placed.push(Placed { pool, item });
            taken += 1;
        }

        taken
    }

    /// Consume the builder, applying the presentation order.
    pub fn finish<R: Rng + ?Sized>(self, order: PresentationOrder, rng: &mut R) -> Vec<Placed<T>> {
        let mut placed = self.placed;
        order.arrange(&mut placed, rng);
        placed
    }
}
