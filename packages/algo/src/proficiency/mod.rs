//! Proficiency Tagging
//!
//! Session-scoped label explaining why a word was picked, derived from the
//! attempt/success ratio. Never persisted.

use serde::{Deserialize, Serialize};

use crate::types::{success_ratio, MASTERED_MIN_ATTEMPTS, MASTERED_RATIO, WEAK_RATIO};

/// Wire value is the numeric level (0, 2, 3, 4, 5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum ProficiencyTag {
    New,
    Weak,
    Learning,
    Proficient,
    Mastered,
}

impl ProficiencyTag {
    pub fn level(self) -> u8 {
        match self {
            Self::New => 0,
            Self::Weak => 2,
            Self::Learning => 3,
            Self::Proficient => 4,
            Self::Mastered => 5,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Weak => "weak",
            Self::Learning => "learning",
            Self::Proficient => "proficient",
            Self::Mastered => "mastered",
        }
    }
}

impl From<ProficiencyTag> for u8 {
    fn from(tag: ProficiencyTag) -> Self {
        tag.level()
    }
}

impl TryFrom<u8> for ProficiencyTag {
    type Error = String;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        match level {
            0 => Ok(Self::New),
            2 => Ok(Self::Weak),
            3 => Ok(Self::Learning),
            4 => Ok(Self::Proficient),
            5 => Ok(Self::Mastered),
            other => Err(format!("unknown proficiency level {other}")),
        }
    }
}

/// Classify by success ratio: `>= 0.9` mastered, `>= 0.8` proficient,
/// `< 0.6` weak, anything else learning.
pub fn classify(attempts: i64, successes: i64) -> ProficiencyTag {
    let Some(ratio) = success_ratio(attempts, successes) else {
        return ProficiencyTag::New;
    };

    if ratio >= 0.9 {
        ProficiencyTag::Mastered
    } else if ratio >= 0.8 {
        ProficiencyTag::Proficient
    } else if ratio < WEAK_RATIO {
        ProficiencyTag::Weak
    } else {
        ProficiencyTag::Learning
    }
}

/// Attempted at least once with a success ratio under 0.6.
pub fn is_weak(attempts: i64, successes: i64) -> bool {
    success_ratio(attempts, successes).is_some_and(|ratio| ratio < WEAK_RATIO)
}

/// Stats bucket: at least three attempts with a ratio of 0.8 or better.
pub fn is_mastered(attempts: i64, successes: i64) -> bool {
    attempts >= MASTERED_MIN_ATTEMPTS
        && success_ratio(attempts, successes).is_some_and(|ratio| ratio >= MASTERED_RATIO)
}
