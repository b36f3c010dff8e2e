//! Per-(learner, item) learning progress and its bounded numeric fields.
use super::error::{Result, ReviewError};
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Coarse memorization classification derived from recent streaks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemorizationStatus {
    #[default]
    NotMemorized,
    Learning,
    Memorized,
}

impl MemorizationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            MemorizationStatus::NotMemorized => "NOT_MEMORIZED",
            MemorizationStatus::Learning => "LEARNING",
            MemorizationStatus::Memorized => "MEMORIZED",
        }
    }
}

impl fmt::Display for MemorizationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MemorizationStatus {
    type Err = ReviewError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "NOT_MEMORIZED" => Ok(MemorizationStatus::NotMemorized),
            "LEARNING" => Ok(MemorizationStatus::Learning),
            "MEMORIZED" => Ok(MemorizationStatus::Memorized),
            other => Err(ReviewError::InvalidStatus(other.to_string())),
        }
    }
}

/// SM-2 style ease factor, always within [`EaseFactor::MIN`, `EaseFactor::MAX`].
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct EaseFactor(f64);

impl EaseFactor {
    pub const MIN: f64 = 1.3;
    pub const MAX: f64 = 2.5;
    pub const DEFAULT: EaseFactor = EaseFactor(Self::MAX);

    /// Accepts only values already inside the range. Used when loading stored data.
    pub fn new(value: f64) -> Result<Self> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(EaseFactor(value))
        } else {
            Err(ReviewError::EaseFactorOutOfRange(value))
        }
    }

    /// Clamps into range. Used by the scheduler for its own adjustments.
    pub fn clamped(value: f64) -> Self {
        EaseFactor(value.clamp(Self::MIN, Self::MAX))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl Default for EaseFactor {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<f64> for EaseFactor {
    type Error = ReviewError;

    fn try_from(value: f64) -> Result<Self> {
        EaseFactor::new(value)
    }
}

impl From<EaseFactor> for f64 {
    fn from(ease: EaseFactor) -> f64 {
        ease.0
    }
}

/// Days until the next review. Zero means the item was never scored,
/// otherwise the value lies in [`IntervalDays::MIN`, `IntervalDays::MAX`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct IntervalDays(u32);

impl IntervalDays {
    pub const MIN: u32 = 1;
    pub const MAX: u32 = 365;
    pub const UNSCHEDULED: IntervalDays = IntervalDays(0);

    pub fn new(days: u32) -> Result<Self> {
        if days == 0 || (Self::MIN..=Self::MAX).contains(&days) {
            Ok(IntervalDays(days))
        } else {
            Err(ReviewError::IntervalOutOfRange(days))
        }
    }

    /// Clamps a computed interval into [1, 365].
    pub fn scheduled(days: i64) -> Self {
        IntervalDays(days.clamp(Self::MIN as i64, Self::MAX as i64) as u32)
    }

    pub fn days(self) -> u32 {
        self.0
    }

    pub fn is_unscheduled(self) -> bool {
        self.0 == 0
    }
}

impl TryFrom<u32> for IntervalDays {
    type Error = ReviewError;

    fn try_from(days: u32) -> Result<Self> {
        IntervalDays::new(days)
    }
}

impl From<IntervalDays> for u32 {
    fn from(interval: IntervalDays) -> u32 {
        interval.0
    }
}

/// One learner's progress on one vocabulary item.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReviewState {
    pub learner_id: i64,
    pub item_id: i64,
    #[serde(default)]
    pub status: MemorizationStatus,
    /// `None` means never scheduled, due immediately.
    pub next_review_date: Option<NaiveDate>,
    pub interval_days: IntervalDays,
    #[serde(default)]
    pub ease_factor: EaseFactor,
    pub review_count: u32,
    pub last_review_date: Option<NaiveDate>,
    pub consecutive_correct: u32,
    pub consecutive_incorrect: u32,
}

impl ReviewState {
    /// `today` always comes from the caller so the check stays deterministic.
    pub fn is_due(&self, today: NaiveDate) -> bool {
        match self.next_review_date {
            None => true,
            Some(date) => date <= today,
        }
    }

    pub fn has_been_reviewed(&self) -> bool {
        self.review_count > 0
    }

    /// Checks the rules that tie fields together, for states that did not come
    /// from the scheduler (stored rows, imported files).
    ///
    /// Before the first review: interval 0, no streaks, no last review date.
    /// After it: a scheduled interval, exactly one non-zero streak, and the next
    /// review falling `interval_days` after the last one.
    pub fn validate(&self) -> Result<()> {
        let inconsistent = |reason: String| Err(ReviewError::InconsistentState(reason));

        if !self.has_been_reviewed() {
            if !self.interval_days.is_unscheduled() {
                return inconsistent(format!(
                    "interval_days is {} but the item was never reviewed",
                    self.interval_days.days()
                ));
            }
            if self.consecutive_correct != 0 || self.consecutive_incorrect != 0 {
                return inconsistent("streaks are non-zero but the item was never reviewed".to_string());
            }
            if self.last_review_date.is_some() {
                return inconsistent("last_review_date is set but the item was never reviewed".to_string());
            }
            return Ok(());
        }

        if self.interval_days.is_unscheduled() {
            return inconsistent(format!(
                "interval_days is 0 after {} reviews",
                self.review_count
            ));
        }
        if (self.consecutive_correct == 0) == (self.consecutive_incorrect == 0) {
            return inconsistent(format!(
                "exactly one streak must be non-zero, got correct {} and incorrect {}",
                self.consecutive_correct, self.consecutive_incorrect
            ));
        }
        let Some(last) = self.last_review_date else {
            return inconsistent("last_review_date is missing on a reviewed item".to_string());
        };
        let expected = last
            .checked_add_days(Days::new(u64::from(self.interval_days.days())))
            .unwrap_or(NaiveDate::MAX);
        if self.next_review_date != Some(expected) {
            return inconsistent(format!(
                "next_review_date should be {expected} ({last} + {} days)",
                self.interval_days.days()
            ));
        }
        Ok(())
    }
}
