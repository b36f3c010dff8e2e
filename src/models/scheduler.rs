//! Adaptive review scheduling.
//!
//! Every scored review moves an item's ease factor and interval:
//! - easy: streak grows, ease +0.15 (capped at 2.5), interval × ease × 1.3
//! - normal: streak grows, ease unchanged, interval × ease
//! - hard: streak resets, ease -0.20 (floored at 1.3), interval × ease × 0.7
//! - The very first scored review always schedules the item for the next day
//! - Three correct answers in a row mark the item memorized
//!
//! All functions are pure: the reference date is an argument, never read from a clock.

use super::{Difficulty, EaseFactor, IntervalDays, MemorizationStatus, ReviewState};
use chrono::{Days, NaiveDate};

const EASY_EASE_BONUS: f64 = 0.15;
const HARD_EASE_PENALTY: f64 = 0.20;
const MEMORIZED_STREAK: u32 = 3;
const RELAPSE_STREAK: u32 = 2;

/// Creates a fresh state that is reviewable immediately.
/// Also used to restart learning an item from scratch.
pub fn initialize(learner_id: i64, item_id: i64, today: NaiveDate) -> ReviewState {
    ReviewState {
        learner_id,
        item_id,
        status: MemorizationStatus::NotMemorized,
        next_review_date: Some(today),
        interval_days: IntervalDays::UNSCHEDULED,
        ease_factor: EaseFactor::DEFAULT,
        review_count: 0,
        last_review_date: None,
        consecutive_correct: 0,
        consecutive_incorrect: 0,
    }
}

/// Applies one scored review and returns the updated state.
pub fn score_review(state: &ReviewState, difficulty: Difficulty, today: NaiveDate) -> ReviewState {
    let mut next = state.clone();

    next.review_count = next.review_count.saturating_add(1);
    next.last_review_date = Some(today);

    let ease = next.ease_factor.value();
    match difficulty {
        Difficulty::Easy => {
            next.consecutive_correct = next.consecutive_correct.saturating_add(1);
            next.consecutive_incorrect = 0;
            next.ease_factor = EaseFactor::clamped(ease + EASY_EASE_BONUS);
        }
        Difficulty::Normal => {
            next.consecutive_correct = next.consecutive_correct.saturating_add(1);
            next.consecutive_incorrect = 0;
        }
        Difficulty::Hard => {
            next.consecutive_incorrect = next.consecutive_incorrect.saturating_add(1);
            next.consecutive_correct = 0;
            next.ease_factor = EaseFactor::clamped(ease - HARD_EASE_PENALTY);
        }
    }

    let interval = next_interval(next.interval_days, next.ease_factor, difficulty);
    next.interval_days = interval;
    next.next_review_date = Some(add_days(today, interval));

    if let Some(status) = derive_status(next.consecutive_correct, next.consecutive_incorrect) {
        next.status = status;
    }

    next
}

/// Interval each difficulty would produce if chosen now, in `Difficulty::ALL` order.
pub fn preview_intervals(state: &ReviewState, today: NaiveDate) -> [(Difficulty, IntervalDays); 3] {
    Difficulty::ALL.map(|difficulty| (difficulty, score_review(state, difficulty, today).interval_days))
}

fn next_interval(current: IntervalDays, ease: EaseFactor, difficulty: Difficulty) -> IntervalDays {
    // First scored review: always tomorrow, whatever the multiplier.
    if current.is_unscheduled() {
        return IntervalDays::scheduled(1);
    }
    let raw = current.days() as f64 * ease.value() * difficulty.multiplier();
    IntervalDays::scheduled(raw.floor() as i64)
}

// First match wins. With the current reset rules only one streak is ever
// non-zero, so the order of the last two rules does not matter yet.
fn derive_status(correct: u32, incorrect: u32) -> Option<MemorizationStatus> {
    if correct >= MEMORIZED_STREAK {
        Some(MemorizationStatus::Memorized)
    } else if correct >= 1 {
        Some(MemorizationStatus::Learning)
    } else if incorrect >= RELAPSE_STREAK {
        Some(MemorizationStatus::NotMemorized)
    } else {
        None
    }
}

fn add_days(date: NaiveDate, interval: IntervalDays) -> NaiveDate {
    date.checked_add_days(Days::new(u64::from(interval.days())))
        .unwrap_or(NaiveDate::MAX)
}
