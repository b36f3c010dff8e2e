//! Selection and ordering of due review states into a work queue.
use super::{MemorizationStatus, ReviewState};
use chrono::NaiveDate;
use serde::Serialize;
use std::cmp::Ordering;

/// Returns the states due on `today`, highest priority first.
///
/// Priority: never-scheduled items, then most overdue, then the longest
/// run of hard answers, then the fewest reviews. The sort is stable, so
/// fully tied states keep their input order.
pub fn select_due(states: &[ReviewState], today: NaiveDate) -> Vec<ReviewState> {
    let mut due: Vec<ReviewState> = states
        .iter()
        .filter(|state| state.is_due(today))
        .cloned()
        .collect();
    due.sort_by(queue_order);
    due
}

fn queue_order(a: &ReviewState, b: &ReviewState) -> Ordering {
    // `None < Some(_)`, so unscheduled states sort ahead of dated ones.
    a.next_review_date
        .cmp(&b.next_review_date)
        .then_with(|| b.consecutive_incorrect.cmp(&a.consecutive_incorrect))
        .then_with(|| a.review_count.cmp(&b.review_count))
}

/// Per-learner summary of review progress.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ReviewStats {
    pub total: usize,
    pub not_memorized: usize,
    pub learning: usize,
    pub memorized: usize,
    pub never_reviewed: usize,
    pub due: usize,
}

impl ReviewStats {
    pub fn from_states(states: &[ReviewState], today: NaiveDate) -> Self {
        let mut stats = ReviewStats {
            total: states.len(),
            ..Default::default()
        };
        for state in states {
            match state.status {
                MemorizationStatus::NotMemorized => stats.not_memorized += 1,
                MemorizationStatus::Learning => stats.learning += 1,
                MemorizationStatus::Memorized => stats.memorized += 1,
            }
            if !state.has_been_reviewed() {
                stats.never_reviewed += 1;
            }
            if state.is_due(today) {
                stats.due += 1;
            }
        }
        stats
    }
}
