//! Review workflow on top of the SQLite store.
//!
//! Glues the pure scheduler to persistence: validates caller input, loads or
//! initializes the state, scores it and writes it back. Each scoring runs in an
//! immediate transaction and carries the row version, so two concurrent
//! reviews of the same item can never both apply.

use crate::database::db;
use crate::database::StoreError;
use crate::models::{
    Difficulty, IntervalDays, ReviewError, ReviewState, ReviewStats, initialize, preview_intervals,
    score_review, select_due,
};
use chrono::{Local, NaiveDate};
use log::{debug, info};
use rusqlite::{Connection, TransactionBehavior};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("learner id must be positive, got {0}")]
    InvalidLearnerId(i64),

    #[error("item id must be positive, got {0}")]
    InvalidItemId(i64),

    #[error(transparent)]
    Review(#[from] ReviewError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<rusqlite::Error> for ServiceError {
    fn from(err: rusqlite::Error) -> Self {
        ServiceError::Store(StoreError::Sqlite(err))
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;

pub struct ReviewService {
    conn: Connection,
}

impl ReviewService {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Opens the database at `path`, creating the schema if needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(db::init_database(path)?))
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Picks the reference date: explicit value, then the simulated date, then the local clock.
    pub fn resolve_today(&self, explicit: Option<NaiveDate>) -> Result<NaiveDate> {
        if let Some(today) = explicit {
            return Ok(today);
        }
        Ok(db::get_current_date(&self.conn)?.unwrap_or_else(|| Local::now().date_naive()))
    }

    /// Scores one review. `difficulty` is the raw token from the caller.
    pub fn record_review(
        &mut self,
        learner_id: i64,
        item_id: i64,
        difficulty: &str,
        today: NaiveDate,
    ) -> Result<ReviewState> {
        validate_ids(learner_id, item_id)?;
        let difficulty: Difficulty = difficulty.parse()?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let (current, version) = match db::load_review_state(&tx, learner_id, item_id)? {
            Some(stored) => (stored.state, Some(stored.version)),
            None => {
                debug!("no review state for {learner_id}/{item_id}, initializing");
                (initialize(learner_id, item_id, today), None)
            }
        };

        let next = score_review(&current, difficulty, today);
        db::save_review_state(&tx, &next, version)?;
        tx.commit()?;

        info!(
            "learner {} item {} scored {}: {} -> {}, interval {}d, ease {:.2}, next {}",
            learner_id,
            item_id,
            difficulty,
            current.status,
            next.status,
            next.interval_days.days(),
            next.ease_factor.value(),
            next.next_review_date.map(|d| d.to_string()).unwrap_or_default(),
        );
        Ok(next)
    }

    /// Resets an item to a freshly initialized state, due `today`.
    pub fn restart_item(&mut self, learner_id: i64, item_id: i64, today: NaiveDate) -> Result<ReviewState> {
        validate_ids(learner_id, item_id)?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let version = db::load_review_state(&tx, learner_id, item_id)?.map(|stored| stored.version);
        let fresh = initialize(learner_id, item_id, today);
        db::save_review_state(&tx, &fresh, version)?;
        tx.commit()?;

        info!("learner {learner_id} item {item_id} restarted");
        Ok(fresh)
    }

    /// Due items for a learner in review order, optionally capped at `limit`.
    pub fn due_queue(&self, learner_id: i64, today: NaiveDate, limit: Option<usize>) -> Result<Vec<ReviewState>> {
        let states = self.states_for_learner(learner_id)?;
        let mut queue = select_due(&states, today);
        if let Some(limit) = limit {
            queue.truncate(limit);
        }
        debug!("learner {learner_id}: {} due of {} on {today}", queue.len(), states.len());
        Ok(queue)
    }

    /// Interval each difficulty would give the item today. Nothing is written.
    pub fn preview(
        &self,
        learner_id: i64,
        item_id: i64,
        today: NaiveDate,
    ) -> Result<[(Difficulty, IntervalDays); 3]> {
        validate_ids(learner_id, item_id)?;
        let state = match db::load_review_state(&self.conn, learner_id, item_id)? {
            Some(stored) => stored.state,
            None => initialize(learner_id, item_id, today),
        };
        Ok(preview_intervals(&state, today))
    }

    pub fn stats(&self, learner_id: i64, today: NaiveDate) -> Result<ReviewStats> {
        let states = self.states_for_learner(learner_id)?;
        Ok(ReviewStats::from_states(&states, today))
    }

    pub fn states_for_learner(&self, learner_id: i64) -> Result<Vec<ReviewState>> {
        if learner_id <= 0 {
            return Err(ServiceError::InvalidLearnerId(learner_id));
        }
        Ok(db::load_review_states_for_learner(&self.conn, learner_id)?)
    }

    /// Writes imported states, replacing existing rows. All or nothing.
    pub fn import_states(&mut self, states: &[ReviewState]) -> Result<usize> {
        for state in states {
            validate_ids(state.learner_id, state.item_id)?;
            state.validate()?;
        }

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        for state in states {
            let version = db::load_review_state(&tx, state.learner_id, state.item_id)?
                .map(|stored| stored.version);
            db::save_review_state(&tx, state, version)?;
        }
        tx.commit()?;

        info!("imported {} review states", states.len());
        Ok(states.len())
    }
}

fn validate_ids(learner_id: i64, item_id: i64) -> Result<()> {
    if learner_id <= 0 {
        return Err(ServiceError::InvalidLearnerId(learner_id));
    }
    if item_id <= 0 {
        return Err(ServiceError::InvalidItemId(item_id));
    }
    Ok(())
}
