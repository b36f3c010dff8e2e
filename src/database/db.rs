//! Database operations for review scheduling
//!
//! Handles SQLite schema initialization, versioned load/save of review states,
//! and the simulated current date used to walk schedules forward by hand.
//!
//! Stored values are validated on load. A row whose ease factor, interval,
//! status or counters are out of range is reported as `StoreError::CorruptState`
//! instead of being repaired.

use crate::models::{EaseFactor, IntervalDays, MemorizationStatus, ReviewState};
use chrono::{Days, NaiveDate};
use log::{debug, warn};
use rusqlite::types::Value;
use rusqlite::{Connection, ErrorCode, OptionalExtension, Row, params};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("review state for learner {learner_id}, item {item_id} was modified concurrently")]
    Conflict { learner_id: i64, item_id: i64 },

    #[error("stored review state for learner {learner_id}, item {item_id} is invalid: {reason}")]
    CorruptState {
        learner_id: i64,
        item_id: i64,
        reason: String,
    },

    #[error("stored current date '{0}' is not a YYYY-MM-DD date")]
    InvalidCurrentDate(String),

    #[error("cannot advance the simulated date past {0}")]
    DateOutOfRange(NaiveDate),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// A review state together with its optimistic-concurrency version.
#[derive(Clone, Debug, PartialEq)]
pub struct StoredReviewState {
    pub state: ReviewState,
    pub version: i64,
}

const STATE_COLUMNS: &str = "learner_id, item_id, status, next_review_date, interval_days, \
     ease_factor, review_count, last_review_date, consecutive_correct, consecutive_incorrect, version";

/// Opens (or creates) the database file and ensures the schema exists.
pub fn init_database(path: impl AsRef<Path>) -> Result<Connection> {
    let conn = Connection::open(path)?;
    init_schema(&conn)?;
    Ok(conn)
}

/// Creates tables for review states and app state if missing.
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS review_states (
            learner_id INTEGER NOT NULL,
            item_id INTEGER NOT NULL,
            status TEXT NOT NULL DEFAULT 'NOT_MEMORIZED',
            next_review_date TEXT,
            interval_days INTEGER NOT NULL DEFAULT 0,
            ease_factor REAL NOT NULL DEFAULT 2.5,
            review_count INTEGER NOT NULL DEFAULT 0,
            last_review_date TEXT,
            consecutive_correct INTEGER NOT NULL DEFAULT 0,
            consecutive_incorrect INTEGER NOT NULL DEFAULT 0,
            version INTEGER NOT NULL DEFAULT 1,
            PRIMARY KEY (learner_id, item_id)
        )",
        (),
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_review_states_due
         ON review_states (learner_id, next_review_date)",
        (),
    )?;

    // Key/value settings, currently only the simulated current date
    conn.execute(
        "CREATE TABLE IF NOT EXISTS app_state (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )",
        (),
    )?;

    Ok(())
}

/// Raw column values, decoded and validated separately so bad data gets a
/// precise `CorruptState` instead of a driver conversion error.
struct StateRow {
    learner_id: i64,
    item_id: i64,
    status: Value,
    next_review_date: Value,
    interval_days: Value,
    ease_factor: Value,
    review_count: Value,
    last_review_date: Value,
    consecutive_correct: Value,
    consecutive_incorrect: Value,
    version: i64,
}

impl StateRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            learner_id: row.get(0)?,
            item_id: row.get(1)?,
            status: row.get(2)?,
            next_review_date: row.get(3)?,
            interval_days: row.get(4)?,
            ease_factor: row.get(5)?,
            review_count: row.get(6)?,
            last_review_date: row.get(7)?,
            consecutive_correct: row.get(8)?,
            consecutive_incorrect: row.get(9)?,
            version: row.get(10)?,
        })
    }

    fn validate(self) -> Result<StoredReviewState> {
        let (learner_id, item_id) = (self.learner_id, self.item_id);
        let corrupt = |reason: String| StoreError::CorruptState {
            learner_id,
            item_id,
            reason,
        };
        let counter = |name: &str, value: &Value| match value {
            Value::Integer(n) => {
                u32::try_from(*n).map_err(|_| corrupt(format!("{name} {n} is not a valid count")))
            }
            other => Err(corrupt(format!("{name} is not an integer: {other:?}"))),
        };
        let date = |name: &str, value: &Value| match value {
            Value::Null => Ok(None),
            Value::Text(text) => NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .map(Some)
                .map_err(|_| corrupt(format!("{name} '{text}' is not a YYYY-MM-DD date"))),
            other => Err(corrupt(format!("{name} is not a date: {other:?}"))),
        };

        let status = match &self.status {
            Value::Text(text) => text
                .parse::<MemorizationStatus>()
                .map_err(|e| corrupt(e.to_string()))?,
            other => return Err(corrupt(format!("status is not text: {other:?}"))),
        };
        let interval_days = IntervalDays::new(counter("interval_days", &self.interval_days)?)
            .map_err(|e| corrupt(e.to_string()))?;
        let ease_factor = match self.ease_factor {
            Value::Real(ease) => ease,
            Value::Integer(ease) => ease as f64,
            ref other => return Err(corrupt(format!("ease_factor is not a number: {other:?}"))),
        };
        let ease_factor = EaseFactor::new(ease_factor).map_err(|e| corrupt(e.to_string()))?;

        let state = ReviewState {
            learner_id,
            item_id,
            status,
            next_review_date: date("next_review_date", &self.next_review_date)?,
            interval_days,
            ease_factor,
            review_count: counter("review_count", &self.review_count)?,
            last_review_date: date("last_review_date", &self.last_review_date)?,
            consecutive_correct: counter("consecutive_correct", &self.consecutive_correct)?,
            consecutive_incorrect: counter("consecutive_incorrect", &self.consecutive_incorrect)?,
        };
        state.validate().map_err(|e| corrupt(e.to_string()))?;

        Ok(StoredReviewState {
            state,
            version: self.version,
        })
    }
}

/// Looks up the review state of one (learner, item) pair.
///
/// `None` means the item was never started; callers initialize it.
pub fn load_review_state(
    conn: &Connection,
    learner_id: i64,
    item_id: i64,
) -> Result<Option<StoredReviewState>> {
    let sql = format!(
        "SELECT {STATE_COLUMNS} FROM review_states WHERE learner_id = ?1 AND item_id = ?2"
    );
    let row = conn
        .query_row(&sql, params![learner_id, item_id], StateRow::from_row)
        .optional()?;

    match row {
        Some(row) => row.validate().map(Some).inspect_err(|e| warn!("{e}")),
        None => Ok(None),
    }
}

/// Retrieves every review state of a learner, ordered by item id.
///
/// No due filtering happens here; ordering for review is `select_due`'s job.
pub fn load_review_states_for_learner(conn: &Connection, learner_id: i64) -> Result<Vec<ReviewState>> {
    let sql = format!("SELECT {STATE_COLUMNS} FROM review_states WHERE learner_id = ?1 ORDER BY item_id ASC");
    let mut stmt = conn.prepare(&sql)?;

    let rows = stmt
        .query_map(params![learner_id], StateRow::from_row)?
        .collect::<rusqlite::Result<Vec<StateRow>>>()?;

    rows.into_iter()
        .map(|row| {
            row.validate()
                .map(|stored| stored.state)
                .inspect_err(|e| warn!("{e}"))
        })
        .collect()
}

/// Persists a review state with an optimistic version check.
///
/// `expected_version == None` inserts a new row and fails with `Conflict` if one
/// already exists. Otherwise the row is only updated while its version still
/// matches. Returns the new version.
pub fn save_review_state(
    conn: &Connection,
    state: &ReviewState,
    expected_version: Option<i64>,
) -> Result<i64> {
    let conflict = || StoreError::Conflict {
        learner_id: state.learner_id,
        item_id: state.item_id,
    };

    match expected_version {
        None => {
            let inserted = conn.execute(
                "INSERT INTO review_states (learner_id, item_id, status, next_review_date, interval_days,
                    ease_factor, review_count, last_review_date, consecutive_correct, consecutive_incorrect, version)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, 1)",
                params![
                    state.learner_id,
                    state.item_id,
                    state.status.as_str(),
                    state.next_review_date,
                    state.interval_days.days(),
                    state.ease_factor.value(),
                    state.review_count,
                    state.last_review_date,
                    state.consecutive_correct,
                    state.consecutive_incorrect,
                ],
            );
            match inserted {
                Ok(_) => {
                    debug!("inserted review state {}/{}", state.learner_id, state.item_id);
                    Ok(1)
                }
                Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                    Err(conflict())
                }
                Err(e) => Err(e.into()),
            }
        }
        Some(version) => {
            let changed = conn.execute(
                "UPDATE review_states
                 SET status = ?1, next_review_date = ?2, interval_days = ?3, ease_factor = ?4,
                     review_count = ?5, last_review_date = ?6, consecutive_correct = ?7,
                     consecutive_incorrect = ?8, version = version + 1
                 WHERE learner_id = ?9 AND item_id = ?10 AND version = ?11",
                params![
                    state.status.as_str(),
                    state.next_review_date,
                    state.interval_days.days(),
                    state.ease_factor.value(),
                    state.review_count,
                    state.last_review_date,
                    state.consecutive_correct,
                    state.consecutive_incorrect,
                    state.learner_id,
                    state.item_id,
                    version,
                ],
            )?;
            if changed == 0 {
                return Err(conflict());
            }
            debug!(
                "updated review state {}/{} to version {}",
                state.learner_id,
                state.item_id,
                version + 1
            );
            Ok(version + 1)
        }
    }
}

/// Removes a review state. Returns whether a row existed.
pub fn delete_review_state(conn: &Connection, learner_id: i64, item_id: i64) -> Result<bool> {
    let deleted = conn.execute(
        "DELETE FROM review_states WHERE learner_id = ?1 AND item_id = ?2",
        params![learner_id, item_id],
    )?;
    Ok(deleted > 0)
}

/// Retrieves the simulated current date, if one has been set
pub fn get_current_date(conn: &Connection) -> Result<Option<NaiveDate>> {
    let value: Option<String> = conn
        .query_row(
            "SELECT value FROM app_state WHERE key = 'current_date'",
            [],
            |row| row.get(0),
        )
        .optional()?;

    value
        .map(|v| NaiveDate::parse_from_str(&v, "%Y-%m-%d").map_err(|_| StoreError::InvalidCurrentDate(v)))
        .transpose()
}

/// Pins the simulated current date
pub fn set_current_date(conn: &Connection, date: NaiveDate) -> Result<()> {
    conn.execute(
        "INSERT INTO app_state (key, value) VALUES ('current_date', ?1)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![date.format("%Y-%m-%d").to_string()],
    )?;
    Ok(())
}

/// Drops the simulated date so the system clock is used again
pub fn clear_current_date(conn: &Connection) -> Result<()> {
    conn.execute("DELETE FROM app_state WHERE key = 'current_date'", ())?;
    Ok(())
}

/// Advances the simulated date by one day (for testing spaced repetition)
///
/// Starts from `fallback` when no simulated date is set yet.
pub fn advance_day(conn: &Connection, fallback: NaiveDate) -> Result<NaiveDate> {
    let current = get_current_date(conn)?.unwrap_or(fallback);
    let next_day = current
        .checked_add_days(Days::new(1))
        .ok_or(StoreError::DateOutOfRange(current))?;
    set_current_date(conn, next_day)?;
    Ok(next_day)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Difficulty, initialize, score_review};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    #[test]
    fn test_insert_and_load() {
        let conn = test_conn();
        let state = initialize(1, 10, date(2025, 1, 4));

        assert_eq!(save_review_state(&conn, &state, None).unwrap(), 1);
        let loaded = load_review_state(&conn, 1, 10).unwrap().unwrap();
        assert_eq!(loaded.state, state);
        assert_eq!(loaded.version, 1);

        assert!(load_review_state(&conn, 1, 11).unwrap().is_none());
    }

    #[test]
    fn test_scored_state_survives_storage() {
        let conn = test_conn();
        let state = initialize(1, 10, date(2025, 1, 4));
        save_review_state(&conn, &state, None).unwrap();

        let scored = score_review(&state, Difficulty::Hard, date(2025, 1, 4));
        assert_eq!(save_review_state(&conn, &scored, Some(1)).unwrap(), 2);

        let loaded = load_review_state(&conn, 1, 10).unwrap().unwrap();
        assert_eq!(loaded.state, scored);
        assert_eq!(loaded.version, 2);
    }

    #[test]
    fn test_duplicate_insert_conflicts() {
        let conn = test_conn();
        let state = initialize(1, 10, date(2025, 1, 4));
        save_review_state(&conn, &state, None).unwrap();

        let result = save_review_state(&conn, &state, None);
        assert!(matches!(result, Err(StoreError::Conflict { learner_id: 1, item_id: 10 })));
    }

    #[test]
    fn test_stale_version_conflicts() {
        let conn = test_conn();
        let state = initialize(1, 10, date(2025, 1, 4));
        save_review_state(&conn, &state, None).unwrap();

        let first = score_review(&state, Difficulty::Easy, date(2025, 1, 4));
        save_review_state(&conn, &first, Some(1)).unwrap();

        // A second writer that loaded version 1 must not overwrite the first.
        let second = score_review(&state, Difficulty::Hard, date(2025, 1, 4));
        let result = save_review_state(&conn, &second, Some(1));
        assert!(matches!(result, Err(StoreError::Conflict { .. })));

        let loaded = load_review_state(&conn, 1, 10).unwrap().unwrap();
        assert_eq!(loaded.state, first);
    }

    #[test]
    fn test_out_of_range_ease_is_reported() {
        let conn = test_conn();
        save_review_state(&conn, &initialize(1, 10, date(2025, 1, 4)), None).unwrap();
        conn.execute("UPDATE review_states SET ease_factor = 3.7", ()).unwrap();

        let result = load_review_state(&conn, 1, 10);
        assert!(matches!(result, Err(StoreError::CorruptState { item_id: 10, .. })));
        assert!(load_review_states_for_learner(&conn, 1).is_err());
    }

    #[test]
    fn test_unknown_status_is_reported() {
        let conn = test_conn();
        save_review_state(&conn, &initialize(1, 10, date(2025, 1, 4)), None).unwrap();
        conn.execute("UPDATE review_states SET status = 'SUSPENDED'", ()).unwrap();

        let result = load_review_state(&conn, 1, 10);
        assert!(matches!(result, Err(StoreError::CorruptState { .. })));
    }

    #[test]
    fn test_unparsable_date_is_reported() {
        let conn = test_conn();
        save_review_state(&conn, &initialize(1, 10, date(2025, 1, 4)), None).unwrap();
        conn.execute("UPDATE review_states SET next_review_date = 'not-a-date'", ())
            .unwrap();

        let result = load_review_state(&conn, 1, 10);
        assert!(matches!(
            result,
            Err(StoreError::CorruptState { ref reason, .. }) if reason.contains("next_review_date")
        ));
    }

    #[test]
    fn test_non_integer_counter_is_reported() {
        let conn = test_conn();
        save_review_state(&conn, &initialize(1, 10, date(2025, 1, 4)), None).unwrap();
        conn.execute("UPDATE review_states SET review_count = 'many'", ()).unwrap();

        assert!(matches!(
            load_review_state(&conn, 1, 10),
            Err(StoreError::CorruptState { .. })
        ));
        assert!(matches!(
            load_review_states_for_learner(&conn, 1),
            Err(StoreError::CorruptState { .. })
        ));
    }

    #[test]
    fn test_inconsistent_row_is_reported() {
        let conn = test_conn();
        let today = date(2025, 1, 4);
        let scored = score_review(&initialize(1, 10, today), Difficulty::Easy, today);
        save_review_state(&conn, &scored, None).unwrap();
        conn.execute(
            "UPDATE review_states SET interval_days = 0, review_count = 5,
             consecutive_correct = 2, consecutive_incorrect = 3, status = 'MEMORIZED'",
            (),
        )
        .unwrap();

        assert!(matches!(
            load_review_state(&conn, 1, 10),
            Err(StoreError::CorruptState { item_id: 10, .. })
        ));
    }

    #[test]
    fn test_load_for_learner_only() {
        let conn = test_conn();
        let today = date(2025, 1, 4);
        for (learner, item) in [(1, 3), (2, 1), (1, 1)] {
            save_review_state(&conn, &initialize(learner, item, today), None).unwrap();
        }

        let states = load_review_states_for_learner(&conn, 1).unwrap();
        let items: Vec<i64> = states.iter().map(|s| s.item_id).collect();
        assert_eq!(items, vec![1, 3]);
    }

    #[test]
    fn test_delete() {
        let conn = test_conn();
        save_review_state(&conn, &initialize(1, 10, date(2025, 1, 4)), None).unwrap();
        assert!(delete_review_state(&conn, 1, 10).unwrap());
        assert!(!delete_review_state(&conn, 1, 10).unwrap());
        assert!(load_review_state(&conn, 1, 10).unwrap().is_none());
    }

    #[test]
    fn test_simulated_date() {
        let conn = test_conn();
        assert_eq!(get_current_date(&conn).unwrap(), None);

        assert_eq!(advance_day(&conn, date(2025, 1, 31)).unwrap(), date(2025, 2, 1));
        assert_eq!(advance_day(&conn, date(2030, 1, 1)).unwrap(), date(2025, 2, 2));

        set_current_date(&conn, date(2025, 6, 1)).unwrap();
        assert_eq!(get_current_date(&conn).unwrap(), Some(date(2025, 6, 1)));

        clear_current_date(&conn).unwrap();
        assert_eq!(get_current_date(&conn).unwrap(), None);
    }

    #[test]
    fn test_advance_past_last_date_fails() {
        let conn = test_conn();
        let result = advance_day(&conn, NaiveDate::MAX);
        assert!(matches!(result, Err(StoreError::DateOutOfRange(d)) if d == NaiveDate::MAX));
        assert_eq!(get_current_date(&conn).unwrap(), None);
    }
}
