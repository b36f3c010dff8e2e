//! Errors raised by the scheduling models.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReviewError {
    #[error("invalid difficulty '{0}', expected one of: easy, normal, hard")]
    InvalidDifficulty(String),

    #[error("invalid status '{0}', expected one of: NOT_MEMORIZED, LEARNING, MEMORIZED")]
    InvalidStatus(String),

    #[error("ease factor {0} is outside [1.3, 2.5]")]
    EaseFactorOutOfRange(f64),

    #[error("interval of {0} days is outside [1, 365]")]
    IntervalOutOfRange(u32),

    #[error("inconsistent review state: {0}")]
    InconsistentState(String),
}

pub type Result<T> = std::result::Result<T, ReviewError>;
