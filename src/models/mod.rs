pub mod difficulty;
pub mod due;
pub mod error;
pub mod review_state;
pub mod scheduler;

pub use difficulty::Difficulty;
pub use due::{ReviewStats, select_due};
pub use error::ReviewError;
pub use review_state::{EaseFactor, IntervalDays, MemorizationStatus, ReviewState};
pub use scheduler::{initialize, preview_intervals, score_review};
