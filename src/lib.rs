pub mod database;
pub mod export;
pub mod models;
pub mod service;

pub use models::{Difficulty, MemorizationStatus, ReviewState, initialize, score_review, select_due};
pub use service::ReviewService;
