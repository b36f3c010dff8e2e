pub mod db;

pub use db::{StoreError, StoredReviewState};
