//! JSON import/export of review states.
//! Dates are written as ISO calendar dates and statuses as their fixed tokens.
//! Importing validates every bounded field, so malformed files are rejected whole.

use crate::models::ReviewState;
use log::info;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Exports review states to a pretty-printed JSON array at `path`.
pub fn export_json_to_path(states: &[ReviewState], path: impl AsRef<Path>) -> Result<(), ExportError> {
    let path = path.as_ref();
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, states)?;
    writer.flush()?;
    info!("exported {} review states to '{}'", states.len(), path.display());
    Ok(())
}

/// Imports review states from a JSON array file.
pub fn import_json(path: impl AsRef<Path>) -> Result<Vec<ReviewState>, ExportError> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);
    let states: Vec<ReviewState> = serde_json::from_reader(reader)?;
    info!("read {} review states from '{}'", states.len(), path.display());
    Ok(states)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Difficulty, initialize, score_review};
    use chrono::NaiveDate;
    use std::fs;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_export_and_import() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("states.json");

        let fresh = initialize(1, 1, date(2025, 1, 4));
        let reviewed = score_review(&initialize(1, 2, date(2025, 1, 4)), Difficulty::Easy, date(2025, 1, 4));
        let states = vec![fresh, reviewed];

        export_json_to_path(&states, &path).unwrap();
        let imported = import_json(&path).unwrap();
        assert_eq!(imported, states);
    }

    #[test]
    fn test_import_literal_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("import.json");
        let json_content = r#"[
  {
    "learner_id": 3,
    "item_id": 14,
    "status": "MEMORIZED",
    "next_review_date": "2025-01-17",
    "interval_days": 9,
    "ease_factor": 2.5,
    "review_count": 3,
    "last_review_date": "2025-01-08",
    "consecutive_correct": 3,
    "consecutive_incorrect": 0
  }
]"#;
        fs::write(&path, json_content).unwrap();

        let states = import_json(&path).unwrap();
        assert_eq!(states.len(), 1);
        assert_eq!(states[0].item_id, 14);
        assert_eq!(states[0].interval_days.days(), 9);
        assert_eq!(states[0].next_review_date, Some(date(2025, 1, 17)));
    }

    #[test]
    fn test_import_nonexistent_file() {
        let result = import_json("nonexistent_file_xyz123.json");
        assert!(matches!(result, Err(ExportError::Io(_))));
    }

    #[test]
    fn test_import_rejects_out_of_range_interval() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        let json_content = r#"[{
    "learner_id": 1, "item_id": 1, "status": "LEARNING",
    "next_review_date": null, "interval_days": 400, "ease_factor": 2.0,
    "review_count": 1, "last_review_date": null,
    "consecutive_correct": 1, "consecutive_incorrect": 0
}]"#;
        fs::write(&path, json_content).unwrap();

        assert!(matches!(import_json(&path), Err(ExportError::Json(_))));
    }

    #[test]
    fn test_import_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("invalid.json");
        fs::write(&path, "{ this is not valid json }").unwrap();

        assert!(import_json(&path).is_err());
    }
}
