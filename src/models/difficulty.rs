//! Self-reported recall effort for one review event.
use super::error::ReviewError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Normal,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Normal, Difficulty::Hard];

    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Normal => "normal",
            Difficulty::Hard => "hard",
        }
    }

    /// Interval multiplier applied once the item has been scheduled at least once.
    pub fn multiplier(self) -> f64 {
        match self {
            Difficulty::Easy => 1.3,
            Difficulty::Normal => 1.0,
            Difficulty::Hard => 0.7,
        }
    }

    pub fn is_correct(self) -> bool {
        !matches!(self, Difficulty::Hard)
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses the exact lowercase tokens. Anything else is rejected, never defaulted.
impl FromStr for Difficulty {
    type Err = ReviewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "easy" => Ok(Difficulty::Easy),
            "normal" => Ok(Difficulty::Normal),
            "hard" => Ok(Difficulty::Hard),
            other => Err(ReviewError::InvalidDifficulty(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_tokens() {
        assert_eq!("easy".parse::<Difficulty>(), Ok(Difficulty::Easy));
        assert_eq!("normal".parse::<Difficulty>(), Ok(Difficulty::Normal));
        assert_eq!("hard".parse::<Difficulty>(), Ok(Difficulty::Hard));
    }

    #[test]
    fn test_unknown_token_is_rejected() {
        for bad in ["", "Easy", "medium", "again", " normal"] {
            assert_eq!(
                bad.parse::<Difficulty>(),
                Err(ReviewError::InvalidDifficulty(bad.to_string()))
            );
        }
    }

    #[test]
    fn test_serde_tokens() {
        assert_eq!(serde_json::to_string(&Difficulty::Hard).unwrap(), "\"hard\"");
        let parsed: Difficulty = serde_json::from_str("\"normal\"").unwrap();
        assert_eq!(parsed, Difficulty::Normal);
        assert!(serde_json::from_str::<Difficulty>("\"okay\"").is_err());
    }
}
