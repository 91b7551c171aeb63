use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{QcError, Result};
use crate::models::QcFlags;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QualityLabel {
    Good,       // all tests passed
    Suspicious, // step or persistence failed
    Wrong,      // range failed
    Incomplete, // completeness failed
}

impl QualityLabel {
    pub const ALL: [QualityLabel; 4] = [
        QualityLabel::Incomplete,
        QualityLabel::Wrong,
        QualityLabel::Suspicious,
        QualityLabel::Good,
    ];

    /// Completeness dominates range, range dominates step and persistence.
    pub fn classify(flags: QcFlags) -> Self {
        if !flags.is_complete() {
            QualityLabel::Incomplete
        } else if !flags.is_range_ok() {
            QualityLabel::Wrong
        } else if !(flags.has_no_steps() && flags.has_no_persistence()) {
            QualityLabel::Suspicious
        } else {
            QualityLabel::Good
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QualityLabel::Incomplete => "INCOMPLETE",
            QualityLabel::Wrong => "WRONG",
            QualityLabel::Suspicious => "SUSPICIOUS",
            QualityLabel::Good => "GOOD",
        }
    }

    pub fn severity(&self) -> u8 {
        match self {
            QualityLabel::Incomplete => 3,
            QualityLabel::Wrong => 2,
            QualityLabel::Suspicious => 1,
            QualityLabel::Good => 0,
        }
    }
}

impl FromStr for QualityLabel {
    type Err = QcError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "INCOMPLETE" => Ok(QualityLabel::Incomplete),
            "WRONG" => Ok(QualityLabel::Wrong),
            "SUSPICIOUS" => Ok(QualityLabel::Suspicious),
            "GOOD" => Ok(QualityLabel::Good),
            _ => Err(QcError::UnknownLabel(s.to_string())),
        }
    }
}

impl fmt::Display for QualityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
