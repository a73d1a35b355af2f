//! Normalized classification of a record title.

use serde::{Deserialize, Serialize};

/// Year value used when a title carries no year.
pub const UNKNOWN_YEAR: &str = "기타";

/// Month value used when a title carries no month.
pub const UNKNOWN_MONTH: &str = "00";

/// Classification derived from a title plus the selected category and grade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Taxonomy {
    /// Four digits or [`UNKNOWN_YEAR`]
    pub year: String,

    /// Two digits or [`UNKNOWN_MONTH`]
    pub month: String,

    pub subject_base: String,

    /// Level 1 to 4 when the subject has one (물리학Ⅱ, 수학I)
    pub subject_level: Option<u8>,

    pub category: String,
    pub grade: String,
}

impl Taxonomy {
    /// Subject as used in paths: base name followed by the level, if any.
    pub fn subject(&self) -> String {
        match self.subject_level {
            Some(level) => format!("{}{}", self.subject_base, level),
            None => self.subject_base.clone(),
        }
    }

    pub fn has_year(&self) -> bool {
        self.year != UNKNOWN_YEAR
    }

    pub fn has_month(&self) -> bool {
        self.month != UNKNOWN_MONTH
    }
}
