//! Records extracted from a catalogue page and the resources they reference.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One list entry as found in the markup.
///
/// At least one of the two references is always present; the extractor drops
/// entries that carry neither.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    pub title: String,
    pub problem_ref: Option<String>,
    pub solution_ref: Option<String>,
}

impl RawRecord {
    pub fn new(
        title: impl Into<String>,
        problem_ref: Option<String>,
        solution_ref: Option<String>,
    ) -> Self {
        Self {
            title: title.into(),
            problem_ref,
            solution_ref,
        }
    }

    /// Reference for the given half of the record.
    pub fn reference(&self, kind: ResourceKind) -> Option<&str> {
        match kind {
            ResourceKind::Problem => self.problem_ref.as_deref(),
            ResourceKind::Solution => self.solution_ref.as_deref(),
        }
    }
}

/// Which half of a record a resource is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Problem,
    Solution,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 2] = [ResourceKind::Problem, ResourceKind::Solution];
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Problem => f.write_str("problem"),
            ResourceKind::Solution => f.write_str("solution"),
        }
    }
}

/// A single downloadable artifact with its resolved location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub kind: ResourceKind,
    pub source_ref: String,
    pub resolved_url: Option<String>,
    pub local_path: PathBuf,
}
