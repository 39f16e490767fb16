use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TrackerError;

/// Outcome of one processing attempt for one topic.
///
/// The vocabulary is closed: anything other than `success` or `failed` is
/// rejected at the parse boundary by [`validate`] and never represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Success,
    Failed,
}

impl OutcomeStatus {
    /// An explanation that was produced counts as `success`, a missing one as `failed`.
    pub fn from_generation(produced: bool) -> Self {
        if produced {
            OutcomeStatus::Success
        } else {
            OutcomeStatus::Failed
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeStatus::Success => "success",
            OutcomeStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for OutcomeStatus {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        validate(s)
    }
}

/// Validates a raw status value. Matching is exact: no trimming, no case folding.
pub fn validate(value: &str) -> Result<OutcomeStatus, TrackerError> {
    match value {
        "success" => Ok(OutcomeStatus::Success),
        "failed" => Ok(OutcomeStatus::Failed),
        other => Err(TrackerError::InvalidStatus(other.to_string())),
    }
}
