use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::FlagError;

/// How a fresh evaluation replaces the stored flags.
///
/// Both policies drop stored flags that the fresh run no longer raises.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MergePolicy {
    /// Store becomes exactly the fresh set; prior reviews are lost.
    Overwrite,
    /// Fresh flags whose id was already reviewed keep that review and
    /// their original `createdAt`.
    #[default]
    PreserveReview,
}

impl MergePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            MergePolicy::Overwrite => "overwrite",
            MergePolicy::PreserveReview => "preserve-review",
        }
    }
}

impl fmt::Display for MergePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MergePolicy {
    type Err = FlagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "overwrite" => Ok(MergePolicy::Overwrite),
            "preserve-review" | "preserve_review" | "preserve" => Ok(MergePolicy::PreserveReview),
            _ => Err(FlagError::UnknownMergePolicy(s.to_string())),
        }
    }
}

/// What a merge changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeSummary {
    /// Flags in the store after the merge.
    pub total: usize,
    /// Fresh ids that were not stored before.
    pub added: usize,
    /// Fresh flags that inherited a prior review.
    pub preserved: usize,
    /// Stored ids the fresh run did not raise.
    pub dropped: usize,
}
