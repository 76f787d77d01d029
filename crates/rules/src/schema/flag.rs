//! Copilot flags: advisory annotations produced by rule matches.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Namespace for flags raised by declarative (JSON/YAML) rules.
pub const DECLARATIVE_NAMESPACE: &str = "json";
/// Namespace for flags raised by built-in code rules.
pub const BUILTIN_NAMESPACE: &str = "rule";

/// Build a flag id: `<namespace>::<ruleId>::<entryId>`.
///
/// The same rule/entry pair always yields the same id, which is what makes
/// repeated evaluations deduplicate.
pub fn flag_id(namespace: &str, rule_id: &str, entry_id: &str) -> String {
    format!("{}::{}::{}", namespace, rule_id, entry_id)
}

/// Review state of a flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlagStatus {
    Open,
    Dismissed,
    Resolved,
}

impl FlagStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlagStatus::Open => "open",
            FlagStatus::Dismissed => "dismissed",
            FlagStatus::Resolved => "resolved",
        }
    }

    /// Dismissed and resolved flags carry reviewer metadata.
    pub fn is_reviewed(&self) -> bool {
        !matches!(self, FlagStatus::Open)
    }
}

impl fmt::Display for FlagStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FlagStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "open" => Ok(FlagStatus::Open),
            "dismissed" => Ok(FlagStatus::Dismissed),
            "resolved" => Ok(FlagStatus::Resolved),
            other => Err(format!("unknown flag status: '{}'", other)),
        }
    }
}

/// An advisory annotation on one journal entry.
///
/// `entry_id` refers to the entry; the flag does not own it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CopilotFlag {
    pub id: String,
    pub entry_id: String,
    pub message: String,
    pub status: FlagStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<DateTime<Utc>>,
}

impl CopilotFlag {
    /// A fresh, unreviewed flag.
    pub fn open(
        id: impl Into<String>,
        entry_id: impl Into<String>,
        message: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            entry_id: entry_id.into(),
            message: message.into(),
            status: FlagStatus::Open,
            created_at,
            reviewed_by: None,
            reviewed_at: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == FlagStatus::Open
    }
}
