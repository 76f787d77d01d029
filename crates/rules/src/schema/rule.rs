//! Declarative rule definitions as authored in JSON or YAML.

use chrono::{DateTime, Utc};
use copilot_core::EntryStatus;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ConditionOp;

/// Whether a rule takes part in evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleStatus {
    Active,
    Inactive,
}

impl RuleStatus {
    pub fn toggled(self) -> Self {
        match self {
            RuleStatus::Active => RuleStatus::Inactive,
            RuleStatus::Inactive => RuleStatus::Active,
        }
    }
}

/// Owning team of a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleDomain {
    Audit,
    Ops,
    Risk,
    Fraud,
}

impl fmt::Display for RuleDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleDomain::Audit => write!(f, "audit"),
            RuleDomain::Ops => write!(f, "ops"),
            RuleDomain::Risk => write!(f, "risk"),
            RuleDomain::Fraud => write!(f, "fraud"),
        }
    }
}

/// A `(field, condition, value)` predicate with a message and a status gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeclarativeRule {
    pub id: String,
    /// JSON name of the entry attribute under test.
    pub field: String,
    pub condition: ConditionOp,
    /// Comparand. Its meaningful type depends on `field`.
    #[serde(default)]
    pub value: serde_json::Value,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<RuleDomain>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    /// Free-form timestamp as written by the author.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    pub status: RuleStatus,
    /// Restrict evaluation to entries in these statuses. Absent means all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applies_to_status: Option<Vec<EntryStatus>>,
    #[serde(default = "initial_version", skip_serializing_if = "is_initial_version")]
    pub version: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<RuleHistory>,
}

fn initial_version() -> u32 {
    1
}

fn is_initial_version(v: &u32) -> bool {
    *v == 1
}

impl DeclarativeRule {
    /// Active rule with no optional metadata.
    pub fn new(
        id: impl Into<String>,
        field: impl Into<String>,
        condition: ConditionOp,
        value: serde_json::Value,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            field: field.into(),
            condition,
            value,
            message: message.into(),
            domain: None,
            tags: None,
            owner: None,
            created_at: None,
            status: RuleStatus::Active,
            applies_to_status: None,
            version: initial_version(),
            history: Vec::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == RuleStatus::Active
    }

    /// True if an entry in `status` passes the `appliesToStatus` gate.
    pub fn applies_to(&self, status: EntryStatus) -> bool {
        self.applies_to_status
            .as_ref()
            .map_or(true, |allowed| allowed.contains(&status))
    }

    /// Copy of this rule without its history, for use as a history snapshot.
    pub fn snapshot(&self) -> DeclarativeRule {
        DeclarativeRule {
            history: Vec::new(),
            ..self.clone()
        }
    }
}

/// One prior version of a rule, recorded by the rule store on every change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleHistory {
    pub version: u32,
    pub timestamp: DateTime<Utc>,
    pub actor: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub snapshot: Box<DeclarativeRule>,
}
