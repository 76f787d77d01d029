//! Comparison operators for declarative rule conditions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Operator applied between an entry field and a rule comparand.
///
/// Anything other than the five supported names deserializes into
/// [`ConditionOp::Unsupported`], which never matches. Hand-authored rules
/// with a typo therefore load, and simply stay silent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ConditionOp {
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
    Includes,
    Unsupported(String),
}

impl ConditionOp {
    /// Wire names of every supported operator.
    pub const SUPPORTED: [&'static str; 5] =
        ["equals", "not_equals", "greater_than", "less_than", "includes"];

    pub fn as_str(&self) -> &str {
        match self {
            ConditionOp::Equals => "equals",
            ConditionOp::NotEquals => "not_equals",
            ConditionOp::GreaterThan => "greater_than",
            ConditionOp::LessThan => "less_than",
            ConditionOp::Includes => "includes",
            ConditionOp::Unsupported(raw) => raw,
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, ConditionOp::Unsupported(_))
    }

    /// True for operators that compare parsed numbers.
    pub fn is_numeric(&self) -> bool {
        matches!(self, ConditionOp::GreaterThan | ConditionOp::LessThan)
    }
}

impl fmt::Display for ConditionOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for ConditionOp {
    fn from(s: &str) -> Self {
        match s {
            "equals" => ConditionOp::Equals,
            "not_equals" => ConditionOp::NotEquals,
            "greater_than" => ConditionOp::GreaterThan,
            "less_than" => ConditionOp::LessThan,
            "includes" => ConditionOp::Includes,
            other => ConditionOp::Unsupported(other.to_string()),
        }
    }
}

impl From<String> for ConditionOp {
    fn from(s: String) -> Self {
        ConditionOp::from(s.as_str())
    }
}

impl From<ConditionOp> for String {
    fn from(op: ConditionOp) -> Self {
        op.as_str().to_string()
    }
}

impl FromStr for ConditionOp {
    type Err = String;

    /// Strict parse: unlike `From<&str>`, unknown names are an error.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match ConditionOp::from(s) {
            ConditionOp::Unsupported(other) => Err(format!("unsupported condition: '{}'", other)),
            op => Ok(op),
        }
    }
}
