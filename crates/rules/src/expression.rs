//! Compact `field operator value` condition expressions.
//!
//! Used when promoting a suggestion or a one-line condition typed by a user
//! into a [`DeclarativeRule`]. The format is three whitespace-separated
//! tokens, e.g. `amount greater_than 1000`.

use serde::{Deserialize, Serialize};

use crate::schema::{ConditionOp, DeclarativeRule};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionExpr {
    pub field: String,
    pub condition: ConditionOp,
    /// Comparand exactly as typed.
    pub value: String,
}

impl ConditionExpr {
    /// Split `text` into field, operator and value.
    ///
    /// Missing tokens become empty strings, an unrecognised operator falls
    /// back to `equals`, and anything past the third token is ignored.
    pub fn parse(text: &str) -> Self {
        let mut tokens = text.split_whitespace();
        let field = tokens.next().unwrap_or_default().to_string();
        let condition = tokens
            .next()
            .and_then(|op| op.parse::<ConditionOp>().ok())
            .unwrap_or(ConditionOp::Equals);
        let value = tokens.next().unwrap_or_default().to_string();

        Self {
            field,
            condition,
            value,
        }
    }

    /// Build an active rule from this expression. The value stays a string,
    /// which numeric operators parse on comparison.
    pub fn into_rule(self, id: impl Into<String>, message: impl Into<String>) -> DeclarativeRule {
        DeclarativeRule::new(
            id,
            self.field,
            self.condition,
            serde_json::Value::String(self.value),
            message,
        )
    }
}
