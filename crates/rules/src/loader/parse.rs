//! Rule text parsing. A document holds either one rule object or a list.

use std::path::Path;

use crate::schema::DeclarativeRule;

use super::error::{Result, RuleError};

/// Supported rule file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleFormat {
    Json,
    Yaml,
}

impl RuleFormat {
    /// Format implied by a file extension, if it is a rule file at all.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str())? {
            "json" => Some(RuleFormat::Json),
            "yml" | "yaml" => Some(RuleFormat::Yaml),
            _ => None,
        }
    }

    pub fn parse(self, text: &str, origin: &str) -> Result<Vec<DeclarativeRule>> {
        match self {
            RuleFormat::Json => parse_rules_json(text, origin),
            RuleFormat::Yaml => parse_rules_yaml(text, origin),
        }
    }
}

fn invalid(origin: &str, message: impl ToString) -> RuleError {
    RuleError::InvalidRuleDefinition {
        origin: origin.to_string(),
        message: message.to_string(),
    }
}

/// Parse JSON rule text. `origin` labels errors.
pub fn parse_rules_json(text: &str, origin: &str) -> Result<Vec<DeclarativeRule>> {
    let doc: serde_json::Value = serde_json::from_str(text).map_err(|e| invalid(origin, e))?;
    match doc {
        serde_json::Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, item)| {
                serde_json::from_value(item).map_err(|e| invalid(origin, format!("rule #{i}: {e}")))
            })
            .collect(),
        single => Ok(vec![serde_json::from_value(single).map_err(|e| invalid(origin, e))?]),
    }
}

/// Parse YAML rule text. `origin` labels errors.
pub fn parse_rules_yaml(text: &str, origin: &str) -> Result<Vec<DeclarativeRule>> {
    let doc: serde_yaml::Value = serde_yaml::from_str(text).map_err(|e| invalid(origin, e))?;
    match doc {
        serde_yaml::Value::Sequence(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, item)| {
                serde_yaml::from_value(item).map_err(|e| invalid(origin, format!("rule #{i}: {e}")))
            })
            .collect(),
        single => Ok(vec![serde_yaml::from_value(single).map_err(|e| invalid(origin, e))?]),
    }
}
