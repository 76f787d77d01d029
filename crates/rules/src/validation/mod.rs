//! Rule validation with structured errors and suggestions.
//!
//! Errors describe rules that can never match as written; warnings are
//! advisory. Loading never rejects a rule because of either: evaluation
//! is fail-closed, so a bad rule simply produces no flags.

mod rule_checks;

pub mod fuzzy;

use copilot_core::FieldRegistry;
use serde::{Deserialize, Serialize};

use crate::loader::{parse_rules_json, parse_rules_yaml};
use crate::schema::DeclarativeRule;

// ── Result types ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationError {
    /// Location such as `"field"` or `"rules[2].condition"`.
    pub path: String,
    pub message: String,
    /// Optional "Did you mean …?" suggestion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationResult {
    pub(crate) fn new() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub(crate) fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.push_error(path.into(), message.into(), None);
    }

    pub(crate) fn error_with_suggestion(
        &mut self,
        path: impl Into<String>,
        message: impl Into<String>,
        suggestion: Option<String>,
    ) {
        self.push_error(path.into(), message.into(), suggestion);
    }

    pub(crate) fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ValidationWarning {
            path: path.into(),
            message: message.into(),
        });
    }

    fn push_error(&mut self, path: String, message: String, suggestion: Option<String>) {
        self.valid = false;
        self.errors.push(ValidationError {
            path,
            message,
            suggestion,
        });
    }

    /// Fold another result in, prefixing its paths with `prefix`.
    fn absorb(&mut self, prefix: &str, other: ValidationResult) {
        for e in other.errors {
            self.push_error(join_path(prefix, &e.path), e.message, e.suggestion);
        }
        for w in other.warnings {
            self.warn(join_path(prefix, &w.path), w.message);
        }
    }

    /// One line per problem, for log output.
    pub fn messages(&self) -> Vec<String> {
        let errors = self.errors.iter().map(|e| match &e.suggestion {
            Some(s) => format!("{}: {} (did you mean '{}'?)", e.path, e.message, s),
            None => format!("{}: {}", e.path, e.message),
        });
        let warnings = self
            .warnings
            .iter()
            .map(|w| format!("{}: {} (warning)", w.path, w.message));
        errors.chain(warnings).collect()
    }
}

fn join_path(prefix: &str, path: &str) -> String {
    if path.is_empty() {
        prefix.to_string()
    } else {
        format!("{prefix}.{path}")
    }
}

// ── Public API ──────────────────────────────────────────────────────

/// Validate one rule against the fields `registry` can resolve.
pub fn validate_rule(rule: &DeclarativeRule, registry: &FieldRegistry) -> ValidationResult {
    let mut result = ValidationResult::new();
    rule_checks::validate_identity(rule, &mut result);
    rule_checks::validate_field(rule, registry, &mut result);
    rule_checks::validate_condition(rule, &mut result);
    rule_checks::validate_scope(rule, &mut result);
    result
}

/// Validate a set of rules, including cross-rule checks such as
/// duplicate ids. Paths are prefixed with `rules[i]`.
pub fn validate_rule_set(rules: &[DeclarativeRule], registry: &FieldRegistry) -> ValidationResult {
    let mut result = ValidationResult::new();
    for (i, rule) in rules.iter().enumerate() {
        result.absorb(&format!("rules[{i}]"), validate_rule(rule, registry));
    }
    rule_checks::validate_unique_ids(rules, &mut result);
    result
}

/// Parse pasted JSON and validate. Parse failures become a single error.
pub fn validate_json(text: &str, registry: &FieldRegistry) -> ValidationResult {
    match parse_rules_json(text, "inline") {
        Ok(rules) => validate_rule_set(&rules, registry),
        Err(e) => parse_failure(e),
    }
}

/// Parse pasted YAML and validate. Parse failures become a single error.
pub fn validate_yaml(text: &str, registry: &FieldRegistry) -> ValidationResult {
    match parse_rules_yaml(text, "inline") {
        Ok(rules) => validate_rule_set(&rules, registry),
        Err(e) => parse_failure(e),
    }
}

fn parse_failure(e: crate::loader::RuleError) -> ValidationResult {
    let mut result = ValidationResult::new();
    result.error("", e.to_string());
    result
}
