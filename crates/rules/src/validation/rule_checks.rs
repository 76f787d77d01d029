//! Per-rule checks: identity, field, condition, status scope, and id uniqueness.

use std::collections::HashSet;

use copilot_core::{FieldRegistry, FieldValue};

use crate::condition::parse_float;
use crate::schema::{ConditionOp, DeclarativeRule};

use super::fuzzy::{fuzzy_match, is_kebab_case};
use super::ValidationResult;

pub(super) fn validate_identity(rule: &DeclarativeRule, result: &mut ValidationResult) {
    if rule.id.trim().is_empty() {
        result.error("id", "id must not be empty");
    } else if !is_kebab_case(&rule.id) {
        result.warn(
            "id",
            format!("id '{}' is not kebab-case; flag ids will contain it verbatim", rule.id),
        );
    }

    if rule.message.trim().is_empty() {
        result.error("message", "message must not be empty");
    }
}

pub(super) fn validate_field(
    rule: &DeclarativeRule,
    registry: &FieldRegistry,
    result: &mut ValidationResult,
) {
    if registry.is_known(&rule.field) {
        return;
    }
    let names = registry.names();
    result.error_with_suggestion(
        "field",
        format!("unknown field '{}'; the rule will never match", rule.field),
        fuzzy_match(&rule.field, &names).map(str::to_string),
    );
}

pub(super) fn validate_condition(rule: &DeclarativeRule, result: &mut ValidationResult) {
    match &rule.condition {
        ConditionOp::Unsupported(name) => {
            result.error_with_suggestion(
                "condition",
                format!("unsupported condition '{name}'; the rule will never match"),
                fuzzy_match(name, &ConditionOp::SUPPORTED).map(str::to_string),
            );
        }
        op if op.is_numeric() => {
            if parse_float(&FieldValue::from(&rule.value)).is_nan() {
                result.warn(
                    "value",
                    format!("'{op}' compares numbers but value {} is not numeric", rule.value),
                );
            }
        }
        ConditionOp::Includes if !rule.value.is_string() => {
            result.warn(
                "value",
                format!("'includes' compares text; value {} will be matched as text", rule.value),
            );
        }
        _ => {}
    }
}

pub(super) fn validate_scope(rule: &DeclarativeRule, result: &mut ValidationResult) {
    if matches!(&rule.applies_to_status, Some(statuses) if statuses.is_empty()) {
        result.warn(
            "appliesToStatus",
            "appliesToStatus is empty; the rule applies to no entries",
        );
    }
}

pub(super) fn validate_unique_ids(rules: &[DeclarativeRule], result: &mut ValidationResult) {
    let mut seen = HashSet::new();
    for (i, rule) in rules.iter().enumerate() {
        if !rule.id.is_empty() && !seen.insert(rule.id.as_str()) {
            result.error(
                format!("rules[{i}].id"),
                format!("duplicate rule id '{}'", rule.id),
            );
        }
    }
}
