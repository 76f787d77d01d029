//! Declarative rule evaluation over journal entries.
//!
//! Every active rule is tested against every entry, rule-major and
//! entry-minor, and each matching pair yields one open [`CopilotFlag`].
//! A rule that names an unknown field or an unsupported operator never
//! matches; evaluation itself cannot fail.

mod coverage;

use std::time::Instant;

use chrono::{DateTime, Utc};
use copilot_core::{FieldRegistry, FieldValue, JournalEntry};
use tracing::debug;

use crate::audit_log::{AuditLog, ExecutionPhase, LogLevel};
use crate::builtin::evaluate_builtin_rules;
use crate::condition::apply;
use crate::schema::{flag_id, CopilotFlag, DeclarativeRule, DECLARATIVE_NAMESPACE};

pub use coverage::{coverage_map, coverage_report, CoverageMap, CoverageReport, RuleHits};

// ── Rule evaluator ──────────────────────────────────────────────────

/// Evaluates declarative rules against entries through a field registry.
#[derive(Debug, Clone, Default)]
pub struct RuleEvaluator {
    registry: FieldRegistry,
}

impl RuleEvaluator {
    /// Evaluator over the standard journal-entry fields.
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluator with a caller-supplied field registry.
    pub fn with_registry(registry: FieldRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &FieldRegistry {
        &self.registry
    }

    /// Evaluate all rules against all entries, stamping flags with the current time.
    pub fn evaluate(&self, rules: &[DeclarativeRule], entries: &[JournalEntry]) -> Vec<CopilotFlag> {
        self.evaluate_at(rules, entries, Utc::now())
    }

    /// Evaluate with an explicit creation timestamp.
    pub fn evaluate_at(
        &self,
        rules: &[DeclarativeRule],
        entries: &[JournalEntry],
        now: DateTime<Utc>,
    ) -> Vec<CopilotFlag> {
        rules
            .iter()
            .filter(|rule| rule.is_active())
            .flat_map(|rule| {
                self.matching_entries(rule, entries)
                    .map(move |entry| flag_for(rule, entry, now))
            })
            .collect()
    }

    /// Declarative flags followed by built-in rule flags, all stamped `now`.
    pub fn evaluate_all(
        &self,
        rules: &[DeclarativeRule],
        entries: &[JournalEntry],
        now: DateTime<Utc>,
    ) -> Vec<CopilotFlag> {
        let mut flags = self.evaluate_at(rules, entries, now);
        flags.extend(evaluate_builtin_rules(entries, now));
        flags
    }

    /// Like [`evaluate_at`](Self::evaluate_at), also recording per-rule
    /// progress in `log`.
    pub fn evaluate_logged(
        &self,
        rules: &[DeclarativeRule],
        entries: &[JournalEntry],
        now: DateTime<Utc>,
        log: &AuditLog,
    ) -> Vec<CopilotFlag> {
        let mut flags = Vec::new();

        for rule in rules {
            if !rule.is_active() {
                log.record(&rule.id, LogLevel::Debug, ExecutionPhase::Evaluation, "rule inactive, skipped");
                continue;
            }
            if !rule.condition.is_supported() {
                log.record(
                    &rule.id,
                    LogLevel::Warning,
                    ExecutionPhase::Evaluation,
                    format!("unsupported condition '{}', rule never matches", rule.condition),
                );
            }

            let started = Instant::now();
            let gated = entries.iter().filter(|e| !rule.applies_to(e.status)).count();
            if gated > 0 {
                log.record_detailed(
                    &rule.id,
                    LogLevel::Debug,
                    ExecutionPhase::StatusGate,
                    format!("{gated} entries outside appliesToStatus"),
                    Some(serde_json::json!({ "gated": gated })),
                    None,
                );
            }

            let before = flags.len();
            for entry in self.matching_entries(rule, entries) {
                log.record(
                    &rule.id,
                    LogLevel::Info,
                    ExecutionPhase::Match,
                    format!("entry '{}' matched", entry.id),
                );
                flags.push(flag_for(rule, entry, now));
            }
            let matched = flags.len() - before;

            log.record_detailed(
                &rule.id,
                LogLevel::Info,
                ExecutionPhase::Complete,
                format!("{matched} of {} entries flagged", entries.len()),
                Some(serde_json::json!({ "matched": matched, "entries": entries.len() })),
                Some(started.elapsed().as_millis() as u64),
            );
            debug!(rule_id = %rule.id, matched, "evaluated rule");
        }

        flags
    }

    /// True if `rule` is active, passes the status gate for `entry` and its
    /// condition holds.
    pub fn matches(&self, rule: &DeclarativeRule, entry: &JournalEntry) -> bool {
        rule.is_active() && rule.applies_to(entry.status) && self.condition_holds(rule, entry)
    }

    fn condition_holds(&self, rule: &DeclarativeRule, entry: &JournalEntry) -> bool {
        let actual = self.registry.get(entry, &rule.field);
        let expected = FieldValue::from(&rule.value);
        apply(&actual, &rule.condition, &expected)
    }

    /// Entries that pass the status gate and satisfy the rule's condition.
    /// Does not check the rule's own status.
    fn matching_entries<'a>(
        &'a self,
        rule: &'a DeclarativeRule,
        entries: &'a [JournalEntry],
    ) -> impl Iterator<Item = &'a JournalEntry> + 'a {
        entries
            .iter()
            .filter(move |e| rule.applies_to(e.status) && self.condition_holds(rule, e))
    }
}

fn flag_for(rule: &DeclarativeRule, entry: &JournalEntry, now: DateTime<Utc>) -> CopilotFlag {
    CopilotFlag::open(
        flag_id(DECLARATIVE_NAMESPACE, &rule.id, &entry.id),
        entry.id.clone(),
        rule.message.clone(),
        now,
    )
}

// ── Tests ───────────────────────────────────────────────────────────
