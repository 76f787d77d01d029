//! Rule coverage: which entries are caught by which active rules.

use copilot_core::JournalEntry;
use indexmap::IndexMap;
use serde::Serialize;

use crate::schema::DeclarativeRule;

use super::RuleEvaluator;

/// Entry id → ids of the active rules matching it, in entry then rule order.
/// Entries with no match are absent.
pub type CoverageMap = IndexMap<String, Vec<String>>;

const TOP_RULES: usize = 5;

/// Hit count for one rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleHits {
    pub rule_id: String,
    pub hits: usize,
}

/// Summary of how much of the journal the active rule set reaches.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageReport {
    pub total_entries: usize,
    pub covered_entries: usize,
    /// Rounded percentage; 0 when there are no entries.
    pub coverage_percent: u8,
    /// Up to five rules with the most hits, most hits first.
    pub top_rules: Vec<RuleHits>,
    pub uncovered: Vec<String>,
}

/// Map each entry to the active rules that would flag it.
///
/// Uses the same predicate as evaluation, so an entry is covered exactly
/// when evaluation would produce at least one flag for it.
pub fn coverage_map(
    evaluator: &RuleEvaluator,
    rules: &[DeclarativeRule],
    entries: &[JournalEntry],
) -> CoverageMap {
    let mut map = CoverageMap::new();
    for entry in entries {
        let hits: Vec<String> = rules
            .iter()
            .filter(|rule| evaluator.matches(rule, entry))
            .map(|rule| rule.id.clone())
            .collect();
        if !hits.is_empty() {
            map.insert(entry.id.clone(), hits);
        }
    }
    map
}

/// Build a [`CoverageReport`] for `rules` over `entries`.
pub fn coverage_report(
    evaluator: &RuleEvaluator,
    rules: &[DeclarativeRule],
    entries: &[JournalEntry],
) -> CoverageReport {
    let map = coverage_map(evaluator, rules, entries);

    let mut counts: IndexMap<&str, usize> = IndexMap::new();
    for rule_id in map.values().flatten() {
        *counts.entry(rule_id.as_str()).or_insert(0) += 1;
    }
    let mut top_rules: Vec<RuleHits> = counts
        .into_iter()
        .map(|(rule_id, hits)| RuleHits {
            rule_id: rule_id.to_string(),
            hits,
        })
        .collect();
    // Stable sort keeps first-seen order among ties.
    top_rules.sort_by(|a, b| b.hits.cmp(&a.hits));
    top_rules.truncate(TOP_RULES);

    let total_entries = entries.len();
    let covered_entries = map.len();
    let coverage_percent = if total_entries == 0 {
        0
    } else {
        ((covered_entries as f64 / total_entries as f64) * 100.0).round() as u8
    };

    CoverageReport {
        total_entries,
        covered_entries,
        coverage_percent,
        top_rules,
        uncovered: entries
            .iter()
            .filter(|e| !map.contains_key(&e.id))
            .map(|e| e.id.clone())
            .collect(),
    }
}
