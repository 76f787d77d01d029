//! Rule suggestions derived from patterns in the journal.
//!
//! Suggestions are advisory: they describe a condition in prose-like
//! notation (`amount > 10000 && !memo`) for a human to turn into a rule.

use copilot_core::{EntryStatus, JournalEntry};
use serde::{Deserialize, Serialize};

use crate::evaluator::CoverageMap;

/// Amount above which an entry counts as high value.
pub const HIGH_VALUE_THRESHOLD: f64 = 10_000.0;

const EMERGENT_MIN_ENTRIES: usize = 3;
const UNCOVERED_LARGE_MIN_ENTRIES: usize = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestedRule {
    pub id: String,
    pub condition: String,
    pub rationale: String,
    pub entry_ids: Vec<String>,
    pub recommended_message: String,
}

fn is_high_value(entry: &JournalEntry) -> bool {
    entry.amount > HIGH_VALUE_THRESHOLD
}

fn ids(entries: &[&JournalEntry]) -> Vec<String> {
    entries.iter().map(|e| e.id.clone()).collect()
}

/// Look for recurring risky shapes across the whole journal.
pub fn detect_emergent_patterns(entries: &[JournalEntry]) -> Vec<SuggestedRule> {
    let high_unmemoed: Vec<&JournalEntry> = entries
        .iter()
        .filter(|e| is_high_value(e) && !e.has_memo())
        .collect();

    if high_unmemoed.len() < EMERGENT_MIN_ENTRIES {
        return Vec::new();
    }

    vec![SuggestedRule {
        id: "amount-without-memo".to_string(),
        condition: "amount > 10000 && !memo".to_string(),
        rationale: "Multiple high-value entries lack memos".to_string(),
        entry_ids: ids(&high_unmemoed),
        recommended_message: "High debit without memo, flag for clarification".to_string(),
    }]
}

/// Suggest rules for entries no active rule currently reaches.
pub fn suggest_rules_from_uncovered(
    entries: &[JournalEntry],
    coverage: &CoverageMap,
) -> Vec<SuggestedRule> {
    let uncovered: Vec<&JournalEntry> = entries
        .iter()
        .filter(|e| !coverage.contains_key(&e.id))
        .collect();

    let mut suggestions = Vec::new();

    let large: Vec<&JournalEntry> = uncovered.iter().copied().filter(|e| is_high_value(e)).collect();
    if large.len() >= UNCOVERED_LARGE_MIN_ENTRIES {
        suggestions.push(SuggestedRule {
            id: "uncovered-large-amount".to_string(),
            condition: "amount > 10000".to_string(),
            rationale: "Multiple uncovered drafts with large amounts".to_string(),
            entry_ids: ids(&large),
            recommended_message: "Flag high-value entries in draft/pending".to_string(),
        });
    }

    let voided: Vec<&JournalEntry> = uncovered
        .iter()
        .copied()
        .filter(|e| e.status == EntryStatus::Voided && !e.has_memo())
        .collect();
    if !voided.is_empty() {
        suggestions.push(SuggestedRule {
            id: "uncovered-voided-no-memo".to_string(),
            condition: "status == voided && !memo".to_string(),
            rationale: "Voided entries without memos are not being evaluated".to_string(),
            entry_ids: ids(&voided),
            recommended_message: "Voids without memo should be reviewed".to_string(),
        });
    }

    suggestions
}

/// Suggest a rule for a single entry that matched nothing on save.
///
/// Returns `None` when no heuristic applies to the entry.
pub fn suggest_rule_for_entry(entry: &JournalEntry) -> Option<SuggestedRule> {
    let (condition, rationale, message) = if is_high_value(entry) {
        (
            "amount > 10000",
            "High-value entry not covered by any rule",
            "Consider flagging large draft entries",
        )
    } else if entry.status == EntryStatus::Voided && !entry.has_memo() {
        (
            "status == voided && !memo",
            "Voided entry lacks memo and is unevaluated",
            "Require memo for voids",
        )
    } else {
        return None;
    };

    Some(SuggestedRule {
        id: format!("auto::{}", entry.id),
        condition: condition.to_string(),
        rationale: rationale.to_string(),
        entry_ids: vec![entry.id.clone()],
        recommended_message: message.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, amount: f64, status: EntryStatus, memo: Option<&str>) -> JournalEntry {
        let mut e = JournalEntry::new(id, amount, status);
        e.memo = memo.map(|m| Some(m.to_string()));
        e
    }

    #[test]
    fn emergent_pattern_needs_three_entries() {
        let mut entries = vec![
            entry("a", 20_000.0, EntryStatus::Draft, None),
            entry("b", 15_000.0, EntryStatus::Draft, Some("")),
            entry("c", 12_000.0, EntryStatus::Draft, Some("approved by CFO")),
        ];
        assert!(detect_emergent_patterns(&entries).is_empty());

        entries.push(entry("d", 10_001.0, EntryStatus::Pending, None));
        let found = detect_emergent_patterns(&entries);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "amount-without-memo");
        assert_eq!(found[0].entry_ids, vec!["a", "b", "d"]);
    }

    #[test]
    fn threshold_is_exclusive() {
        let entries = vec![
            entry("a", 10_000.0, EntryStatus::Draft, None),
            entry("b", 10_000.0, EntryStatus::Draft, None),
            entry("c", 10_000.0, EntryStatus::Draft, None),
        ];
        assert!(detect_emergent_patterns(&entries).is_empty());
    }

    #[test]
    fn uncovered_suggestions() {
        let entries = vec![
            entry("big1", 50_000.0, EntryStatus::Draft, None),
            entry("big2", 60_000.0, EntryStatus::Pending, None),
            entry("big3", 70_000.0, EntryStatus::Pending, None),
            entry("void", 10.0, EntryStatus::Voided, None),
        ];
        let mut coverage = CoverageMap::new();
        coverage.insert("big3".to_string(), vec!["r1".to_string()]);

        let suggestions = suggest_rules_from_uncovered(&entries, &coverage);
        assert_eq!(suggestions.len(), 2);
        assert_eq!(suggestions[0].id, "uncovered-large-amount");
        assert_eq!(suggestions[0].entry_ids, vec!["big1", "big2"]);
        assert_eq!(suggestions[1].id, "uncovered-voided-no-memo");
        assert_eq!(suggestions[1].entry_ids, vec!["void"]);
    }

    #[test]
    fn fully_covered_journal_has_no_suggestions() {
        let entries = vec![entry("v", 10.0, EntryStatus::Voided, None)];
        let mut coverage = CoverageMap::new();
        coverage.insert("v".to_string(), vec!["r1".to_string()]);
        assert!(suggest_rules_from_uncovered(&entries, &coverage).is_empty());
    }

    #[test]
    fn single_entry_suggestions() {
        let big = suggest_rule_for_entry(&entry("ent-9", 25_000.0, EntryStatus::Draft, None)).unwrap();
        assert_eq!(big.id, "auto::ent-9");
        assert_eq!(big.condition, "amount > 10000");

        let void = suggest_rule_for_entry(&entry("ent-8", 5.0, EntryStatus::Voided, None)).unwrap();
        assert_eq!(void.condition, "status == voided && !memo");

        assert!(suggest_rule_for_entry(&entry("ent-7", 5.0, EntryStatus::Posted, None)).is_none());
    }

    #[test]
    fn suggestion_json_is_camel_case() {
        let s = suggest_rule_for_entry(&entry("e", 20_000.0, EntryStatus::Draft, None)).unwrap();
        let value = serde_json::to_value(&s).unwrap();
        assert!(value.get("entryIds").is_some());
        assert!(value.get("recommendedMessage").is_some());
    }
}
