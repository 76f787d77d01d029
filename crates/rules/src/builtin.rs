//! Built-in rules expressed in code rather than JSON.
//!
//! These cover checks the declarative language cannot state, such as
//! looking inside an entry's audit trail.

use chrono::{DateTime, Utc};
use copilot_core::{EntryStatus, JournalEntry};

use crate::schema::{flag_id, CopilotFlag, BUILTIN_NAMESPACE};

/// A rule implemented in Rust.
pub trait CopilotRule: Send + Sync {
    fn id(&self) -> &str;

    fn description(&self) -> &str;

    /// Flags for every entry this rule objects to, stamped with `now`.
    fn evaluate(&self, entries: &[JournalEntry], now: DateTime<Utc>) -> Vec<CopilotFlag>;
}

/// Voided entries must carry a reason note somewhere in their audit trail.
#[derive(Debug, Clone, Copy, Default)]
pub struct VoidWithoutNote;

impl VoidWithoutNote {
    /// Short id used inside flag ids.
    pub const FLAG_KEY: &'static str = "voidnote";
    pub const MESSAGE: &'static str = "Voided entry lacks reason note";
}

impl CopilotRule for VoidWithoutNote {
    fn id(&self) -> &str {
        "no-void-without-note"
    }

    fn description(&self) -> &str {
        "Voided entries must include a reason note for traceability."
    }

    fn evaluate(&self, entries: &[JournalEntry], now: DateTime<Utc>) -> Vec<CopilotFlag> {
        entries
            .iter()
            .filter(|e| e.status == EntryStatus::Voided && !e.has_audit_note())
            .map(|e| {
                CopilotFlag::open(
                    flag_id(BUILTIN_NAMESPACE, Self::FLAG_KEY, &e.id),
                    e.id.clone(),
                    Self::MESSAGE,
                    now,
                )
            })
            .collect()
    }
}

/// The default built-in rule set.
pub fn builtin_rules() -> Vec<Box<dyn CopilotRule>> {
    vec![Box::new(VoidWithoutNote)]
}

/// Run every built-in rule, in registration order.
pub fn evaluate_builtin_rules(entries: &[JournalEntry], now: DateTime<Utc>) -> Vec<CopilotFlag> {
    builtin_rules()
        .iter()
        .flat_map(|rule| rule.evaluate(entries, now))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use copilot_core::{AuditEvent, AuditEventKind};

    fn voided(id: &str, note: Option<&str>) -> JournalEntry {
        let mut entry = JournalEntry::new(id, 100.0, EntryStatus::Voided);
        entry.audit_trail.push(AuditEvent {
            kind: AuditEventKind::Void,
            timestamp: Utc::now(),
            actor: "finance@bos.local".to_string(),
            note: note.map(str::to_string),
            delta: None,
        });
        entry
    }

    #[test]
    fn voids_without_note_are_flagged() {
        let entries = vec![
            voided("ent-004", None),
            voided("ent-005", Some("duplicate of ent-003")),
            JournalEntry::new("ent-006", 100.0, EntryStatus::Posted),
        ];
        let now = Utc::now();
        let flags = VoidWithoutNote.evaluate(&entries, now);

        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].id, "rule::voidnote::ent-004");
        assert_eq!(flags[0].message, VoidWithoutNote::MESSAGE);
        assert_eq!(flags[0].created_at, now);
        assert!(flags[0].is_open());
    }

    #[test]
    fn void_with_empty_trail_is_flagged() {
        let entries = vec![JournalEntry::new("ent-007", 1.0, EntryStatus::Voided)];
        assert_eq!(evaluate_builtin_rules(&entries, Utc::now()).len(), 1);
    }

    #[test]
    fn builtin_set_has_unique_ids() {
        let rules = builtin_rules();
        let mut ids: Vec<&str> = rules.iter().map(|r| r.id()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), rules.len());
        assert!(rules.iter().all(|r| !r.description().is_empty()));
    }
}
