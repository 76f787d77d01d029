use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Unique journal entry identifier (e.g. `"ent-001"`).
pub type EntryId = String;

/// Posting lifecycle of a journal entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    Draft,
    Pending,
    Posted,
    Voided,
}

impl EntryStatus {
    /// Wire name, identical to the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryStatus::Draft => "draft",
            EntryStatus::Pending => "pending",
            EntryStatus::Posted => "posted",
            EntryStatus::Voided => "voided",
        }
    }
}

impl std::fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Channel an entry was last written through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EntrySource {
    #[default]
    Web,
    Api,
}

impl EntrySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntrySource::Web => "web",
            EntrySource::Api => "api",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuditEventKind {
    Create,
    Edit,
    StatusChange,
    Void,
    ViewRevision,
}

/// A single change recorded against an entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    #[serde(rename = "type")]
    pub kind: AuditEventKind,
    pub timestamp: DateTime<Utc>,
    pub actor: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Field name → `{ "from": .., "to": .. }`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta: Option<IndexMap<String, FieldDelta>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDelta {
    pub from: serde_json::Value,
    pub to: serde_json::Value,
}

/// Before/after snapshot of an edit. Snapshots are partial entries, kept as raw JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Revision {
    pub before: serde_json::Value,
    pub after: serde_json::Value,
    pub timestamp: DateTime<Utc>,
    pub actor: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// A journal/ledger record as seen by the rule engine.
///
/// Known attributes are typed; anything else in the source JSON lands in
/// `extra` and stays addressable by name through the field registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    pub id: EntryId,
    #[serde(default)]
    pub description: String,
    pub amount: f64,
    #[serde(default)]
    pub updated_by: String,
    #[serde(default)]
    pub source: EntrySource,
    #[serde(default)]
    pub revision_count: u32,
    pub status: EntryStatus,
    #[serde(default)]
    pub audit_trail: Vec<AuditEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revisions: Option<Vec<Revision>>,
    /// Reviewer feedback items: plain comments or structured records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<Vec<serde_json::Value>>,
    /// `None` when the key is missing, `Some(None)` for an explicit `null`.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub memo: Option<Option<String>>,
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_json::Value>,
}

impl JournalEntry {
    /// Minimal entry with empty bookkeeping fields.
    pub fn new(id: impl Into<EntryId>, amount: f64, status: EntryStatus) -> Self {
        Self {
            id: id.into(),
            description: String::new(),
            amount,
            updated_by: String::new(),
            source: EntrySource::Web,
            revision_count: 0,
            status,
            audit_trail: Vec::new(),
            revisions: None,
            feedback: None,
            memo: None,
            extra: IndexMap::new(),
        }
    }

    /// True when at least one feedback item is attached.
    pub fn has_feedback(&self) -> bool {
        self.feedback.as_ref().is_some_and(|f| !f.is_empty())
    }

    /// Memo text, if any.
    pub fn memo(&self) -> Option<&str> {
        self.memo.as_ref().and_then(|m| m.as_deref())
    }

    /// Set or replace the memo text.
    pub fn set_memo(&mut self, memo: impl Into<String>) {
        self.memo = Some(Some(memo.into()));
    }

    /// True when the memo is present and non-empty.
    pub fn has_memo(&self) -> bool {
        self.memo().is_some_and(|m| !m.is_empty())
    }

    /// True when any audit event carries a non-empty note.
    pub fn has_audit_note(&self) -> bool {
        self.audit_trail
            .iter()
            .any(|ev| ev.note.as_deref().is_some_and(|n| !n.is_empty()))
    }
}

/// Wrap whatever the key held, `null` included, so only a missing key
/// (handled by `#[serde(default)]`) stays `None`.
fn present<'de, D, T>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Parse a JSON array of entries.
pub fn parse_entries(json: &str) -> Result<Vec<JournalEntry>> {
    Ok(serde_json::from_str(json)?)
}

/// Read a JSON array of entries from disk.
pub fn load_entries(path: &Path) -> Result<Vec<JournalEntry>> {
    let contents = fs::read_to_string(path)?;
    let entries = parse_entries(&contents)?;
    tracing::debug!(path = %path.display(), count = entries.len(), "loaded journal entries");
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_camel_case_entry_with_extras() {
        let entry: JournalEntry = serde_json::from_str(
            r#"{
                "id": "ent-001",
                "description": "Cash deposit",
                "amount": 1000,
                "updatedBy": "admin@bos.local",
                "source": "web",
                "revisionCount": 3,
                "status": "draft",
                "auditTrail": [],
                "reference": "INV-42"
            }"#,
        )
        .unwrap();

        assert_eq!(entry.id, "ent-001");
        assert_eq!(entry.amount, 1000.0);
        assert_eq!(entry.updated_by, "admin@bos.local");
        assert_eq!(entry.revision_count, 3);
        assert_eq!(entry.status, EntryStatus::Draft);
        assert_eq!(entry.extra.get("reference"), Some(&serde_json::json!("INV-42")));
        assert!(entry.memo.is_none());
    }

    #[test]
    fn minimal_entry_uses_defaults() {
        let entry: JournalEntry =
            serde_json::from_str(r#"{"id":"e1","amount":1500,"status":"pending"}"#).unwrap();
        assert_eq!(entry.source, EntrySource::Web);
        assert!(entry.audit_trail.is_empty());
        assert!(!entry.has_feedback());
    }

    #[test]
    fn audit_note_detection_ignores_empty_notes() {
        let mut entry = JournalEntry::new("e1", 10.0, EntryStatus::Voided);
        entry.audit_trail.push(AuditEvent {
            kind: AuditEventKind::Void,
            timestamp: Utc::now(),
            actor: "finance@bos.local".to_string(),
            note: Some(String::new()),
            delta: None,
        });
        assert!(!entry.has_audit_note());

        entry.audit_trail[0].note = Some("duplicate invoice".to_string());
        assert!(entry.has_audit_note());
    }

    #[test]
    fn feedback_accepts_comments_and_records() {
        let entry: JournalEntry = serde_json::from_str(
            r#"{"id":"j001","amount":500,"status":"draft","feedback":[
                "check vendor",
                {"user":"manager@company.com","comment":"Please verify the vendor details","type":"comment"}
            ]}"#,
        )
        .unwrap();
        assert!(entry.has_feedback());
        assert_eq!(entry.feedback.as_ref().map(Vec::len), Some(2));

        let empty: JournalEntry =
            serde_json::from_str(r#"{"id":"j002","amount":1,"status":"draft","feedback":[]}"#).unwrap();
        assert!(!empty.has_feedback());
    }

    #[test]
    fn explicit_null_memo_differs_from_missing() {
        let entries = parse_entries(
            r#"[
                {"id":"e1","amount":1,"status":"draft","memo":null},
                {"id":"e2","amount":1,"status":"draft"},
                {"id":"e3","amount":1,"status":"draft","memo":"accrual"}
            ]"#,
        )
        .unwrap();
        assert_eq!(entries[0].memo, Some(None));
        assert_eq!(entries[1].memo, None);
        assert_eq!(entries[2].memo(), Some("accrual"));
        assert!(!entries[0].has_memo());
        assert!(entries[2].has_memo());

        let json = serde_json::to_value(&entries[0]).unwrap();
        assert_eq!(json.get("memo"), Some(&serde_json::Value::Null));
        let json = serde_json::to_value(&entries[1]).unwrap();
        assert!(json.get("memo").is_none());
    }

    #[test]
    fn parse_entries_rejects_non_array() {
        assert!(parse_entries(r#"{"id":"e1"}"#).is_err());
        assert_eq!(parse_entries("[]").unwrap().len(), 0);
    }

    #[test]
    fn audit_event_kind_is_kebab_case() {
        let json = serde_json::to_string(&AuditEventKind::StatusChange).unwrap();
        assert_eq!(json, "\"status-change\"");
    }
}
