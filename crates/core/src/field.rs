//! Typed field values and the named-field accessor registry.
//!
//! Rules address entry attributes by their JSON name (`"amount"`, `"memo"`,
//! `"updatedBy"`, ...). The registry maps each known name to a typed getter;
//! names it does not know fall through to the entry's free-form `extra` map
//! and finally to [`FieldValue::Absent`].

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::entry::JournalEntry;

/// A value read from an entry, or a rule comparand.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Boolean(bool),
    Null,
    /// The entry has no such attribute.
    Absent,
    /// Lists and objects. Never equal to anything, not even themselves.
    Composite,
}

impl FieldValue {
    /// Extract as string, returning None for non-text values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// String form used for substring tests: text as-is, numbers in shortest
    /// decimal form, booleans and null by name.
    pub fn display_string(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Number(n) => format_number(*n),
            FieldValue::Boolean(b) => b.to_string(),
            FieldValue::Null => "null".to_string(),
            FieldValue::Absent => "undefined".to_string(),
            FieldValue::Composite => "[object]".to_string(),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else {
        // f64 Display already drops a trailing ".0"
        n.to_string()
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_string())
    }
}

impl From<&serde_json::Value> for FieldValue {
    fn from(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::String(s) => FieldValue::Text(s.clone()),
            serde_json::Value::Number(n) => n.as_f64().map(FieldValue::Number).unwrap_or(FieldValue::Null),
            serde_json::Value::Bool(b) => FieldValue::Boolean(*b),
            serde_json::Value::Null => FieldValue::Null,
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => FieldValue::Composite,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Number(n)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(FieldValue::Absent)
    }
}

/// Typed getter for one named attribute.
pub type FieldGetter = fn(&JournalEntry) -> FieldValue;

/// Name → getter table for [`JournalEntry`] attributes.
#[derive(Clone)]
pub struct FieldRegistry {
    getters: HashMap<&'static str, FieldGetter>,
}

impl FieldRegistry {
    /// Empty registry: every lookup falls through to `extra`.
    pub fn empty() -> Self {
        Self {
            getters: HashMap::new(),
        }
    }

    /// Registry with every typed [`JournalEntry`] attribute under its JSON name.
    pub fn journal() -> Self {
        let mut registry = Self::empty();
        registry.register("id", |e| FieldValue::Text(e.id.clone()));
        registry.register("description", |e| FieldValue::Text(e.description.clone()));
        registry.register("amount", |e| FieldValue::Number(e.amount));
        registry.register("updatedBy", |e| FieldValue::Text(e.updated_by.clone()));
        registry.register("source", |e| FieldValue::Text(e.source.as_str().to_string()));
        registry.register("revisionCount", |e| FieldValue::Number(f64::from(e.revision_count)));
        registry.register("status", |e| FieldValue::Text(e.status.as_str().to_string()));
        registry.register("memo", |e| match &e.memo {
            None => FieldValue::Absent,
            Some(None) => FieldValue::Null,
            Some(Some(m)) => FieldValue::Text(m.clone()),
        });
        registry.register("auditTrail", |_| FieldValue::Composite);
        registry.register("revisions", |e| {
            if e.revisions.is_some() {
                FieldValue::Composite
            } else {
                FieldValue::Absent
            }
        });
        registry.register("feedback", |e| {
            if e.feedback.is_some() {
                FieldValue::Composite
            } else {
                FieldValue::Absent
            }
        });
        registry
    }

    /// Add or replace the getter for `name`.
    pub fn register(&mut self, name: &'static str, getter: FieldGetter) {
        self.getters.insert(name, getter);
    }

    /// True if `name` has a typed getter.
    pub fn is_known(&self, name: &str) -> bool {
        self.getters.contains_key(name)
    }

    /// Sorted list of registered names (used for "did you mean" suggestions).
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.getters.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Read `name` from `entry`.
    pub fn get(&self, entry: &JournalEntry, name: &str) -> FieldValue {
        if let Some(getter) = self.getters.get(name) {
            return getter(entry);
        }
        entry
            .extra
            .get(name)
            .map(FieldValue::from)
            .unwrap_or(FieldValue::Absent)
    }
}

impl Default for FieldRegistry {
    fn default() -> Self {
        Self::journal()
    }
}

impl fmt::Debug for FieldRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldRegistry")
            .field("names", &self.names())
            .finish()
    }
}
