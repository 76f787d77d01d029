//! Per-rule record of what happened during validation and evaluation.
//!
//! Each rule keeps its own FIFO queue, capped at `COPILOT_AUDIT_LOG_CAP`
//! records (500 by default). The log is shared behind a `RwLock` and is only
//! ever appended to or read, so a poisoned lock is recovered rather than
//! propagated.

use std::collections::{HashMap, VecDeque};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

/// Step of a rule's lifecycle that produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionPhase {
    /// Definition checks run before evaluation.
    Validation,
    Evaluation,
    /// Entries excluded by `appliesToStatus`.
    StatusGate,
    Match,
    Complete,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    pub timestamp: DateTime<Utc>,
    pub rule_id: String,
    pub level: LogLevel,
    pub phase: ExecutionPhase,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

/// Filter for [`AuditLog::query`]. The default matches everything up to
/// [`LogQuery::DEFAULT_LIMIT`] records.
#[derive(Debug, Clone, Default)]
pub struct LogQuery {
    min_level: Option<LogLevel>,
    phase: Option<ExecutionPhase>,
    limit: Option<usize>,
    since: Option<DateTime<Utc>>,
}

impl LogQuery {
    pub const DEFAULT_LIMIT: usize = 100;

    pub fn new() -> Self {
        Self::default()
    }

    /// Keep records at `level` or above.
    pub fn min_level(mut self, level: LogLevel) -> Self {
        self.min_level = Some(level);
        self
    }

    pub fn phase(mut self, phase: ExecutionPhase) -> Self {
        self.phase = Some(phase);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Keep records stamped at or after `since`.
    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    fn accepts(&self, record: &AuditRecord) -> bool {
        self.min_level.map_or(true, |min| record.level >= min)
            && self.phase.map_or(true, |p| record.phase == p)
            && self.since.map_or(true, |s| record.timestamp >= s)
    }
}

type Queues = HashMap<String, VecDeque<AuditRecord>>;

pub struct AuditLog {
    queues: RwLock<Queues>,
    cap: usize,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::with_max_entries(copilot_core::config::DEFAULT_AUDIT_LOG_CAP)
    }

    /// Log keeping at most `cap` records per rule.
    pub fn with_max_entries(cap: usize) -> Self {
        Self {
            queues: RwLock::new(HashMap::new()),
            cap,
        }
    }

    pub fn record(&self, rule_id: &str, level: LogLevel, phase: ExecutionPhase, message: impl Into<String>) {
        self.record_detailed(rule_id, level, phase, message, None, None);
    }

    /// Append a record carrying structured details and/or a duration.
    pub fn record_detailed(
        &self,
        rule_id: &str,
        level: LogLevel,
        phase: ExecutionPhase,
        message: impl Into<String>,
        details: Option<serde_json::Value>,
        duration_ms: Option<u64>,
    ) {
        let record = AuditRecord {
            timestamp: Utc::now(),
            rule_id: rule_id.to_string(),
            level,
            phase,
            message: message.into(),
            details,
            duration_ms,
        };

        let mut queues = self.write();
        let queue = queues.entry(rule_id.to_string()).or_default();
        queue.push_back(record);
        while queue.len() > self.cap {
            queue.pop_front();
        }
    }

    /// Records for one rule matching `query`, newest first.
    pub fn query(&self, rule_id: &str, query: &LogQuery) -> Vec<AuditRecord> {
        let queues = self.read();
        let Some(queue) = queues.get(rule_id) else {
            return Vec::new();
        };
        queue
            .iter()
            .rev()
            .filter(|r| query.accepts(r))
            .take(query.limit.unwrap_or(LogQuery::DEFAULT_LIMIT))
            .cloned()
            .collect()
    }

    /// Rule ids holding at least one record at `level` or above, sorted.
    pub fn rules_at_level(&self, level: LogLevel) -> Vec<String> {
        let mut ids: Vec<String> = self
            .read()
            .iter()
            .filter(|(_, queue)| queue.iter().any(|r| r.level >= level))
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Rule ids with any retained record, sorted.
    pub fn rule_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn clear(&self, rule_id: &str) {
        self.write().remove(rule_id);
    }

    fn read(&self) -> RwLockReadGuard<'_, Queues> {
        self.queues.read().unwrap_or_else(|p| p.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Queues> {
        self.queues.write().unwrap_or_else(|p| p.into_inner())
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}
