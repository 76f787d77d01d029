//! In-memory rule store with per-rule version history.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use tracing::info;

use crate::loader::{Result, RuleError};
use crate::schema::{DeclarativeRule, RuleDomain, RuleHistory, RuleStatus};

/// Counts over the stored rule set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleStats {
    pub total: usize,
    pub active: usize,
    pub by_domain: BTreeMap<RuleDomain, usize>,
}

/// Ordered collection of declarative rules keyed by id.
///
/// Every mutation after insertion bumps the rule's `version` and records
/// the previous state in its `history`.
#[derive(Debug, Clone, Default)]
pub struct RuleStore {
    rules: IndexMap<String, DeclarativeRule>,
}

impl RuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from `rules`, rejecting duplicate ids.
    pub fn from_rules(rules: impl IntoIterator<Item = DeclarativeRule>) -> Result<Self> {
        let mut store = Self::new();
        for rule in rules {
            store.insert(rule)?;
        }
        Ok(store)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Add a new rule. Fails if the id is already taken.
    pub fn insert(&mut self, rule: DeclarativeRule) -> Result<()> {
        if rule.id.trim().is_empty() {
            return Err(RuleError::Validation("rule id must not be empty".to_string()));
        }
        if self.rules.contains_key(&rule.id) {
            return Err(RuleError::Validation(format!("duplicate rule id '{}'", rule.id)));
        }
        info!(rule_id = %rule.id, "added rule");
        self.rules.insert(rule.id.clone(), rule);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&DeclarativeRule> {
        self.rules.get(id)
    }

    /// All rules in insertion order.
    pub fn all(&self) -> Vec<DeclarativeRule> {
        self.rules.values().cloned().collect()
    }

    /// Active rules in insertion order.
    pub fn active(&self) -> Vec<DeclarativeRule> {
        self.rules.values().filter(|r| r.is_active()).cloned().collect()
    }

    /// Apply `change` to a rule, recording the prior version in its history.
    ///
    /// The rule id cannot be changed this way; an edit that alters it is
    /// rejected and the rule is left untouched.
    pub fn update<F>(
        &mut self,
        id: &str,
        actor: &str,
        comment: Option<&str>,
        now: DateTime<Utc>,
        change: F,
    ) -> Result<&DeclarativeRule>
    where
        F: FnOnce(&mut DeclarativeRule),
    {
        let rule = self
            .rules
            .get_mut(id)
            .ok_or_else(|| RuleError::Validation(format!("no rule with id '{}'", id)))?;

        let mut edited = rule.clone();
        change(&mut edited);
        if edited.id != rule.id {
            return Err(RuleError::Validation(format!(
                "rule id '{}' cannot be changed to '{}'",
                rule.id, edited.id
            )));
        }

        edited.history.push(RuleHistory {
            version: rule.version,
            timestamp: now,
            actor: actor.to_string(),
            comment: comment.map(str::to_string),
            snapshot: Box::new(rule.snapshot()),
        });
        edited.version = rule.version + 1;
        *rule = edited;

        info!(rule_id = %id, version = rule.version, actor = %actor, "updated rule");
        Ok(rule)
    }

    /// Flip a rule between active and inactive.
    pub fn toggle_status(&mut self, id: &str, actor: &str, now: DateTime<Utc>) -> Result<RuleStatus> {
        let rule = self.update(id, actor, Some("toggled status"), now, |r| {
            r.status = r.status.toggled();
        })?;
        Ok(rule.status)
    }

    /// Remove and return a rule.
    pub fn remove(&mut self, id: &str) -> Result<DeclarativeRule> {
        let removed = self
            .rules
            .shift_remove(id)
            .ok_or_else(|| RuleError::Validation(format!("no rule with id '{}'", id)))?;
        info!(rule_id = %id, "removed rule");
        Ok(removed)
    }

    pub fn stats(&self) -> RuleStats {
        let mut by_domain = BTreeMap::new();
        for domain in self.rules.values().filter_map(|r| r.domain) {
            *by_domain.entry(domain).or_insert(0) += 1;
        }
        RuleStats {
            total: self.rules.len(),
            active: self.rules.values().filter(|r| r.is_active()).count(),
            by_domain,
        }
    }
}
