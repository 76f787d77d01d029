//! Ledger Copilot rule engine.
//!
//! This crate provides:
//! - Declarative `(field, condition, value)` rules in JSON or YAML
//! - Filesystem loader with hot-reload via `notify` watcher
//! - Fail-closed evaluation into deterministic, deduplicating flags
//! - Built-in code rules alongside the declarative ones
//! - Flag review lifecycle, re-evaluation merge and JSON persistence
//! - Copilot score, rule coverage and rule suggestions

pub mod audit_log;
pub mod builtin;
pub mod condition;
pub mod evaluator;
pub mod expression;
pub mod flags;
pub mod heuristics;
pub mod loader;
pub mod schema;
pub mod score;
pub mod store;
pub mod validation;

pub use builtin::{builtin_rules, evaluate_builtin_rules, CopilotRule};
pub use evaluator::RuleEvaluator;
pub use flags::{FlagError, FlagFile, FlagStore, MergePolicy};
pub use loader::{RuleError, RuleLoader};
pub use schema::{CopilotFlag, DeclarativeRule, FlagStatus};
pub use score::copilot_score;
pub use store::RuleStore;
