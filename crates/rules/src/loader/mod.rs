//! Filesystem rule loader with hot-reload via `notify` watcher.
//!
//! Rule files are JSON or YAML, each holding a single rule object or a list
//! of rules. The watcher picks up create, modify, rename and delete events
//! and keeps the in-memory rule set in step with the directory.

mod core;
mod error;
mod parse;
mod watcher;


pub use self::core::RuleLoader;
pub use self::error::{LoadResult, LoadStatus, Result, RuleError};
pub use self::parse::{parse_rules_json, parse_rules_yaml, RuleFormat};
