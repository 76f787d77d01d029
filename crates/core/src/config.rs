use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_usize(profile: &str, key: &str, default: usize) -> usize {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

pub const DEFAULT_REVIEWER: &str = "admin@bos.local";
pub const DEFAULT_MERGE_POLICY: &str = "preserve-review";
pub const DEFAULT_AUDIT_LOG_CAP: usize = 500;

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub rules: RulesConfig,
    pub flags: FlagsConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `COPILOT_PROFILE`. When set (e.g. `PROD`), every
    /// key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("COPILOT_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            rules: RulesConfig::from_env_profiled(p),
            flags: FlagsConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Reject values that would make the engine misbehave silently.
    pub fn validate(&self) -> Result<()> {
        if self.rules.audit_log_cap == 0 {
            return Err(CoreError::Config {
                key: "COPILOT_AUDIT_LOG_CAP".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        if self.flags.reviewer.trim().is_empty() {
            return Err(CoreError::Config {
                key: "COPILOT_REVIEWER".to_string(),
                message: "must not be blank".to_string(),
            });
        }
        Ok(())
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  rules:  dir={}, audit_log_cap={}", self.rules.dir.display(), self.rules.audit_log_cap);
        tracing::info!(
            "  flags:  file={}, merge={}, reviewer={}",
            self.flags.file.display(),
            self.flags.merge_policy,
            self.flags.reviewer
        );
    }
}

// ── Rules ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesConfig {
    pub dir: PathBuf,
    /// Per-rule cap on retained evaluation audit entries.
    pub audit_log_cap: usize,
}

impl RulesConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            dir: PathBuf::from(profiled_env_or(p, "COPILOT_RULES_DIR", "data/rules")),
            audit_log_cap: profiled_env_usize(p, "COPILOT_AUDIT_LOG_CAP", DEFAULT_AUDIT_LOG_CAP),
        }
    }
}

// ── Flags ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlagsConfig {
    pub file: PathBuf,
    /// `"overwrite"` or `"preserve-review"`.
    pub merge_policy: String,
    /// Principal recorded on review transitions.
    pub reviewer: String,
}

impl FlagsConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            file: PathBuf::from(profiled_env_or(p, "COPILOT_FLAGS_FILE", "data/copilot-flags.json")),
            merge_policy: profiled_env_or(p, "COPILOT_MERGE_POLICY", DEFAULT_MERGE_POLICY),
            reviewer: profiled_env_or(p, "COPILOT_REVIEWER", DEFAULT_REVIEWER),
        }
    }
}
