//! [`RuleLoader`]: filesystem-backed rule loading with optional hot-reload.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use copilot_core::FieldRegistry;
use indexmap::IndexMap;
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, info, warn};

use crate::schema::DeclarativeRule;
use crate::validation::validate_rule_set;

use super::error::{LoadResult, LoadStatus, Result, RuleError};
use super::parse::RuleFormat;
use super::watcher::handle_fs_event;

/// Rules currently loaded, plus which file each came from.
#[derive(Debug, Default)]
pub(super) struct LoadedRules {
    rules: IndexMap<String, DeclarativeRule>,
    files: HashMap<PathBuf, Vec<String>>,
}

impl LoadedRules {
    /// Replace everything `path` contributed with `rules`. Returns the new ids.
    pub(super) fn replace_file(&mut self, path: &Path, rules: Vec<DeclarativeRule>) -> Vec<String> {
        self.remove_file(path);

        let ids: Vec<String> = rules.iter().map(|r| r.id.clone()).collect();
        for rule in rules {
            if let Some(owner) = self.owner_of(&rule.id) {
                warn!(
                    rule_id = %rule.id,
                    previous = %owner.display(),
                    path = %path.display(),
                    "rule id defined in more than one file, last load wins"
                );
                if let Some(owned) = self.files.get_mut(&owner) {
                    owned.retain(|id| id != &rule.id);
                }
            }
            self.rules.insert(rule.id.clone(), rule);
        }
        self.files.insert(path.to_path_buf(), ids.clone());
        ids
    }

    /// Drop every rule loaded from `path`. Returns the removed ids.
    pub(super) fn remove_file(&mut self, path: &Path) -> Vec<String> {
        let ids = self.files.remove(path).unwrap_or_default();
        for id in &ids {
            self.rules.shift_remove(id);
        }
        ids
    }

    /// Drop every file not in `present`. Returns the removed ids.
    pub(super) fn retain_files(&mut self, present: &HashSet<PathBuf>) -> Vec<String> {
        let stale: Vec<PathBuf> = self
            .files
            .keys()
            .filter(|path| !present.contains(*path))
            .cloned()
            .collect();
        stale.iter().flat_map(|path| self.remove_file(path)).collect()
    }

    pub(super) fn rules(&self) -> impl Iterator<Item = &DeclarativeRule> {
        self.rules.values()
    }

    pub(super) fn get(&self, id: &str) -> Option<&DeclarativeRule> {
        self.rules.get(id)
    }

    fn owner_of(&self, id: &str) -> Option<PathBuf> {
        self.files
            .iter()
            .find(|(_, ids)| ids.iter().any(|i| i == id))
            .map(|(path, _)| path.clone())
    }
}

pub(super) type SharedRules = Arc<RwLock<LoadedRules>>;

pub(super) fn write_lock(shared: &SharedRules) -> RwLockWriteGuard<'_, LoadedRules> {
    shared.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn read_lock(shared: &SharedRules) -> RwLockReadGuard<'_, LoadedRules> {
    shared.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Read, parse and validate one rule file. Validation findings are logged,
/// never fatal.
pub(super) fn read_rule_file(path: &Path, registry: &FieldRegistry) -> Result<Vec<DeclarativeRule>> {
    let format = RuleFormat::from_path(path).ok_or_else(|| RuleError::InvalidRuleDefinition {
        origin: path.display().to_string(),
        message: "not a .json, .yml or .yaml file".to_string(),
    })?;
    let contents = fs::read_to_string(path)?;
    let rules = format.parse(&contents, &path.display().to_string())?;

    let report = validate_rule_set(&rules, registry);
    for line in report.messages() {
        warn!(path = %path.display(), "{}", line);
    }
    Ok(rules)
}

/// Filesystem-backed rule loader with optional hot-reload.
///
/// Scans a directory recursively for `*.json`, `*.yml` and `*.yaml` files.
/// Each file may hold one rule or a list of rules. Rules are kept in file
/// name order, then in order within each file.
pub struct RuleLoader {
    rules_dir: PathBuf,
    registry: FieldRegistry,
    loaded: SharedRules,
    /// Held to keep the watcher alive.
    _watcher: Option<RecommendedWatcher>,
}

impl RuleLoader {
    /// Create a loader for `rules_dir`, creating the directory if needed.
    pub fn new(rules_dir: impl Into<PathBuf>) -> Self {
        Self::with_registry(rules_dir, FieldRegistry::journal())
    }

    /// Create a loader that validates field names against `registry`.
    pub fn with_registry(rules_dir: impl Into<PathBuf>, registry: FieldRegistry) -> Self {
        let rules_dir = rules_dir.into();
        if !rules_dir.exists() {
            if let Err(e) = fs::create_dir_all(&rules_dir) {
                warn!(path = %rules_dir.display(), error = %e, "failed to create rules directory");
            }
        }
        Self {
            rules_dir,
            registry,
            loaded: Arc::new(RwLock::new(LoadedRules::default())),
            _watcher: None,
        }
    }

    /// Scan the rules directory and load every rule file.
    ///
    /// Dotfiles and other extensions are reported as skipped. A file that
    /// fails to parse is reported as failed, keeps whatever it held before
    /// and does not abort the scan. Rules from files that have disappeared
    /// since the last scan are dropped.
    pub fn load_all(&self) -> Result<Vec<LoadResult>> {
        let mut results = Vec::new();
        let mut present = HashSet::new();
        self.scan_dir(&self.rules_dir, &mut results, &mut present)?;

        let removed = write_lock(&self.loaded).retain_files(&present);
        if !removed.is_empty() {
            info!(rules = ?removed, "dropped rules from deleted files");
        }
        let total = read_lock(&self.loaded).rules.len();
        info!(path = %self.rules_dir.display(), files = results.len(), rules = total, "rule scan complete");
        Ok(results)
    }

    fn scan_dir(
        &self,
        dir: &Path,
        results: &mut Vec<LoadResult>,
        present: &mut HashSet<PathBuf>,
    ) -> Result<()> {
        let entries = match fs::read_dir(dir) {
            Ok(e) => e,
            Err(e) => {
                warn!(path = %dir.display(), error = %e, "failed to read directory");
                return Ok(());
            }
        };

        let mut paths = entries
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<Vec<_>>>()?;
        paths.sort();

        for path in paths {
            let hidden = path
                .file_name()
                .and_then(|n| n.to_str())
                .map_or(false, |n| n.starts_with('.'));
            if hidden {
                if path.is_file() {
                    results.push(skipped(path, "dotfile"));
                }
                continue;
            }

            if path.is_dir() {
                self.scan_dir(&path, results, present)?;
                continue;
            }

            if RuleFormat::from_path(&path).is_none() {
                results.push(skipped(path, "not a rule file"));
                continue;
            }

            present.insert(path.clone());
            let status = match read_rule_file(&path, &self.registry) {
                Ok(rules) => {
                    let rule_ids = write_lock(&self.loaded).replace_file(&path, rules);
                    debug!(path = %path.display(), count = rule_ids.len(), "loaded rule file");
                    LoadStatus::Loaded { rule_ids }
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to load rule file");
                    LoadStatus::Failed {
                        error: e.to_string(),
                    }
                }
            };
            results.push(LoadResult { path, status });
        }

        Ok(())
    }

    /// Parse one file without adding it to the loaded set.
    pub fn load_file(&self, path: &Path) -> Result<Vec<DeclarativeRule>> {
        read_rule_file(path, &self.registry)
    }

    /// Watch the rules directory and reload files as they change.
    ///
    /// Created or modified files are re-parsed and replace what they held
    /// before; a file that no longer parses keeps its previous rules.
    /// Deleted files drop their rules.
    pub fn watch(&mut self) -> Result<()> {
        let loaded = Arc::clone(&self.loaded);
        let registry = self.registry.clone();

        let mut watcher = notify::recommended_watcher(
            move |res: std::result::Result<notify::Event, notify::Error>| match res {
                Ok(event) => handle_fs_event(&event, &loaded, &registry),
                Err(e) => warn!(error = %e, "filesystem watcher error"),
            },
        )?;

        watcher.watch(&self.rules_dir, RecursiveMode::Recursive)?;
        let _ = watcher.configure(notify::Config::default().with_poll_interval(Duration::from_millis(500)));

        info!(path = %self.rules_dir.display(), "watching rules directory for changes");
        self._watcher = Some(watcher);
        Ok(())
    }

    pub fn rules_dir(&self) -> &Path {
        &self.rules_dir
    }

    /// Snapshot of every loaded rule, active or not.
    pub fn rules(&self) -> Vec<DeclarativeRule> {
        read_lock(&self.loaded).rules().cloned().collect()
    }

    pub fn get(&self, id: &str) -> Option<DeclarativeRule> {
        read_lock(&self.loaded).get(id).cloned()
    }

    /// Atomically write `rule` to `<id>.json` in the rules directory.
    ///
    /// Writes a dot-prefixed temp file first and renames it into place, so
    /// the watcher never sees a partial file.
    pub fn write_rule(&self, rule: &DeclarativeRule) -> Result<PathBuf> {
        if rule.id.is_empty() || rule.id.contains(['/', '\\']) || rule.id.starts_with('.') {
            return Err(RuleError::Validation(format!(
                "rule id '{}' cannot be used as a file name",
                rule.id
            )));
        }

        let final_path = self.rules_dir.join(format!("{}.json", rule.id));
        let tmp_path = self.rules_dir.join(format!(".{}.tmp", rule.id));

        let json = serde_json::to_string_pretty(rule)?;
        fs::write(&tmp_path, json)?;
        fs::rename(&tmp_path, &final_path)?;

        info!(rule_id = %rule.id, path = %final_path.display(), "wrote rule file");
        write_lock(&self.loaded).replace_file(&final_path, vec![rule.clone()]);
        Ok(final_path)
    }

    /// Delete the single-rule file for `id` and drop its rules.
    pub fn delete_rule(&self, id: &str) -> Result<()> {
        let path = ["json", "yml", "yaml"]
            .iter()
            .map(|ext| self.rules_dir.join(format!("{id}.{ext}")))
            .find(|p| p.exists())
            .ok_or_else(|| RuleError::Validation(format!("no rule file found for id '{id}'")))?;

        fs::remove_file(&path)?;
        write_lock(&self.loaded).remove_file(&path);

        info!(rule_id = %id, path = %path.display(), "deleted rule");
        Ok(())
    }
}

fn skipped(path: PathBuf, reason: &str) -> LoadResult {
    LoadResult {
        path,
        status: LoadStatus::Skipped {
            reason: reason.to_string(),
        },
    }
}
