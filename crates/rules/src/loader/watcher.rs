//! Filesystem event handler for the notify watcher (hot-reload).

use std::path::Path;

use copilot_core::FieldRegistry;
use notify::event::{CreateKind, ModifyKind, RemoveKind};
use notify::{Event, EventKind};
use tracing::{info, warn};

use super::core::{read_rule_file, write_lock, SharedRules};
use super::parse::RuleFormat;

pub(super) fn handle_fs_event(event: &Event, loaded: &SharedRules, registry: &FieldRegistry) {
    for path in &event.paths {
        if !is_watched_rule_file(path) {
            continue;
        }

        match &event.kind {
            EventKind::Create(CreateKind::File)
            | EventKind::Modify(ModifyKind::Data(_))
            | EventKind::Modify(ModifyKind::Name(_)) => {
                if !path.exists() {
                    // Rename away from this path.
                    drop_file(loaded, path);
                    continue;
                }
                match read_rule_file(path, registry) {
                    Ok(rules) => {
                        let ids = write_lock(loaded).replace_file(path, rules);
                        info!(path = %path.display(), rules = ?ids, "hot-reloaded rule file");
                    }
                    Err(e) => {
                        warn!(
                            path = %path.display(),
                            error = %e,
                            "failed to reload rule file, keeping previous version"
                        );
                    }
                }
            }
            EventKind::Remove(RemoveKind::File) => drop_file(loaded, path),
            _ => {}
        }
    }
}

fn drop_file(loaded: &SharedRules, path: &Path) {
    let removed = write_lock(loaded).remove_file(path);
    if !removed.is_empty() {
        info!(path = %path.display(), rules = ?removed, "removed rules after file deletion");
    }
}

/// Rule files only; dotfiles (including our temp files) are ignored.
fn is_watched_rule_file(path: &Path) -> bool {
    let hidden = path
        .file_name()
        .and_then(|n| n.to_str())
        .map_or(true, |n| n.starts_with('.'));
    !hidden && RuleFormat::from_path(path).is_some()
}
