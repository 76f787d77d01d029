use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::schema::CopilotFlag;

use super::error::Result;
use super::store::FlagStore;

/// JSON-array persistence for a [`FlagStore`].
#[derive(Debug, Clone)]
pub struct FlagFile {
    path: PathBuf,
}

impl FlagFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored flags. A missing, unreadable or invalid file yields
    /// an empty store.
    pub fn load(&self) -> FlagStore {
        let contents = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no flag file yet, starting empty");
                return FlagStore::new();
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to read flag file, starting empty");
                return FlagStore::new();
            }
        };

        match serde_json::from_str::<Vec<CopilotFlag>>(&contents) {
            Ok(flags) => {
                debug!(path = %self.path.display(), count = flags.len(), "loaded flags");
                FlagStore::from_flags(flags)
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "invalid flag file, starting empty");
                FlagStore::new()
            }
        }
    }

    /// Write `store` as a pretty JSON array via a temp file and rename.
    pub fn save(&self, store: &FlagStore) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(&store.to_vec())?;
        let tmp_path = self.tmp_path();
        fs::write(&tmp_path, json)?;
        fs::rename(&tmp_path, &self.path)?;

        info!(path = %self.path.display(), count = store.len(), "saved flags");
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "flags".to_string());
        self.path.with_file_name(format!(".{name}.tmp"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FlagStatus;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    #[test]
    fn missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let file = FlagFile::new(dir.path().join("flags.json"));
        assert!(file.load().is_empty());
    }

    #[test]
    fn invalid_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("flags.json");
        fs::write(&path, "{\"not\": \"an array\"}").unwrap();
        assert!(FlagFile::new(&path).load().is_empty());
    }

    #[test]
    fn save_then_load_keeps_reviews() {
        let dir = TempDir::new().unwrap();
        let file = FlagFile::new(dir.path().join("nested").join("flags.json"));
        let created = Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap();

        let mut store = FlagStore::from_flags(vec![
            CopilotFlag::open("json::r1::e1", "e1", "big", created),
            CopilotFlag::open("json::r1::e2", "e2", "big", created),
        ]);
        store.dismiss("json::r1::e2", "admin@bos.local", created).unwrap();

        file.save(&store).unwrap();
        assert!(!dir.path().join("nested").join(".flags.json.tmp").exists());

        let loaded = file.load();
        assert_eq!(loaded, store);
        assert_eq!(loaded.get("json::r1::e2").unwrap().status, FlagStatus::Dismissed);
    }

    #[test]
    fn saved_file_uses_camel_case() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("flags.json");
        let created = Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap();
        let store = FlagStore::from_flags(vec![CopilotFlag::open("json::r1::e1", "e1", "big", created)]);

        FlagFile::new(&path).save(&store).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.trim_start().starts_with('['));
        assert!(text.contains("\"entryId\""));
        assert!(text.contains("\"createdAt\""));
        assert!(!text.contains("reviewedBy"));
    }
}
