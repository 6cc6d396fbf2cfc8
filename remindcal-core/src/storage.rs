//! Persistence of the reminder collection.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{RemindError, RemindResult};
use crate::store::StoreSnapshot;

/// Load/save of the full serialisable collection.
pub trait ReminderStorage {
    /// The stored collection, or an empty one if nothing was saved yet.
    fn load(&self) -> RemindResult<StoreSnapshot>;

    fn save(&self, snapshot: &StoreSnapshot) -> RemindResult<()>;
}

/// JSON file storage.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileStorage { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ReminderStorage for JsonFileStorage {
    fn load(&self) -> RemindResult<StoreSnapshot> {
        if !self.path.exists() {
            return Ok(StoreSnapshot::default());
        }
        let content = std::fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(StoreSnapshot::default());
        }
        serde_json::from_str(&content).map_err(|e| {
            RemindError::Serialization(format!("{}: {e}", self.path.display()))
        })
    }

    fn save(&self, snapshot: &StoreSnapshot) -> RemindResult<()> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        let content = serde_json::to_string_pretty(snapshot)
            .map_err(|e| RemindError::Serialization(e.to_string()))?;

        // Write-then-rename so a crash never leaves a half-written file
        let mut temp = self.path.clone().into_os_string();
        temp.push(".tmp");
        let temp = PathBuf::from(temp);
        std::fs::write(&temp, content)?;
        std::fs::rename(&temp, &self.path)?;

        debug!(
            path = %self.path.display(),
            reminders = snapshot.reminders.len(),
            "saved reminders"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reminder::ReminderDraft;
    use crate::rule::{RecurrenceRule, Repeat, Termination};
    use crate::store::{ReminderStore, StoreOptions};
    use chrono::NaiveDate;

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("nested/reminders.json"));
        assert_eq!(storage.load().unwrap(), StoreSnapshot::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("nested/reminders.json"));

        let mut store = ReminderStore::new(StoreOptions::default());
        let rule = RecurrenceRule::new(Repeat::Weekday { gap: 1 }, Termination::Count(6)).unwrap();
        store
            .add(
                ReminderDraft::new("Board meeting", NaiveDate::from_ymd_opt(2024, 2, 13).unwrap())
                    .with_repeat(rule),
            )
            .unwrap();

        storage.save(&store.snapshot()).unwrap();
        assert!(!dir.path().join("nested/reminders.json.tmp").exists());

        let loaded = storage.load().unwrap();
        assert_eq!(loaded, store.snapshot());
    }

    #[test]
    fn test_corrupt_file_is_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reminders.json");
        std::fs::write(
            &path,
            r#"{"reminders":[{"id":"a","creationDate":1,"anchor":{"year":2024,"month":0,"day":1},
                "text":"x","repeat":{"type":"day","gap":0}}]}"#,
        )
        .unwrap();

        let storage = JsonFileStorage::new(path);
        assert!(matches!(storage.load(), Err(RemindError::Serialization(_))));
    }
}
