//! One CLI run: config, the reminder store and where it is saved.

use anyhow::Result;
use chrono::Utc;
use remindcal_core::config::RemindConfig;
use remindcal_core::date_range::DateWindow;
use remindcal_core::remote::provider::Provider;
use remindcal_core::remote::{Remote, refresh_external};
use remindcal_core::storage::{JsonFileStorage, ReminderStorage};
use remindcal_core::store::ReminderStore;
use tracing::debug;

pub struct Session {
    pub config: RemindConfig,
    pub store: ReminderStore,
    storage: JsonFileStorage,
}

impl Session {
    /// Load config and reminders, dropping removals whose undo window passed.
    pub fn open() -> Result<Self> {
        let config = RemindConfig::load()?;
        let storage = JsonFileStorage::new(config.store_path());
        let snapshot = storage.load()?;
        let mut store = ReminderStore::from_snapshot(snapshot, config.store_options())?;

        for reminder in store.purge_expired(Utc::now()) {
            debug!(id = %reminder.id, "removal is final");
        }

        Ok(Session {
            config,
            store,
            storage,
        })
    }

    pub fn save(&self) -> Result<()> {
        self.storage.save(&self.store.snapshot())?;
        Ok(())
    }

    /// Full id of the live reminder starting with `prefix`.
    pub fn resolve_id(&self, prefix: &str) -> Result<String> {
        resolve(prefix, self.store.reminders().map(|r| r.id.as_str()))
    }

    /// Full id of the removed (still restorable) reminder starting with `prefix`.
    pub fn resolve_removed_id(&self, prefix: &str) -> Result<String> {
        resolve(
            prefix,
            self.store.pending_removals().map(|p| p.reminder.id.as_str()),
        )
    }

    pub fn remote(&self, provider: &str) -> Result<Remote> {
        let Some(config) = self.config.remotes.get(provider) else {
            let available: Vec<&str> = self.config.remotes.keys().map(String::as_str).collect();
            if available.is_empty() {
                anyhow::bail!(
                    "No remotes configured.\n\
                    Add a [remotes.{}] table to {}",
                    provider,
                    RemindConfig::config_path()?.display()
                );
            }
            anyhow::bail!(
                "Remote '{}' not found. Available: {}",
                provider,
                available.join(", ")
            );
        };
        Ok(Remote::new(Provider::from_name(provider), config.clone()))
    }

    /// Refresh every configured remote for `window`. Returns the failures as
    /// `(provider, message)` pairs.
    pub async fn refresh_remotes(&mut self, window: DateWindow) -> Vec<(String, String)> {
        let remotes: Vec<Remote> = self
            .config
            .remotes
            .iter()
            .map(|(name, config)| Remote::new(Provider::from_name(name), config.clone()))
            .collect();

        let mut failures = Vec::new();
        for remote in &remotes {
            if let Some(message) = refresh_external(&mut self.store, remote, window).await {
                failures.push((remote.provider.name().to_string(), message));
            }
        }
        failures
    }
}

fn resolve<'a>(prefix: &str, ids: impl Iterator<Item = &'a str>) -> Result<String> {
    let matches: Vec<&str> = ids.filter(|id| id.starts_with(prefix)).collect();
    match matches.as_slice() {
        [id] => Ok(id.to_string()),
        [] => Err(remindcal_core::RemindError::NotFound(prefix.to_string()).into()),
        _ => anyhow::bail!(
            "Id '{}' is ambiguous ({} reminders match), use more characters",
            prefix,
            matches.len()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_prefix() {
        let ids = ["3f2a-1", "3f9c-2", "a001-3"];
        assert_eq!(resolve("a0", ids.into_iter()).unwrap(), "a001-3");
        assert_eq!(resolve("3f2", ids.into_iter()).unwrap(), "3f2a-1");
        assert!(resolve("3f", ids.into_iter()).is_err());
        assert!(resolve("zz", ids.into_iter()).is_err());
    }
}
