pub mod protocol;
pub mod provider;

use std::collections::HashMap;
use std::future::Future;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::date_range::DateWindow;
use crate::error::RemindResult;
use crate::external::ForeignEvent;
use crate::remote::protocol::{Connect, Disconnect, ListEvents, SignOut};
use crate::remote::provider::Provider;
use crate::store::ReminderStore;

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct RemoteConfig(pub HashMap<String, toml::Value>);

impl From<&RemoteConfig> for serde_json::Map<String, serde_json::Value> {
    fn from(config: &RemoteConfig) -> Self {
        config
            .0
            .iter()
            .filter_map(|(k, v)| serde_json::to_value(v).ok().map(|v| (k.clone(), v)))
            .collect()
    }
}

/// Anything that can list foreign events for a window.
pub trait EventSource {
    /// Key the events are merged under.
    fn name(&self) -> &str;

    fn list_events(
        &self,
        window: DateWindow,
    ) -> impl Future<Output = RemindResult<Vec<ForeignEvent>>> + Send;
}

/// An external calendar served by a provider binary.
#[derive(Debug, Clone)]
pub struct Remote {
    pub provider: Provider,
    pub config: RemoteConfig,
}

impl Remote {
    pub fn new(provider: Provider, config: RemoteConfig) -> Self {
        Remote { provider, config }
    }

    fn remote_config(&self) -> serde_json::Map<String, serde_json::Value> {
        serde_json::Map::from(&self.config)
    }

    /// The `{provider}_account` field, for providers that have accounts.
    pub fn account_identifier(&self) -> Option<&str> {
        let key = format!("{}_account", self.provider.name());
        self.config.0.get(&key).and_then(|v| v.as_str())
    }

    pub async fn connect(&self) -> RemindResult<String> {
        self.provider
            .call_interactive(Connect {
                remote_config: self.remote_config(),
            })
            .await
    }

    pub async fn disconnect(&self) -> RemindResult<()> {
        self.provider
            .call(Disconnect {
                remote_config: self.remote_config(),
            })
            .await
    }

    pub async fn sign_out(&self) -> RemindResult<()> {
        self.provider
            .call(SignOut {
                remote_config: self.remote_config(),
            })
            .await
    }
}

impl EventSource for Remote {
    fn name(&self) -> &str {
        self.provider.name()
    }

    async fn list_events(&self, window: DateWindow) -> RemindResult<Vec<ForeignEvent>> {
        self.provider
            .call(ListEvents {
                remote_config: self.remote_config(),
                from: window.start.format("%Y-%m-%d").to_string(),
                to: window.end.format("%Y-%m-%d").to_string(),
            })
            .await
    }
}

/// Fetch `window` from `source` and fold the result into `store`.
///
/// The store is only touched once the fetch has completed. On failure the
/// source contributes no events inside `window` and the message is returned;
/// local reminders are never affected.
pub async fn refresh_external<S: EventSource>(
    store: &mut ReminderStore,
    source: &S,
    window: DateWindow,
) -> Option<String> {
    match source.list_events(window).await {
        Ok(events) => {
            let kept = store.merge_external(source.name(), window, events);
            info!(source = source.name(), kept, "refreshed external events");
            None
        }
        Err(e) => {
            let message = e.to_string();
            store.record_external_failure(source.name(), window, message.clone());
            Some(message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RemindError;
    use crate::reminder::ReminderDraft;
    use crate::store::StoreOptions;
    use chrono::NaiveDate;

    struct StaticSource {
        name: &'static str,
        events: Vec<ForeignEvent>,
        fail: bool,
    }

    impl EventSource for StaticSource {
        fn name(&self) -> &str {
            self.name
        }

        async fn list_events(&self, _window: DateWindow) -> RemindResult<Vec<ForeignEvent>> {
            if self.fail {
                return Err(RemindError::Provider("network unreachable".into()));
            }
            Ok(self.events.clone())
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn event(id: &str, on: NaiveDate) -> ForeignEvent {
        ForeignEvent {
            id: id.to_string(),
            title: format!("Event {id}"),
            date: on,
            range: None,
            color: None,
            editable: false,
            deletable: false,
            recurring_event_id: None,
        }
    }

    #[tokio::test]
    async fn test_refresh_merges_into_days() {
        let mut store = ReminderStore::new(StoreOptions::default());
        store
            .add(ReminderDraft::new("Water plants", date(2024, 3, 4)))
            .unwrap();

        let source = StaticSource {
            name: "work",
            events: vec![event("e1", date(2024, 3, 4)), event("e2", date(2024, 3, 9))],
            fail: false,
        };
        let window = DateWindow::month(2024, 2).unwrap();
        assert_eq!(refresh_external(&mut store, &source, window).await, None);

        let day = store.get_day(date(2024, 3, 4));
        assert_eq!(day.reminders.len(), 1);
        assert_eq!(day.foreign.len(), 1);
        assert_eq!(day.foreign[0].source, "work");
        assert!(store.external().is_connected("work"));
    }

    #[tokio::test]
    async fn test_failed_refresh_clears_window() {
        let mut store = ReminderStore::new(StoreOptions::default());
        store
            .add(ReminderDraft::new("Water plants", date(2024, 3, 4)))
            .unwrap();
        let window = DateWindow::month(2024, 2).unwrap();

        let ok = StaticSource {
            name: "work",
            events: vec![event("e1", date(2024, 3, 4))],
            fail: false,
        };
        refresh_external(&mut store, &ok, window).await;

        let broken = StaticSource {
            name: "work",
            events: Vec::new(),
            fail: true,
        };
        let message = refresh_external(&mut store, &broken, window).await;
        assert!(message.unwrap().contains("network unreachable"));
        assert!(store.external().last_error("work").is_some());
        let day = store.get_day(date(2024, 3, 4));
        assert!(day.foreign.is_empty());
        assert_eq!(day.reminders.len(), 1);
    }

    #[test]
    fn test_account_identifier() {
        let mut values = HashMap::new();
        values.insert(
            "google_account".to_string(),
            toml::Value::String("me@example.com".into()),
        );
        let remote = Remote::new(Provider::from_name("google"), RemoteConfig(values));
        assert_eq!(remote.account_identifier(), Some("me@example.com"));
        assert_eq!(
            serde_json::Map::from(&remote.config)["google_account"],
            "me@example.com"
        );
    }
}
