//! Foreign (externally sourced) events.
//!
//! Sources hand over events already expanded to concrete dates; whatever
//! recurrence they had is opaque here. The merger never awaits: callers fetch,
//! then pass the completed list in.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::date::calendar_date;
use crate::date_range::DateWindow;
use crate::day::ForeignEntry;
use crate::time::TimeRange;

/// A read-only event from an external calendar, resolved to one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForeignEvent {
    pub id: String,
    pub title: String,
    #[serde(with = "calendar_date")]
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<TimeRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default)]
    pub editable: bool,
    #[serde(default)]
    pub deletable: bool,
    /// Id of the source's recurring series, when the event is one instance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurring_event_id: Option<String>,
}

#[derive(Debug, Default)]
struct SourceEvents {
    by_date: BTreeMap<NaiveDate, Vec<ForeignEvent>>,
    last_error: Option<String>,
}

/// Folds foreign events from any number of sources into day entries.
#[derive(Debug, Default)]
pub struct ExternalEventMerger {
    sources: BTreeMap<String, SourceEvents>,
}

impl ExternalEventMerger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace everything `source` had inside `window` with `events`.
    ///
    /// Events dated outside the window are dropped. Returns how many were kept.
    pub fn merge(&mut self, source: &str, window: DateWindow, events: Vec<ForeignEvent>) -> usize {
        let entry = self.sources.entry(source.to_string()).or_default();
        entry.last_error = None;
        clear_window(&mut entry.by_date, window);

        let mut kept = 0;
        for event in events {
            if !window.contains(event.date) {
                debug!(source, event = %event.id, date = %event.date, "dropping foreign event outside window");
                continue;
            }
            entry.by_date.entry(event.date).or_default().push(event);
            kept += 1;
        }
        for day in entry.by_date.values_mut() {
            day.sort_by(|a, b| {
                let start = |e: &ForeignEvent| e.range.map(|r| r.from());
                start(a).cmp(&start(b)).then_with(|| a.id.cmp(&b.id))
            });
        }

        debug!(source, kept, "merged foreign events");
        kept
    }

    /// A fetch for `window` failed: the source contributes nothing there and
    /// the message is kept for the caller to show.
    pub fn record_failure(&mut self, source: &str, window: DateWindow, message: impl Into<String>) {
        let message = message.into();
        warn!(source, %message, "external calendar fetch failed");
        let entry = self.sources.entry(source.to_string()).or_default();
        clear_window(&mut entry.by_date, window);
        entry.last_error = Some(message);
    }

    /// Drop every event of `source` (sign-out or disconnect).
    pub fn disconnect(&mut self, source: &str) -> bool {
        let removed = self.sources.remove(source).is_some();
        if removed {
            info!(source, "external calendar disconnected");
        }
        removed
    }

    pub fn is_connected(&self, source: &str) -> bool {
        self.sources.contains_key(source)
    }

    pub fn last_error(&self, source: &str) -> Option<&str> {
        self.sources.get(source)?.last_error.as_deref()
    }

    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.sources.keys().map(String::as_str)
    }

    /// Foreign entries on `date`, grouped by source name.
    pub fn entries_on(&self, date: NaiveDate) -> Vec<ForeignEntry> {
        self.sources
            .iter()
            .filter_map(|(source, events)| Some((source, events.by_date.get(&date)?)))
            .flat_map(|(source, events)| {
                events.iter().map(move |event| ForeignEntry {
                    source: source.clone(),
                    event: event.clone(),
                })
            })
            .collect()
    }
}

fn clear_window(by_date: &mut BTreeMap<NaiveDate, Vec<ForeignEvent>>, window: DateWindow) {
    let stale: Vec<NaiveDate> = by_date.range(window.start..=window.end).map(|(d, _)| *d).collect();
    for date in stale {
        by_date.remove(&date);
    }
}
