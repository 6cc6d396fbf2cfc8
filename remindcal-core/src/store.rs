//! The reminder store: owns every reminder and the per-day index built from
//! their rules.
//!
//! The index is kept per month. A mutation only re-expands the reminder it
//! touched; a settings change rebuilds every indexed month before returning.

use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeMap, BinaryHeap};

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::date::{FirstWeekday, from_month_index, month_index, week_start};
use crate::date_range::DateWindow;
use crate::day::{CalendarDay, DayEntry, MonthCell, MonthGrid};
use crate::error::{RemindError, RemindResult};
use crate::external::{ExternalEventMerger, ForeignEvent};
use crate::notify::notification_time;
use crate::occurrence::{Occurrence, Occurrences, generate};
use crate::reminder::{Reminder, ReminderDraft, ReminderPatch};

/// Months kept in the day index before the farthest ones are dropped.
const MAX_INDEXED_MONTHS: usize = 36;

/// Tunables the store needs from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreOptions {
    pub first_weekday: FirstWeekday,
    /// How long a removed reminder can still be restored.
    pub undo_timeout: Duration,
    /// Lead time of "default" notifications.
    pub notify_offset: Duration,
    /// How far ahead upcoming/notification queries look, in days.
    pub horizon_days: u32,
}

impl Default for StoreOptions {
    fn default() -> Self {
        StoreOptions {
            first_weekday: FirstWeekday::Sunday,
            undo_timeout: Duration::seconds(8),
            notify_offset: Duration::minutes(10),
            horizon_days: 366,
        }
    }
}

/// A soft-deleted reminder waiting for undo or expiry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingRemoval {
    pub reminder: Reminder,
    pub expires_at: DateTime<Utc>,
}

/// Plain serialisable form of the whole collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSnapshot {
    pub reminders: Vec<Reminder>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pending_removals: Vec<PendingRemoval>,
}

#[derive(Debug)]
struct MonthIndex {
    window: DateWindow,
    version: u64,
    days: BTreeMap<NaiveDate, Vec<DayEntry>>,
}

#[derive(Debug)]
pub struct ReminderStore {
    reminders: BTreeMap<String, Reminder>,
    pending: BTreeMap<String, PendingRemoval>,
    options: StoreOptions,
    index: BTreeMap<i64, MonthIndex>,
    external: ExternalEventMerger,
    version: u64,
    last_creation_date: i64,
}

impl ReminderStore {
    pub fn new(options: StoreOptions) -> Self {
        ReminderStore {
            reminders: BTreeMap::new(),
            pending: BTreeMap::new(),
            options,
            index: BTreeMap::new(),
            external: ExternalEventMerger::new(),
            version: 0,
            last_creation_date: 0,
        }
    }

    /// Rebuild a store from its stored form. Every reminder is re-validated.
    pub fn from_snapshot(snapshot: StoreSnapshot, options: StoreOptions) -> RemindResult<Self> {
        let mut store = ReminderStore::new(options);

        for reminder in snapshot.reminders {
            reminder.validate()?;
            store.ensure_unique(&reminder.id)?;
            store.last_creation_date = store.last_creation_date.max(reminder.creation_date);
            store.reminders.insert(reminder.id.clone(), reminder);
        }
        for pending in snapshot.pending_removals {
            pending.reminder.validate()?;
            store.ensure_unique(&pending.reminder.id)?;
            store.pending.insert(pending.reminder.id.clone(), pending);
        }

        debug!(
            reminders = store.reminders.len(),
            pending = store.pending.len(),
            "loaded reminder store"
        );
        Ok(store)
    }

    /// The stored form: live reminders oldest first, then pending removals.
    pub fn snapshot(&self) -> StoreSnapshot {
        let mut reminders: Vec<Reminder> = self.reminders.values().cloned().collect();
        reminders.sort_by(|a, b| {
            a.creation_date
                .cmp(&b.creation_date)
                .then_with(|| a.id.cmp(&b.id))
        });
        StoreSnapshot {
            reminders,
            pending_removals: self.pending.values().cloned().collect(),
        }
    }

    pub fn options(&self) -> StoreOptions {
        self.options
    }

    pub fn get(&self, id: &str) -> Option<&Reminder> {
        self.reminders.get(id)
    }

    pub fn reminders(&self) -> impl Iterator<Item = &Reminder> {
        self.reminders.values()
    }

    pub fn pending_removals(&self) -> impl Iterator<Item = &PendingRemoval> {
        self.pending.values()
    }

    pub fn len(&self) -> usize {
        self.reminders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reminders.is_empty()
    }

    /// Bumped by every change to the rule set; the day index is memoised
    /// against it. Foreign events are read at query time and do not bump it.
    pub fn version(&self) -> u64 {
        self.version
    }

    // MUTATIONS:

    /// Validate and insert a new reminder, assigning its id and creation date.
    pub fn add(&mut self, draft: ReminderDraft) -> RemindResult<&Reminder> {
        let creation_date = self.next_creation_date();
        let reminder = draft.into_reminder(Uuid::new_v4().to_string(), creation_date);
        reminder.validate()?;

        let id = reminder.id.clone();
        info!(id = %id, anchor = %reminder.anchor, "adding reminder");
        self.reminders.insert(id.clone(), reminder);
        self.version += 1;
        self.index_reminder(&id);

        self.get(&id).ok_or(RemindError::NotFound(id))
    }

    /// Apply `patch` to the reminder `id`. Nothing changes if validation fails.
    pub fn edit(&mut self, id: &str, patch: ReminderPatch) -> RemindResult<&Reminder> {
        let current = self
            .reminders
            .get(id)
            .ok_or_else(|| RemindError::NotFound(id.to_string()))?;
        let patched = patch.apply(current);
        patched.validate()?;

        info!(id, "editing reminder");
        self.version += 1;
        self.unindex_reminder(id);
        self.reminders.insert(id.to_string(), patched);
        self.index_reminder(id);

        self.get(id).ok_or_else(|| RemindError::NotFound(id.to_string()))
    }

    /// Soft-delete: the reminder leaves every query but can be restored with
    /// [`undo`](Self::undo) until the undo timeout passes.
    pub fn remove(&mut self, id: &str) -> RemindResult<()> {
        self.remove_at(id, Utc::now())
    }

    pub fn remove_at(&mut self, id: &str, now: DateTime<Utc>) -> RemindResult<()> {
        let reminder = self
            .reminders
            .remove(id)
            .ok_or_else(|| RemindError::NotFound(id.to_string()))?;
        self.version += 1;
        self.unindex_reminder(id);

        let expires_at = now + self.options.undo_timeout;
        info!(id, %expires_at, "reminder marked removed");
        self.pending.insert(
            id.to_string(),
            PendingRemoval {
                reminder,
                expires_at,
            },
        );
        Ok(())
    }

    /// Restore a soft-deleted reminder. Returns false (and changes nothing
    /// visible) when there is nothing to restore or the timeout has passed.
    pub fn undo(&mut self, id: &str) -> bool {
        self.undo_at(id, Utc::now())
    }

    pub fn undo_at(&mut self, id: &str, now: DateTime<Utc>) -> bool {
        let Some(pending) = self.pending.remove(id) else {
            return false;
        };
        if pending.expires_at <= now {
            debug!(id, "undo after expiry, reminder deleted");
            return false;
        }

        info!(id, "reminder restored");
        self.reminders.insert(id.to_string(), pending.reminder);
        self.version += 1;
        self.index_reminder(id);
        true
    }

    /// Hard-delete a soft-deleted reminder now.
    pub fn confirm_removal(&mut self, id: &str) -> RemindResult<Reminder> {
        let pending = self
            .pending
            .remove(id)
            .ok_or_else(|| RemindError::NotFound(id.to_string()))?;
        info!(id, "reminder deleted");
        Ok(pending.reminder)
    }

    /// Hard-delete every soft-deleted reminder whose undo window has passed.
    pub fn purge_expired(&mut self, now: DateTime<Utc>) -> Vec<Reminder> {
        let expired: Vec<String> = self
            .pending
            .iter()
            .filter(|(_, p)| p.expires_at <= now)
            .map(|(id, _)| id.clone())
            .collect();

        let purged: Vec<Reminder> = expired
            .iter()
            .filter_map(|id| self.pending.remove(id))
            .map(|p| p.reminder)
            .collect();
        if !purged.is_empty() {
            info!(count = purged.len(), "purged expired removals");
        }
        purged
    }

    /// Change the week layout. Every indexed month is rebuilt before this
    /// returns, so no query sees a half-updated index.
    pub fn set_first_weekday(&mut self, first_weekday: FirstWeekday) {
        if self.options.first_weekday == first_weekday {
            return;
        }
        self.options.first_weekday = first_weekday;
        self.version += 1;
        self.rebuild_index();
    }

    // EXTERNAL EVENTS:

    /// Hand over a completed foreign event list for `window`.
    pub fn merge_external(
        &mut self,
        source: &str,
        window: DateWindow,
        events: Vec<ForeignEvent>,
    ) -> usize {
        self.external.merge(source, window, events)
    }

    pub fn record_external_failure(
        &mut self,
        source: &str,
        window: DateWindow,
        message: impl Into<String>,
    ) {
        self.external.record_failure(source, window, message);
    }

    /// Forget every event from `source`. Local reminders are untouched.
    pub fn disconnect_external(&mut self, source: &str) -> bool {
        self.external.disconnect(source)
    }

    pub fn external(&self) -> &ExternalEventMerger {
        &self.external
    }

    // QUERIES:

    /// Everything on `date`: local occurrences in day order, then foreign
    /// events.
    pub fn get_day(&mut self, date: NaiveDate) -> CalendarDay {
        let key = month_index(date.year(), date.month0());
        self.ensure_month(key);

        let reminders = self
            .index
            .get(&key)
            .and_then(|month| month.days.get(&date))
            .cloned()
            .unwrap_or_default();

        CalendarDay {
            date,
            reminders,
            foreign: self.external.entries_on(date),
        }
    }

    /// Whole weeks covering a month (`month0` is 0-based).
    pub fn get_month(&mut self, year: i32, month0: u32) -> RemindResult<MonthGrid> {
        let window = DateWindow::month(year, month0)?;
        let out_of_range = || {
            RemindError::validation(
                "month",
                format!("{year}-{month0} has grid days outside the supported calendar"),
            )
        };
        let mut cursor =
            week_start(window.start, self.options.first_weekday).ok_or_else(out_of_range)?;

        let mut weeks = Vec::new();
        while cursor <= window.end {
            let mut dates = [cursor; 7];
            for (offset, date) in dates.iter_mut().enumerate() {
                *date = cursor
                    .checked_add_signed(Duration::days(offset as i64))
                    .ok_or_else(out_of_range)?;
            }
            let week: [MonthCell; 7] = dates.map(|date| MonthCell {
                day: self.get_day(date),
                in_month: window.contains(date),
            });
            weeks.push(week);
            match cursor.checked_add_signed(Duration::days(7)) {
                Some(next) => cursor = next,
                None => break,
            }
        }

        Ok(MonthGrid {
            year,
            month: month0,
            weeks,
        })
    }

    /// The next `n` occurrences on or after `from`, across every reminder, in
    /// date order (ties: older reminder first).
    pub fn get_upcoming(&self, n: usize, from: NaiveDate) -> Upcoming<'_> {
        let window = DateWindow::starting_at(from, self.options.horizon_days);
        let first_weekday = self.options.first_weekday;

        let mut heap = BinaryHeap::new();
        for reminder in self.reminders.values() {
            let mut rest = generate(reminder, window, first_weekday);
            if let Some(occurrence) = rest.next() {
                heap.push(Reverse(Head {
                    occurrence,
                    reminder,
                    rest,
                }));
            }
        }

        Upcoming { heap, remaining: n }
    }

    /// Earliest notification at or after `now`.
    pub fn next_notification(&self, now: NaiveDateTime) -> Option<Notification<'_>> {
        let window = DateWindow::starting_at(now.date(), self.options.horizon_days);

        self.reminders
            .values()
            .filter(|r| r.notify.is_some())
            .filter_map(|reminder| {
                generate(reminder, window, self.options.first_weekday).find_map(|occurrence| {
                    let at = notification_time(reminder, occurrence.date, self.options.notify_offset)?;
                    (at >= now).then_some(Notification {
                        at,
                        reminder,
                        occurrence,
                    })
                })
            })
            .min_by(|a, b| {
                a.at.cmp(&b.at)
                    .then(a.reminder.creation_date.cmp(&b.reminder.creation_date))
            })
    }

    // INDEX:

    fn ensure_month(&mut self, key: i64) {
        let fresh = self
            .index
            .get(&key)
            .is_some_and(|month| month.version == self.version);
        if fresh {
            return;
        }

        let Some(window) = month_window(key) else {
            return;
        };
        let month = build_month(&self.reminders, window, self.options.first_weekday, self.version);
        self.index.insert(key, month);
        self.evict_far_months(key);
    }

    fn rebuild_index(&mut self) {
        let keys: Vec<i64> = self.index.keys().copied().collect();
        for key in &keys {
            if let Some(window) = month_window(*key) {
                let month = build_month(&self.reminders, window, self.options.first_weekday, self.version);
                self.index.insert(*key, month);
            }
        }
        debug!(months = keys.len(), "rebuilt day index");
    }

    fn index_reminder(&mut self, id: &str) {
        let Some(reminder) = self.reminders.get(id) else {
            return;
        };
        for month in self.index.values_mut() {
            for occurrence in generate(reminder, month.window, self.options.first_weekday) {
                let day = month.days.entry(occurrence.date).or_default();
                day.push(DayEntry {
                    reminder_id: id.to_string(),
                    occurrence_index: occurrence.index,
                });
                sort_day(day, &self.reminders);
            }
            month.version = self.version;
        }
    }

    fn unindex_reminder(&mut self, id: &str) {
        for month in self.index.values_mut() {
            month.days.retain(|_, entries| {
                entries.retain(|entry| entry.reminder_id != id);
                !entries.is_empty()
            });
            month.version = self.version;
        }
    }

    fn evict_far_months(&mut self, around: i64) {
        while self.index.len() > MAX_INDEXED_MONTHS {
            let farthest = self
                .index
                .keys()
                .copied()
                .max_by_key(|key| (key - around).abs());
            match farthest {
                Some(key) => {
                    self.index.remove(&key);
                }
                None => break,
            }
        }
    }

    fn ensure_unique(&self, id: &str) -> RemindResult<()> {
        if self.reminders.contains_key(id) || self.pending.contains_key(id) {
            return Err(RemindError::validation("id", format!("duplicate reminder id {id}")));
        }
        Ok(())
    }

    /// Epoch milliseconds, strictly increasing within this store so creation
    /// order is always a usable tie-breaker.
    fn next_creation_date(&mut self) -> i64 {
        let now = Utc::now().timestamp_millis();
        self.last_creation_date = now.max(self.last_creation_date + 1);
        self.last_creation_date
    }
}

fn month_window(key: i64) -> Option<DateWindow> {
    let (year, month0) = from_month_index(key)?;
    DateWindow::month(year, month0).ok()
}

fn build_month(
    reminders: &BTreeMap<String, Reminder>,
    window: DateWindow,
    first_weekday: FirstWeekday,
    version: u64,
) -> MonthIndex {
    let mut days: BTreeMap<NaiveDate, Vec<DayEntry>> = BTreeMap::new();
    for reminder in reminders.values() {
        for occurrence in generate(reminder, window, first_weekday) {
            days.entry(occurrence.date).or_default().push(DayEntry {
                reminder_id: reminder.id.clone(),
                occurrence_index: occurrence.index,
            });
        }
    }
    for day in days.values_mut() {
        sort_day(day, reminders);
    }
    MonthIndex {
        window,
        version,
        days,
    }
}

fn sort_day(entries: &mut [DayEntry], reminders: &BTreeMap<String, Reminder>) {
    entries.sort_by(|a, b| match (reminders.get(&a.reminder_id), reminders.get(&b.reminder_id)) {
        (Some(ra), Some(rb)) => ra.day_order(rb),
        _ => a.reminder_id.cmp(&b.reminder_id),
    });
}

/// A notification due for one occurrence.
#[derive(Debug, Clone, Copy)]
pub struct Notification<'a> {
    pub at: NaiveDateTime,
    pub reminder: &'a Reminder,
    pub occurrence: Occurrence,
}

/// One item of [`ReminderStore::get_upcoming`].
#[derive(Debug, Clone, Copy)]
pub struct UpcomingItem<'a> {
    pub reminder: &'a Reminder,
    pub occurrence: Occurrence,
}

/// Lazy k-way merge of every reminder's occurrences.
pub struct Upcoming<'a> {
    heap: BinaryHeap<Reverse<Head<'a>>>,
    remaining: usize,
}

struct Head<'a> {
    occurrence: Occurrence,
    reminder: &'a Reminder,
    rest: Occurrences,
}

impl Head<'_> {
    fn key(&self) -> (NaiveDate, i64, &str, u32) {
        (
            self.occurrence.date,
            self.reminder.creation_date,
            self.reminder.id.as_str(),
            self.occurrence.index,
        )
    }
}

impl PartialEq for Head<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Head<'_> {}

impl PartialOrd for Head<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Head<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl<'a> Iterator for Upcoming<'a> {
    type Item = UpcomingItem<'a>;

    fn next(&mut self) -> Option<UpcomingItem<'a>> {
        if self.remaining == 0 {
            return None;
        }
        let Reverse(mut head) = self.heap.pop()?;
        let item = UpcomingItem {
            reminder: head.reminder,
            occurrence: head.occurrence,
        };

        if let Some(next) = head.rest.next() {
            head.occurrence = next;
            self.heap.push(Reverse(head));
        }
        self.remaining -= 1;
        Some(item)
    }
}
