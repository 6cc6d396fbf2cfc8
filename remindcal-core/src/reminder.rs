//! User-authored reminders and the inputs that create or change them.

use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::date::calendar_date;
use crate::error::{RemindError, RemindResult};
use crate::notify::NotifySpec;
use crate::rule::RecurrenceRule;
use crate::time::TimeRange;

/// One repeatable reminder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    pub id: String,
    /// Epoch milliseconds.
    pub creation_date: i64,
    /// Date of the first occurrence, in the local calendar.
    #[serde(with = "calendar_date")]
    pub anchor: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<TimeRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat: Option<RecurrenceRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notify: Option<NotifySpec>,
    #[serde(default)]
    pub color: String,
    pub text: String,
    #[serde(default)]
    pub description: String,
}

impl Reminder {
    /// Checks that need the whole reminder, not just one field.
    pub fn validate(&self) -> RemindResult<()> {
        if let Some(end) = self.repeat.as_ref().and_then(RecurrenceRule::end_date) {
            if end < self.anchor {
                return Err(RemindError::validation(
                    "endDate",
                    format!("{end} is before the first occurrence {}", self.anchor),
                ));
            }
        }
        Ok(())
    }

    /// Order of reminders within one day: all-day first, then by start time,
    /// then oldest first.
    pub fn day_order(&self, other: &Reminder) -> Ordering {
        let start = |r: &Reminder| r.range.map(|range| range.from());
        start(self)
            .cmp(&start(other))
            .then(self.creation_date.cmp(&other.creation_date))
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// Everything needed to create a reminder; id and creation date are assigned
/// by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct ReminderDraft {
    pub anchor: NaiveDate,
    pub range: Option<TimeRange>,
    pub repeat: Option<RecurrenceRule>,
    pub notify: Option<NotifySpec>,
    pub color: String,
    pub text: String,
    pub description: String,
}

impl ReminderDraft {
    pub fn new(text: impl Into<String>, anchor: NaiveDate) -> Self {
        ReminderDraft {
            anchor,
            range: None,
            repeat: None,
            notify: None,
            color: String::new(),
            text: text.into(),
            description: String::new(),
        }
    }

    pub fn with_range(mut self, range: TimeRange) -> Self {
        self.range = Some(range);
        self
    }

    pub fn with_repeat(mut self, rule: RecurrenceRule) -> Self {
        self.repeat = Some(rule);
        self
    }

    pub fn with_notify(mut self, notify: NotifySpec) -> Self {
        self.notify = Some(notify);
        self
    }

    pub(crate) fn into_reminder(self, id: String, creation_date: i64) -> Reminder {
        Reminder {
            id,
            creation_date,
            anchor: self.anchor,
            range: self.range,
            repeat: self.repeat,
            notify: self.notify,
            color: self.color,
            text: self.text,
            description: self.description,
        }
    }
}

/// Partial update. `None` leaves a field alone; for optional fields
/// `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReminderPatch {
    pub anchor: Option<NaiveDate>,
    pub range: Option<Option<TimeRange>>,
    pub repeat: Option<Option<RecurrenceRule>>,
    pub notify: Option<Option<NotifySpec>>,
    pub color: Option<String>,
    pub text: Option<String>,
    pub description: Option<String>,
}

impl ReminderPatch {
    pub fn is_empty(&self) -> bool {
        *self == ReminderPatch::default()
    }

    /// The patched copy of `reminder`; identity fields are kept.
    pub fn apply(self, reminder: &Reminder) -> Reminder {
        Reminder {
            id: reminder.id.clone(),
            creation_date: reminder.creation_date,
            anchor: self.anchor.unwrap_or(reminder.anchor),
            range: self.range.unwrap_or(reminder.range),
            repeat: self.repeat.unwrap_or_else(|| reminder.repeat.clone()),
            notify: self.notify.unwrap_or(reminder.notify),
            color: self.color.unwrap_or_else(|| reminder.color.clone()),
            text: self.text.unwrap_or_else(|| reminder.text.clone()),
            description: self
                .description
                .unwrap_or_else(|| reminder.description.clone()),
        }
    }
}
