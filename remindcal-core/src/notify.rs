//! Notification timing.
//!
//! Only the instant is computed here; delivery belongs to the caller.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::reminder::Reminder;
use crate::time::TimeOfDay;

/// How a reminder wants to be notified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NotifySpec {
    /// A fixed lead before the reminder starts.
    Default,
    /// At an absolute time on the occurrence day.
    Time { time: TimeOfDay },
}

/// Local instant at which the occurrence of `reminder` on `date` should fire.
///
/// `Default` fires `offset` before the range start, or before midnight of the
/// occurrence day for all-day reminders.
pub fn notification_time(
    reminder: &Reminder,
    date: NaiveDate,
    offset: Duration,
) -> Option<NaiveDateTime> {
    match reminder.notify? {
        NotifySpec::Time { time } => Some(date.and_time(time.to_naive())),
        NotifySpec::Default => {
            let start = reminder
                .range
                .map(|range| range.from().to_naive())
                .unwrap_or(NaiveTime::MIN);
            date.and_time(start).checked_sub_signed(offset)
        }
    }
}
