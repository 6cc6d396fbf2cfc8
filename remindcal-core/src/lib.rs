//! Reminder recurrence engine.
//!
//! This crate holds everything the remindcal CLI (and any other front end)
//! builds on:
//! - `rule`, `occurrence` for recurrence rules and lazy occurrence generation
//! - `store` for the reminder collection, the per-day index and queries
//! - `external` and `remote` for read-only events from other calendars
//! - `storage` and `config` for persistence and settings

pub mod config;
pub mod date;
pub mod date_range;
pub mod day;
pub mod error;
pub mod external;
pub mod notify;
pub mod occurrence;
pub mod reminder;
pub mod remote;
pub mod rule;
pub mod storage;
pub mod store;
pub mod time;

// Re-export the types most callers need at crate root
pub use date::{CalendarDate, FirstWeekday};
pub use date_range::DateWindow;
pub use day::{CalendarDay, DayEntry, ForeignEntry, MonthCell, MonthGrid};
pub use error::{Bound, RemindError, RemindResult};
pub use external::{ExternalEventMerger, ForeignEvent};
pub use notify::NotifySpec;
pub use occurrence::{Occurrence, Occurrences, generate, occurs_on};
pub use reminder::{Reminder, ReminderDraft, ReminderPatch};
pub use rule::{GapUnit, RecurrenceRule, Repeat, Termination, Weekdays};
pub use store::{ReminderStore, StoreOptions, StoreSnapshot};
pub use time::{TimeFormat, TimeOfDay, TimeRange};
