//! Derived per-day and per-month views.

use chrono::NaiveDate;

use crate::external::ForeignEvent;

/// One local reminder occurrence on a day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayEntry {
    pub reminder_id: String,
    pub occurrence_index: u32,
}

/// One foreign event on a day, with the source it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct ForeignEntry {
    pub source: String,
    pub event: ForeignEvent,
}

impl ForeignEntry {
    pub fn can_edit(&self) -> bool {
        self.event.editable
    }

    pub fn can_delete(&self) -> bool {
        self.event.deletable
    }
}

/// Everything that happens on one date. Rebuilt from the rules, never edited.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub reminders: Vec<DayEntry>,
    pub foreign: Vec<ForeignEntry>,
}

impl CalendarDay {
    pub fn is_empty(&self) -> bool {
        self.reminders.is_empty() && self.foreign.is_empty()
    }

    pub fn len(&self) -> usize {
        self.reminders.len() + self.foreign.len()
    }
}

/// A cell of the month grid.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthCell {
    pub day: CalendarDay,
    /// False for the leading/trailing days borrowed from adjacent months.
    pub in_month: bool,
}

/// Weeks covering a month, aligned to the first weekday.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthGrid {
    pub year: i32,
    /// 0-based.
    pub month: u32,
    pub weeks: Vec<[MonthCell; 7]>,
}
