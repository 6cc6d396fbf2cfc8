//! Inclusive date windows for occurrence queries.

use chrono::{Duration, NaiveDate};

use crate::date::{days_in_month, first_of_month};
use crate::error::{RemindError, RemindResult};

/// Inclusive `[start, end]` window of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> RemindResult<Self> {
        if end < start {
            return Err(RemindError::validation(
                "window",
                format!("end {end} is before start {start}"),
            ));
        }
        Ok(DateWindow { start, end })
    }

    pub fn day(date: NaiveDate) -> Self {
        DateWindow {
            start: date,
            end: date,
        }
    }

    /// The whole of a month (`month0` is 0-based).
    pub fn month(year: i32, month0: u32) -> RemindResult<Self> {
        let invalid = || RemindError::validation("month", format!("{year}-{month0} is not a month"));
        let start = first_of_month(year, month0).ok_or_else(invalid)?;
        let len = days_in_month(year, month0).ok_or_else(invalid)?;
        Ok(DateWindow {
            start,
            end: start + Duration::days(len as i64 - 1),
        })
    }

    /// `days` days starting at `start` (inclusive of `start`), cut short at
    /// the end of the supported calendar.
    pub fn starting_at(start: NaiveDate, days: u32) -> Self {
        let end = start
            .checked_add_signed(Duration::days(days.max(1) as i64 - 1))
            .unwrap_or(NaiveDate::MAX);
        DateWindow { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Parse `YYYY-MM-DD` bounds, as typed on the command line.
    pub fn from_args(from: &str, to: &str) -> RemindResult<Self> {
        Self::new(parse_date(from)?, parse_date(to)?)
    }
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(s: &str) -> RemindResult<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| {
        RemindError::validation("date", format!("'{s}' is not a date, expected YYYY-MM-DD"))
    })
}
