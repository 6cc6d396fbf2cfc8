//! Calendar date helpers and the stored `{year, month, day}` form.

use std::fmt;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// A local calendar date as stored on disk. `month` is 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl CalendarDate {
    pub fn to_naive(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month.checked_add(1)?, self.day)
    }
}

impl From<NaiveDate> for CalendarDate {
    fn from(date: NaiveDate) -> Self {
        CalendarDate {
            year: date.year(),
            month: date.month0(),
            day: date.day(),
        }
    }
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}-{:02}-{:02}", self.year, self.month + 1, self.day)
    }
}

/// Serde adapter that stores a `NaiveDate` as a [`CalendarDate`].
pub mod calendar_date {
    use chrono::NaiveDate;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::CalendarDate;

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        CalendarDate::from(*date).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = CalendarDate::deserialize(deserializer)?;
        raw.to_naive()
            .ok_or_else(|| D::Error::custom(format!("invalid calendar date {raw}")))
    }
}

/// First day of the week, as chosen in the user's settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum FirstWeekday {
    #[default]
    Sunday,
    Monday,
}

impl FirstWeekday {
    pub fn weekday(self) -> Weekday {
        match self {
            FirstWeekday::Sunday => Weekday::Sun,
            FirstWeekday::Monday => Weekday::Mon,
        }
    }

    /// Absolute weekday number (Sun=0..Sat=6) of the column `index` in a week
    /// laid out starting at this weekday.
    pub fn absolute(self, index: usize) -> usize {
        (index + u8::from(self) as usize) % 7
    }

    /// Column of `weekday` in a week laid out starting at this weekday.
    pub fn column(self, weekday: Weekday) -> i64 {
        let days = weekday.num_days_from_sunday() as i64 - u8::from(self) as i64;
        days.rem_euclid(7)
    }
}

impl TryFrom<u8> for FirstWeekday {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(FirstWeekday::Sunday),
            1 => Ok(FirstWeekday::Monday),
            other => Err(format!("first weekday must be 0 or 1, got {other}")),
        }
    }
}

impl From<FirstWeekday> for u8 {
    fn from(value: FirstWeekday) -> Self {
        match value {
            FirstWeekday::Sunday => 0,
            FirstWeekday::Monday => 1,
        }
    }
}

/// Start of the week containing `date`; `None` when it falls before
/// `NaiveDate::MIN`.
pub fn week_start(date: NaiveDate, first: FirstWeekday) -> Option<NaiveDate> {
    date.checked_sub_signed(Duration::days(first.column(date.weekday())))
}

/// Months since year 0 for the given year and 0-based month.
pub fn month_index(year: i32, month0: u32) -> i64 {
    year as i64 * 12 + month0 as i64
}

/// Inverse of [`month_index`]: `(year, 0-based month)`.
pub fn from_month_index(index: i64) -> Option<(i32, u32)> {
    let year = i32::try_from(index.div_euclid(12)).ok()?;
    Some((year, index.rem_euclid(12) as u32))
}

pub fn first_of_month(year: i32, month0: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month0 + 1, 1)
}

/// Works for the last supported month too, which has no following month.
pub fn days_in_month(year: i32, month0: u32) -> Option<u32> {
    first_of_month(year, month0)?;
    Some(match month0 {
        1 if NaiveDate::from_ymd_opt(year, 2, 29).is_some() => 29,
        1 => 28,
        3 | 5 | 8 | 10 => 30,
        _ => 31,
    })
}

/// Which occurrence (1..=5) of its weekday `date` is within its month.
pub fn weekday_ordinal(date: NaiveDate) -> u8 {
    ((date.day() - 1) / 7 + 1) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calendar_date_uses_zero_based_month() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let stored = CalendarDate::from(date);
        assert_eq!(stored.month, 0);
        assert_eq!(stored.to_naive(), Some(date));
        assert_eq!(stored.to_string(), "2024-01-31");
    }

    #[test]
    fn test_invalid_calendar_date_rejected() {
        let json = r#"{"year":2024,"month":1,"day":30}"#;
        let mut de = serde_json::Deserializer::from_str(json);
        assert!(calendar_date::deserialize(&mut de).is_err());
    }

    #[test]
    fn test_week_start_respects_first_weekday() {
        // 2024-05-15 is a Wednesday
        let wed = NaiveDate::from_ymd_opt(2024, 5, 15).unwrap();
        assert_eq!(
            week_start(wed, FirstWeekday::Sunday),
            NaiveDate::from_ymd_opt(2024, 5, 12)
        );
        assert_eq!(
            week_start(wed, FirstWeekday::Monday),
            NaiveDate::from_ymd_opt(2024, 5, 13)
        );
        let sun = NaiveDate::from_ymd_opt(2024, 5, 19).unwrap();
        assert_eq!(
            week_start(sun, FirstWeekday::Monday),
            NaiveDate::from_ymd_opt(2024, 5, 13)
        );

        // Nothing exists before the first representable day
        let min = NaiveDate::MIN;
        match week_start(min, FirstWeekday::Monday) {
            Some(start) => assert_eq!(start, min),
            None => assert_ne!(min.weekday(), Weekday::Mon),
        }
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(2024, 1), Some(29));
        assert_eq!(days_in_month(2023, 1), Some(28));
        assert_eq!(days_in_month(2024, 11), Some(31));
        assert_eq!(days_in_month(2024, 3), Some(30));
        assert_eq!(days_in_month(NaiveDate::MAX.year(), 11), Some(31));
        assert_eq!(days_in_month(2024, 12), None);
    }

    #[test]
    fn test_month_index_roundtrip_across_years() {
        let idx = month_index(2024, 11) + 1;
        assert_eq!(from_month_index(idx), Some((2025, 0)));
    }

    #[test]
    fn test_weekday_ordinal() {
        let third_tuesday = NaiveDate::from_ymd_opt(2024, 5, 21).unwrap();
        assert_eq!(weekday_ordinal(third_tuesday), 3);
        let fifth = NaiveDate::from_ymd_opt(2024, 5, 29).unwrap();
        assert_eq!(weekday_ordinal(fifth), 5);
    }
}
