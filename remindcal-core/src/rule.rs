//! Repeat rules: how a reminder recurs and when it stops.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::date::{CalendarDate, FirstWeekday};
use crate::error::{RemindError, RemindResult};

/// Unit of a custom stride.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GapUnit {
    Days,
    Weeks,
    Months,
}

/// Weekday flags of a weekly rule.
///
/// `dynamic` is indexed by column in the user's week layout (column 0 is the
/// configured first weekday); `fixed` is absolute, Sunday = 0. When `dynamic`
/// is present it wins and is remapped against the current first weekday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Weekdays {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dynamic: Option<[bool; 7]>,
    #[serde(rename = "static")]
    pub fixed: [bool; 7],
}

impl Weekdays {
    pub fn fixed(days: [bool; 7]) -> Self {
        Weekdays {
            dynamic: None,
            fixed: days,
        }
    }

    /// Column-relative flags; `fixed` is filled in for the given layout.
    pub fn dynamic(columns: [bool; 7], first: FirstWeekday) -> Self {
        let mut weekdays = Weekdays {
            dynamic: Some(columns),
            fixed: [false; 7],
        };
        weekdays.fixed = weekdays.resolve(first);
        weekdays
    }

    /// Absolute flags, Sunday = 0.
    pub fn resolve(&self, first: FirstWeekday) -> [bool; 7] {
        let Some(columns) = self.dynamic else {
            return self.fixed;
        };
        let mut absolute = [false; 7];
        for (column, on) in columns.iter().enumerate() {
            if *on {
                absolute[first.absolute(column)] = true;
            }
        }
        absolute
    }

    fn is_empty(&self) -> bool {
        match self.dynamic {
            Some(columns) => !columns.contains(&true),
            None => !self.fixed.contains(&true),
        }
    }
}

/// The repeat pattern of a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Repeat {
    /// Every `gap` days.
    Day { gap: u32 },
    /// Every `gap` weeks on the flagged weekdays.
    Week { gap: u32, weekdays: Weekdays },
    /// Every `gap` months on the anchor's day of month.
    Month { gap: u32 },
    /// Every `gap` months on the anchor's "Nth weekday of the month".
    Weekday { gap: u32 },
    /// Every `gap` units.
    Custom {
        gap: u32,
        #[serde(rename = "gapUnit")]
        unit: GapUnit,
    },
}

impl Repeat {
    pub fn gap(&self) -> u32 {
        match self {
            Repeat::Day { gap }
            | Repeat::Week { gap, .. }
            | Repeat::Month { gap }
            | Repeat::Weekday { gap }
            | Repeat::Custom { gap, .. } => *gap,
        }
    }
}

/// When a rule stops producing occurrences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Termination {
    #[default]
    Never,
    /// Total number of occurrences, the anchor included.
    Count(u32),
    /// Last date an occurrence may fall on.
    Until(NaiveDate),
}

impl Termination {
    /// Build from the two optional stored fields, which are mutually exclusive.
    pub fn from_fields(count: Option<u32>, end_date: Option<NaiveDate>) -> RemindResult<Self> {
        match (count, end_date) {
            (Some(_), Some(_)) => Err(RemindError::TerminationConflict),
            (Some(count), None) => Ok(Termination::Count(count)),
            (None, Some(date)) => Ok(Termination::Until(date)),
            (None, None) => Ok(Termination::Never),
        }
    }
}

/// A validated repeat rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRule", into = "RawRule")]
pub struct RecurrenceRule {
    repeat: Repeat,
    termination: Termination,
}

impl RecurrenceRule {
    pub fn new(repeat: Repeat, termination: Termination) -> RemindResult<Self> {
        if repeat.gap() == 0 {
            return Err(RemindError::validation("gap", "must be at least 1"));
        }
        if let Repeat::Week { weekdays, .. } = &repeat {
            if weekdays.is_empty() {
                return Err(RemindError::validation(
                    "weekdays",
                    "at least one weekday must be selected",
                ));
            }
        }
        if termination == Termination::Count(0) {
            return Err(RemindError::validation("count", "must be at least 1"));
        }
        Ok(RecurrenceRule {
            repeat,
            termination,
        })
    }

    /// Build from the stored optional termination fields.
    pub fn with_fields(
        repeat: Repeat,
        count: Option<u32>,
        end_date: Option<NaiveDate>,
    ) -> RemindResult<Self> {
        Self::new(repeat, Termination::from_fields(count, end_date)?)
    }

    pub fn repeat(&self) -> &Repeat {
        &self.repeat
    }

    pub fn termination(&self) -> Termination {
        self.termination
    }

    pub fn count(&self) -> Option<u32> {
        match self.termination {
            Termination::Count(count) => Some(count),
            _ => None,
        }
    }

    pub fn end_date(&self) -> Option<NaiveDate> {
        match self.termination {
            Termination::Until(date) => Some(date),
            _ => None,
        }
    }

    /// Whether the rule ever stops on its own.
    pub fn is_bounded(&self) -> bool {
        self.termination != Termination::Never
    }
}

/// Stored shape: the variant tag and its fields, with optional `count` and
/// `endDate` alongside.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRule {
    #[serde(flatten)]
    repeat: Repeat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    end_date: Option<CalendarDate>,
}

impl TryFrom<RawRule> for RecurrenceRule {
    type Error = RemindError;

    fn try_from(raw: RawRule) -> Result<Self, Self::Error> {
        let end_date = raw
            .end_date
            .map(|d| {
                d.to_naive()
                    .ok_or_else(|| RemindError::validation("endDate", format!("{d} is not a date")))
            })
            .transpose()?;
        RecurrenceRule::with_fields(raw.repeat, raw.count, end_date)
    }
}

impl From<RecurrenceRule> for RawRule {
    fn from(rule: RecurrenceRule) -> Self {
        RawRule {
            count: rule.count(),
            end_date: rule.end_date().map(CalendarDate::from),
            repeat: rule.repeat,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_of(err: RemindError) -> &'static str {
        match err {
            RemindError::Validation { field, .. } => field,
            other => panic!("Expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_gap_rejected() {
        let err = RecurrenceRule::new(Repeat::Month { gap: 0 }, Termination::Never).unwrap_err();
        assert_eq!(field_of(err), "gap");
    }

    #[test]
    fn test_zero_count_rejected() {
        let err = RecurrenceRule::new(Repeat::Day { gap: 1 }, Termination::Count(0)).unwrap_err();
        assert_eq!(field_of(err), "count");
    }

    #[test]
    fn test_week_without_weekdays_rejected() {
        let repeat = Repeat::Week {
            gap: 1,
            weekdays: Weekdays::fixed([false; 7]),
        };
        let err = RecurrenceRule::new(repeat, Termination::Never).unwrap_err();
        assert_eq!(field_of(err), "weekdays");
    }

    #[test]
    fn test_count_and_end_date_conflict() {
        let end = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        let result = RecurrenceRule::with_fields(Repeat::Day { gap: 1 }, Some(3), Some(end));
        assert!(matches!(result, Err(RemindError::TerminationConflict)));
    }

    #[test]
    fn test_dynamic_weekdays_remap_with_first_weekday() {
        let mut columns = [false; 7];
        columns[0] = true;
        columns[2] = true;

        let monday_first = Weekdays::dynamic(columns, FirstWeekday::Monday);
        // Monday = 1, Wednesday = 3
        assert_eq!(
            monday_first.resolve(FirstWeekday::Monday),
            [false, true, false, true, false, false, false]
        );
        // Same columns under a Sunday-first layout mean Sunday and Tuesday
        assert_eq!(
            monday_first.resolve(FirstWeekday::Sunday),
            [true, false, true, false, false, false, false]
        );
        assert_eq!(monday_first.fixed, [false, true, false, true, false, false, false]);
    }

    #[test]
    fn test_stored_shape() {
        let rule = RecurrenceRule::new(
            Repeat::Custom {
                gap: 2,
                unit: GapUnit::Weeks,
            },
            Termination::Until(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()),
        )
        .unwrap();

        let json = serde_json::to_value(&rule).unwrap();
        assert_eq!(json["type"], "custom");
        assert_eq!(json["gapUnit"], "weeks");
        assert_eq!(json["gap"], 2);
        assert_eq!(json["endDate"]["month"], 2);
        assert!(json.get("count").is_none());

        let back: RecurrenceRule = serde_json::from_value(json).unwrap();
        assert_eq!(back, rule);
    }

    #[test]
    fn test_stored_rule_is_revalidated() {
        let conflict = r#"{"type":"day","gap":1,"count":2,"endDate":{"year":2024,"month":0,"day":5}}"#;
        assert!(serde_json::from_str::<RecurrenceRule>(conflict).is_err());

        let zero_gap = r#"{"type":"weekday","gap":0}"#;
        assert!(serde_json::from_str::<RecurrenceRule>(zero_gap).is_err());
    }
}
