//! Time-of-day values and from/to range validation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Bound, RemindError, RemindResult};

/// A wall-clock time in 24-hour form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawTime")]
pub struct TimeOfDay {
    hours: u32,
    minutes: u32,
}

#[derive(Deserialize)]
struct RawTime {
    hours: i64,
    minutes: i64,
}

impl TryFrom<RawTime> for TimeOfDay {
    type Error = String;

    fn try_from(raw: RawTime) -> Result<Self, Self::Error> {
        let hours = u32::try_from(raw.hours).map_err(|_| format!("hours {} out of range", raw.hours))?;
        let minutes =
            u32::try_from(raw.minutes).map_err(|_| format!("minutes {} out of range", raw.minutes))?;
        TimeOfDay::new(hours, minutes).ok_or_else(|| format!("{hours}:{minutes:02} is not a time"))
    }
}

impl TimeOfDay {
    pub fn new(hours: u32, minutes: u32) -> Option<Self> {
        (hours < 24 && minutes < 60).then_some(TimeOfDay { hours, minutes })
    }

    pub fn hours(&self) -> u32 {
        self.hours
    }

    pub fn minutes(&self) -> u32 {
        self.minutes
    }

    pub fn minutes_since_midnight(&self) -> u32 {
        self.hours * 60 + self.minutes
    }

    pub fn to_naive(self) -> chrono::NaiveTime {
        chrono::NaiveTime::from_hms_opt(self.hours, self.minutes, 0).unwrap_or_default()
    }

    /// Render in the user's clock format.
    pub fn display(&self, format: TimeFormat) -> String {
        match format {
            TimeFormat::H24 => self.to_string(),
            TimeFormat::H12 => {
                let suffix = if self.hours < 12 { "am" } else { "pm" };
                let hours = match self.hours % 12 {
                    0 => 12,
                    h => h,
                };
                format!("{hours}:{:02} {suffix}", self.minutes)
            }
        }
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hours, self.minutes)
    }
}

impl FromStr for TimeOfDay {
    type Err = String;

    /// Accepts `HH:MM` and 12-hour `H:MM am` / `H:MMpm`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let (clock, meridiem) = if let Some(rest) = lower.strip_suffix("am") {
            (rest.trim_end(), Some(false))
        } else if let Some(rest) = lower.strip_suffix("pm") {
            (rest.trim_end(), Some(true))
        } else {
            (lower.as_str(), None)
        };

        let (h, m) = clock
            .split_once(':')
            .ok_or_else(|| format!("'{s}' is not a time, expected HH:MM"))?;
        if !is_digits(h) {
            return Err(format!("'{h}' is not an hour"));
        }
        if !is_digits(m) {
            return Err(format!("'{m}' is not a minute"));
        }
        let hours: u32 = h.parse().map_err(|_| format!("'{h}' is not an hour"))?;
        let minutes: u32 = m.parse().map_err(|_| format!("'{m}' is not a minute"))?;
        if m.len() != 2 {
            return Err(format!("minutes in '{s}' must have two digits"));
        }

        let hours = match meridiem {
            None => hours,
            Some(_) if !(1..=12).contains(&hours) => {
                return Err(format!("hour {hours} is not valid on a 12-hour clock"));
            }
            Some(pm) => hours % 12 + if pm { 12 } else { 0 },
        };

        if hours > 23 {
            return Err(format!("hour {hours} is out of range 0-23"));
        }
        if minutes > 59 {
            return Err(format!("minute {minutes} is out of range 0-59"));
        }
        Ok(TimeOfDay { hours, minutes })
    }
}

fn is_digits(part: &str) -> bool {
    !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit())
}

/// 12- or 24-hour clock preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum TimeFormat {
    H12,
    #[default]
    H24,
}

impl TryFrom<u8> for TimeFormat {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            12 => Ok(TimeFormat::H12),
            24 => Ok(TimeFormat::H24),
            other => Err(format!("time format must be 12 or 24, got {other}")),
        }
    }
}

impl From<TimeFormat> for u8 {
    fn from(value: TimeFormat) -> Self {
        match value {
            TimeFormat::H12 => 12,
            TimeFormat::H24 => 24,
        }
    }
}

/// Start and optional end of a reminder within its day.
///
/// A range without `to` is a point-in-time reminder. When `to` is present it is
/// strictly after `from`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRange")]
pub struct TimeRange {
    from: TimeOfDay,
    #[serde(skip_serializing_if = "Option::is_none")]
    to: Option<TimeOfDay>,
}

#[derive(Deserialize)]
struct RawRange {
    from: TimeOfDay,
    to: Option<TimeOfDay>,
}

impl TryFrom<RawRange> for TimeRange {
    type Error = RemindError;

    fn try_from(raw: RawRange) -> Result<Self, Self::Error> {
        TimeRange::new(raw.from, raw.to)
    }
}

impl TimeRange {
    pub fn new(from: TimeOfDay, to: Option<TimeOfDay>) -> RemindResult<Self> {
        if let Some(to) = to {
            if to.minutes_since_midnight() <= from.minutes_since_midnight() {
                return Err(RemindError::range(
                    Bound::To,
                    format!("{to} must be later than {from}"),
                ));
            }
        }
        Ok(TimeRange { from, to })
    }

    pub fn from(&self) -> TimeOfDay {
        self.from
    }

    pub fn to(&self) -> Option<TimeOfDay> {
        self.to
    }
}

/// Validate a from/to pair as entered by the user.
///
/// Both absent means an all-day reminder (`Ok(None)`).
pub fn validate_range(from: Option<&str>, to: Option<&str>) -> RemindResult<Option<TimeRange>> {
    let parse = |bound: Bound, text: &str| -> RemindResult<TimeOfDay> {
        text.parse().map_err(|e: String| RemindError::range(bound, e))
    };

    let from = from.map(|s| parse(Bound::From, s)).transpose()?;
    let to = to.map(|s| parse(Bound::To, s)).transpose()?;

    match (from, to) {
        (None, None) => Ok(None),
        (None, Some(_)) => Err(RemindError::range(
            Bound::From,
            "an end time needs a start time",
        )),
        (Some(from), to) => TimeRange::new(from, to).map(Some),
    }
}
