//! Reminder options shared by `add` and `edit`.

use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate, Weekday};
use clap::{Args, ValueEnum};
use remindcal_core::date::FirstWeekday;
use remindcal_core::date_range::parse_date;
use remindcal_core::notify::NotifySpec;
use remindcal_core::rule::{GapUnit, RecurrenceRule, Repeat, Termination, Weekdays};
use remindcal_core::time::TimeOfDay;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum RepeatKind {
    /// Does not repeat
    None,
    Day,
    Week,
    Month,
    /// Same weekday of the month (e.g. second Tuesday)
    Weekday,
    /// Every --gap --unit
    Custom,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum UnitArg {
    Days,
    Weeks,
    Months,
}

impl From<UnitArg> for GapUnit {
    fn from(unit: UnitArg) -> Self {
        match unit {
            UnitArg::Days => GapUnit::Days,
            UnitArg::Weeks => GapUnit::Weeks,
            UnitArg::Months => GapUnit::Months,
        }
    }
}

#[derive(Args, Debug, Default)]
pub struct ReminderArgs {
    /// Date of the first occurrence (YYYY-MM-DD)
    #[arg(short, long)]
    pub date: Option<String>,

    /// Start time (e.g. "09:00" or "9:00 am")
    #[arg(long)]
    pub from: Option<String>,

    /// End time, later than --from
    #[arg(long)]
    pub to: Option<String>,

    /// Make the reminder all-day again
    #[arg(long, conflicts_with_all = ["from", "to"])]
    pub all_day: bool,

    #[arg(short, long, value_enum)]
    pub repeat: Option<RepeatKind>,

    /// Repeat every N days/weeks/months
    #[arg(long)]
    pub gap: Option<u32>,

    /// Unit of a custom repeat
    #[arg(long, value_enum)]
    pub unit: Option<UnitArg>,

    /// Weekdays of a weekly repeat (e.g. "mon,wed")
    #[arg(long, value_delimiter = ',')]
    pub weekdays: Vec<String>,

    /// Stop after N occurrences
    #[arg(long)]
    pub count: Option<u32>,

    /// Stop after this date (YYYY-MM-DD)
    #[arg(long)]
    pub until: Option<String>,

    /// "default", "none" or a time of day
    #[arg(long)]
    pub notify: Option<String>,

    #[arg(long)]
    pub color: Option<String>,

    #[arg(long)]
    pub description: Option<String>,
}

impl ReminderArgs {
    pub fn date(&self) -> Result<Option<NaiveDate>> {
        Ok(self.date.as_deref().map(parse_date).transpose()?)
    }

    fn touches_rule(&self) -> bool {
        self.repeat.is_some()
            || self.gap.is_some()
            || self.unit.is_some()
            || !self.weekdays.is_empty()
            || self.count.is_some()
            || self.until.is_some()
    }

    /// The rule these options describe, layered over `existing`.
    ///
    /// `None` leaves the rule alone; `Some(None)` clears it.
    pub fn rule(
        &self,
        existing: Option<&RecurrenceRule>,
        anchor: NaiveDate,
        first: FirstWeekday,
    ) -> Result<Option<Option<RecurrenceRule>>> {
        if !self.touches_rule() {
            return Ok(None);
        }

        let kind = match (self.repeat, existing) {
            (Some(kind), _) => kind,
            (None, Some(rule)) => kind_of(rule.repeat()),
            (None, None) => anyhow::bail!("--repeat is required to make a reminder repeat"),
        };
        let previous = existing
            .map(RecurrenceRule::repeat)
            .filter(|repeat| kind_of(repeat) == kind);

        let gap = self.gap.or(previous.map(Repeat::gap)).unwrap_or(1);
        let repeat = match kind {
            RepeatKind::None => return Ok(Some(None)),
            RepeatKind::Day => Repeat::Day { gap },
            RepeatKind::Month => Repeat::Month { gap },
            RepeatKind::Weekday => Repeat::Weekday { gap },
            RepeatKind::Week => {
                let weekdays = if !self.weekdays.is_empty() {
                    Weekdays::dynamic(parse_weekdays(&self.weekdays, first)?, first)
                } else if let Some(Repeat::Week { weekdays, .. }) = previous {
                    *weekdays
                } else {
                    // Just the anchor's weekday
                    let mut columns = [false; 7];
                    columns[first.column(anchor.weekday()) as usize] = true;
                    Weekdays::dynamic(columns, first)
                };
                Repeat::Week { gap, weekdays }
            }
            RepeatKind::Custom => {
                let unit = match (self.unit, previous) {
                    (Some(unit), _) => unit.into(),
                    (None, Some(Repeat::Custom { unit, .. })) => *unit,
                    (None, _) => anyhow::bail!("--unit is required for a custom repeat"),
                };
                Repeat::Custom { gap, unit }
            }
        };

        let termination = if self.count.is_some() || self.until.is_some() {
            let until = self.until.as_deref().map(parse_date).transpose()?;
            Termination::from_fields(self.count, until)?
        } else {
            existing.map(RecurrenceRule::termination).unwrap_or_default()
        };

        Ok(Some(Some(RecurrenceRule::new(repeat, termination)?)))
    }

    /// `None` leaves notification alone; `Some(None)` turns it off.
    pub fn notify(&self) -> Result<Option<Option<NotifySpec>>> {
        let Some(value) = self.notify.as_deref() else {
            return Ok(None);
        };
        let spec = match value.trim().to_lowercase().as_str() {
            "none" | "off" => None,
            "default" => Some(NotifySpec::Default),
            time => {
                let time = TimeOfDay::from_str(time)
                    .map_err(|e| anyhow::anyhow!(e))
                    .with_context(|| format!("Invalid --notify value '{value}'"))?;
                Some(NotifySpec::Time { time })
            }
        };
        Ok(Some(spec))
    }
}

fn kind_of(repeat: &Repeat) -> RepeatKind {
    match repeat {
        Repeat::Day { .. } => RepeatKind::Day,
        Repeat::Week { .. } => RepeatKind::Week,
        Repeat::Month { .. } => RepeatKind::Month,
        Repeat::Weekday { .. } => RepeatKind::Weekday,
        Repeat::Custom { .. } => RepeatKind::Custom,
    }
}

/// Weekday names to column flags of the given week layout.
fn parse_weekdays(names: &[String], first: FirstWeekday) -> Result<[bool; 7]> {
    let mut columns = [false; 7];
    for name in names {
        let weekday = Weekday::from_str(name.trim())
            .map_err(|_| anyhow::anyhow!("Unknown weekday '{}'", name))?;
        columns[first.column(weekday) as usize] = true;
    }
    Ok(columns)
}
