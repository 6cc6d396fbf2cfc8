//! Terminal rendering for remindcal-core types.
//!
//! Extension traits and helpers that add colored output using owo_colors.

use chrono::{Datelike, NaiveDate};
use owo_colors::OwoColorize;
use remindcal_core::config::Settings;
use remindcal_core::date::FirstWeekday;
use remindcal_core::day::{ForeignEntry, MonthGrid};
use remindcal_core::reminder::Reminder;
use remindcal_core::rule::{GapUnit, RecurrenceRule, Repeat, Termination};
use remindcal_core::time::{TimeFormat, TimeRange};

/// Length of the id prefix shown next to reminders
const SHORT_ID: usize = 8;

pub trait Render {
    fn render(&self, settings: &Settings) -> String;
}

impl Render for Reminder {
    fn render(&self, settings: &Settings) -> String {
        let mut line = format!(
            "{} {} {}",
            color_dot(&self.color),
            render_time(self.range, settings.format),
            self.text
        );
        if let Some(rule) = &self.repeat {
            let rule = format!("({})", describe_rule(rule, settings.first_weekday));
            line.push_str(&format!(" {}", rule.dimmed()));
        }
        line.push_str(&format!(" {}", short_id(&self.id).dimmed()));
        line
    }
}

impl Render for ForeignEntry {
    fn render(&self, settings: &Settings) -> String {
        let tag = format!("[{}]", self.source);
        format!(
            "{} {} {} {}",
            color_dot(self.event.color.as_deref().unwrap_or_default()),
            render_time(self.event.range, settings.format),
            self.event.title,
            tag.dimmed()
        )
    }
}

pub fn short_id(id: &str) -> &str {
    id.get(..SHORT_ID).unwrap_or(id)
}

/// "09:00-10:00", "09:00" or "all-day", right-aligned.
fn render_time(range: Option<TimeRange>, format: TimeFormat) -> String {
    let text = match range {
        None => "all-day".to_string(),
        Some(range) => match range.to() {
            Some(to) => format!("{}-{}", range.from().display(format), to.display(format)),
            None => range.from().display(format),
        },
    };
    format!("{:>11}", text)
}

/// "#rrggbb" colors become a colored dot; anything else a plain one.
fn color_dot(color: &str) -> String {
    match parse_hex(color) {
        Some((r, g, b)) => "●".truecolor(r, g, b).to_string(),
        None => "●".dimmed().to_string(),
    }
}

fn parse_hex(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}

/// Human description of a rule, e.g. "every 2 weeks on Mon, Wed, 5 times".
///
/// Week columns are resolved against `first`, the layout the rule is
/// expanded with.
pub fn describe_rule(rule: &RecurrenceRule, first: FirstWeekday) -> String {
    let every = |gap: u32, unit: &str| match gap {
        1 => format!("every {unit}"),
        n => format!("every {n} {unit}s"),
    };

    let mut text = match rule.repeat() {
        Repeat::Day { gap } => every(*gap, "day"),
        Repeat::Month { gap } => every(*gap, "month"),
        Repeat::Weekday { gap } => format!("{} on the same weekday", every(*gap, "month")),
        Repeat::Week { gap, weekdays } => {
            let days: Vec<&str> = weekdays
                .resolve(first)
                .iter()
                .enumerate()
                .filter(|(_, on)| **on)
                .map(|(i, _)| WEEKDAY_NAMES[i])
                .collect();
            format!("{} on {}", every(*gap, "week"), days.join(", "))
        }
        Repeat::Custom { gap, unit } => {
            let unit = match unit {
                GapUnit::Days => "day",
                GapUnit::Weeks => "week",
                GapUnit::Months => "month",
            };
            every(*gap, unit)
        }
    };

    match rule.termination() {
        Termination::Never => {}
        Termination::Count(1) => text.push_str(", once"),
        Termination::Count(n) => text.push_str(&format!(", {} times", n)),
        Termination::Until(date) => text.push_str(&format!(", until {}", date)),
    }
    text
}

const WEEKDAY_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// Format a date as a human-readable label (e.g. "Today", "Tomorrow", "Wed Feb 25")
pub fn date_label(date: NaiveDate, today: NaiveDate, locale: &str) -> String {
    match (date - today).num_days() {
        0 => "Today".to_string(),
        1 => "Tomorrow".to_string(),
        -1 => "Yesterday".to_string(),
        _ if locale.starts_with("en-US") => date.format("%a %b %-d").to_string(),
        _ => date.format("%a %-d %b").to_string(),
    }
}

/// A month as a calendar grid. Days with something on them get a count.
pub fn render_month(grid: &MonthGrid, first: FirstWeekday, today: NaiveDate) -> Vec<String> {
    let mut lines = Vec::new();

    let title = grid
        .weeks
        .iter()
        .flatten()
        .find(|cell| cell.in_month)
        .map(|cell| cell.day.date.format("%B %Y").to_string())
        .unwrap_or_default();
    lines.push(format!("{}", title.bold()));

    let header: Vec<String> = (0..7)
        .map(|column| format!("{:>4}", &WEEKDAY_NAMES[first.absolute(column)][..2]))
        .collect();
    lines.push(header.join(" ").dimmed().to_string());

    for week in &grid.weeks {
        let cells: Vec<String> = week
            .iter()
            .map(|cell| {
                let marker = match cell.day.len() {
                    0 => " ".to_string(),
                    n if n < 10 => n.to_string(),
                    _ => "+".to_string(),
                };
                let text = format!("{:>3}{}", cell.day.date.day(), marker);
                if !cell.in_month {
                    text.dimmed().to_string()
                } else if cell.day.date == today {
                    text.reversed().to_string()
                } else if cell.day.is_empty() {
                    text
                } else {
                    text.cyan().to_string()
                }
            })
            .collect();
        lines.push(cells.join(" "));
    }

    lines
}

pub fn pluralize(word: &str, count: usize) -> String {
    if count == 1 {
        word.to_string()
    } else {
        format!("{}s", word)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use remindcal_core::rule::Weekdays;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_describe_rule() {
        let weekly = RecurrenceRule::new(
            Repeat::Week {
                gap: 2,
                weekdays: Weekdays::dynamic(
                    [true, false, true, false, false, false, false],
                    FirstWeekday::Monday,
                ),
            },
            Termination::Count(5),
        )
        .unwrap();
        assert_eq!(
            describe_rule(&weekly, FirstWeekday::Monday),
            "every 2 weeks on Mon, Wed, 5 times"
        );

        let monthly = RecurrenceRule::new(
            Repeat::Month { gap: 1 },
            Termination::Until(date(2024, 12, 31)),
        )
        .unwrap();
        assert_eq!(
            describe_rule(&monthly, FirstWeekday::Sunday),
            "every month, until 2024-12-31"
        );
    }

    #[test]
    fn test_weekly_rule_follows_layout() {
        // Columns 0 and 2 as picked in a Monday-first week
        let rule = RecurrenceRule::new(
            Repeat::Week {
                gap: 1,
                weekdays: Weekdays::dynamic(
                    [true, false, true, false, false, false, false],
                    FirstWeekday::Monday,
                ),
            },
            Termination::Never,
        )
        .unwrap();
        let reminder = remindcal_core::reminder::Reminder {
            id: "0123456789".into(),
            creation_date: 1,
            anchor: date(2024, 4, 1),
            range: None,
            repeat: Some(rule),
            notify: None,
            color: String::new(),
            text: "Gym".into(),
            description: String::new(),
        };

        let monday_first = Settings {
            first_weekday: FirstWeekday::Monday,
            ..Settings::default()
        };
        assert!(reminder.render(&monday_first).contains("every week on Mon, Wed"));

        let sunday_first = Settings::default();
        assert!(reminder.render(&sunday_first).contains("every week on Sun, Tue"));
    }

    #[test]
    fn test_date_label() {
        let today = date(2025, 2, 24);
        assert_eq!(date_label(today, today, "en-US"), "Today");
        assert_eq!(date_label(date(2025, 2, 25), today, "en-US"), "Tomorrow");
        assert_eq!(date_label(date(2025, 2, 26), today, "en-US"), "Wed Feb 26");
        assert_eq!(date_label(date(2025, 2, 26), today, "en-GB"), "Wed 26 Feb");
    }

    #[test]
    fn test_parse_hex() {
        assert_eq!(parse_hex("#ff8000"), Some((255, 128, 0)));
        assert_eq!(parse_hex("orange"), None);
        assert_eq!(parse_hex("#fff"), None);
    }

    #[test]
    fn test_short_id() {
        assert_eq!(short_id("0123456789abcdef"), "01234567");
        assert_eq!(short_id("abc"), "abc");
    }
}
