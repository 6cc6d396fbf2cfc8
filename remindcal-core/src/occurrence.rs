//! Occurrence generation.
//!
//! Expands a reminder's repeat rule into the ascending list of calendar days it
//! falls on. Occurrence indices are always counted from the anchor (index 0),
//! whatever window is asked for, so `count` and end dates mean the same thing
//! for every query.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

use crate::date::{FirstWeekday, first_of_month, from_month_index, month_index, weekday_ordinal};
use crate::date_range::DateWindow;
use crate::reminder::Reminder;
use crate::rule::{GapUnit, Repeat, Termination};

/// Consecutive periods a monthly stream may skip before it is considered
/// exhausted (a Feb 29 anchor with a yearly stride skips at most 7 in a row).
const MAX_SKIPPED_PERIODS: u32 = 48;

/// One occurrence of a reminder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Occurrence {
    pub date: NaiveDate,
    /// Position in the full series; the anchor is 0.
    pub index: u32,
}

/// Lazy, finite sequence of occurrences inside a window.
///
/// Cloning an unstarted sequence restarts it; the same inputs always produce
/// the same dates.
#[derive(Debug, Clone)]
pub struct Occurrences {
    stream: Stream,
    window: DateWindow,
    horizon: NaiveDate,
    limit: Option<u32>,
    produced: u32,
    done: bool,
}

/// Expand `reminder` over `window`.
///
/// Dynamic weekday flags are resolved against `first_weekday` once, here.
pub fn generate(reminder: &Reminder, window: DateWindow, first_weekday: FirstWeekday) -> Occurrences {
    let anchor = reminder.anchor;
    let (stream, termination) = match &reminder.repeat {
        None => (Stream::Single(Some(anchor)), Termination::Count(1)),
        Some(rule) => {
            let stream = match *rule.repeat() {
                Repeat::Day { gap } => Stream::days(anchor, gap),
                Repeat::Week { gap, weekdays } => {
                    let absolute = weekdays.resolve(first_weekday);
                    let columns = (0..7)
                        .filter(|&column| absolute[first_weekday.absolute(column)])
                        .map(|column| column as i64)
                        .collect();
                    Stream::weeks(anchor, gap, columns, first_weekday)
                }
                Repeat::Month { gap } => Stream::months(anchor, gap, MonthMode::DayOfMonth),
                Repeat::Weekday { gap } => Stream::months(anchor, gap, MonthMode::NthWeekday),
                Repeat::Custom { gap, unit } => match unit {
                    GapUnit::Days => Stream::days(anchor, gap),
                    GapUnit::Weeks => {
                        let column = first_weekday.column(anchor.weekday());
                        Stream::weeks(anchor, gap, vec![column], first_weekday)
                    }
                    GapUnit::Months => Stream::months(anchor, gap, MonthMode::DayOfMonth),
                },
            };
            (stream, rule.termination())
        }
    };

    let (limit, horizon) = match termination {
        Termination::Never => (None, window.end),
        Termination::Count(count) => (Some(count), window.end),
        Termination::Until(end) => (None, end.min(window.end)),
    };

    let mut occurrences = Occurrences {
        stream,
        window,
        horizon,
        limit,
        produced: 0,
        done: false,
    };
    occurrences.fast_forward();
    occurrences
}

/// Whether `reminder` has an occurrence on `date`.
pub fn occurs_on(reminder: &Reminder, date: NaiveDate, first_weekday: FirstWeekday) -> Option<Occurrence> {
    generate(reminder, DateWindow::day(date), first_weekday).next()
}

impl Occurrences {
    /// Jump a plain day stride straight to the window instead of walking it.
    fn fast_forward(&mut self) {
        if let Stream::Days {
            next: Some(next),
            step,
        } = &mut self.stream
        {
            let behind = (self.window.start - *next).num_days();
            if behind <= 0 {
                return;
            }
            let mut skip = (behind + *step - 1) / *step;
            if let Some(limit) = self.limit {
                skip = skip.min(limit as i64);
            }
            match next.checked_add_signed(Duration::days(skip * *step)) {
                Some(date) => {
                    *next = date;
                    self.produced = skip as u32;
                }
                None => self.done = true,
            }
        }
    }
}

impl Iterator for Occurrences {
    type Item = Occurrence;

    fn next(&mut self) -> Option<Occurrence> {
        loop {
            if self.done {
                return None;
            }
            if self.limit.is_some_and(|limit| self.produced >= limit) {
                self.done = true;
                return None;
            }
            let Some(date) = self.stream.next_candidate(self.horizon) else {
                self.done = true;
                return None;
            };

            let index = self.produced;
            self.produced += 1;

            if date >= self.window.start {
                return Some(Occurrence { date, index });
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum MonthMode {
    /// Same day of month as the anchor; months without it are skipped.
    DayOfMonth,
    /// Same "Nth weekday" as the anchor; months without it are skipped.
    NthWeekday,
}

/// Unbounded ascending candidates starting at the anchor.
#[derive(Debug, Clone)]
enum Stream {
    Single(Option<NaiveDate>),
    Days {
        /// `None` once the next stride would leave the calendar.
        next: Option<NaiveDate>,
        step: i64,
    },
    Weeks {
        anchor: NaiveDate,
        anchor_pending: bool,
        /// Days from the anchor to the start of the current week.
        week_offset: i64,
        step: i64,
        /// Flagged columns, ascending in week order.
        columns: Vec<i64>,
        position: usize,
    },
    Months {
        anchor: NaiveDate,
        anchor_month: i64,
        period: i64,
        gap: i64,
        mode: MonthMode,
        weekday: Weekday,
        ordinal: u8,
    },
}

impl Stream {
    fn days(anchor: NaiveDate, gap: u32) -> Self {
        Stream::Days {
            next: Some(anchor),
            step: gap as i64,
        }
    }

    fn weeks(anchor: NaiveDate, gap: u32, columns: Vec<i64>, first: FirstWeekday) -> Self {
        Stream::Weeks {
            anchor,
            anchor_pending: true,
            week_offset: -first.column(anchor.weekday()),
            step: gap as i64 * 7,
            columns,
            position: 0,
        }
    }

    fn months(anchor: NaiveDate, gap: u32, mode: MonthMode) -> Self {
        Stream::Months {
            anchor,
            anchor_month: month_index(anchor.year(), anchor.month0()),
            period: 0,
            gap: gap as i64,
            mode,
            weekday: anchor.weekday(),
            ordinal: weekday_ordinal(anchor),
        }
    }

    /// Next candidate date, or `None` once past `horizon`.
    fn next_candidate(&mut self, horizon: NaiveDate) -> Option<NaiveDate> {
        match self {
            Stream::Single(date) => date.take().filter(|d| *d <= horizon),

            Stream::Days { next, step } => {
                let date = (*next)?;
                if date > horizon {
                    return None;
                }
                *next = date.checked_add_signed(Duration::days(*step));
                Some(date)
            }

            Stream::Weeks {
                anchor,
                anchor_pending,
                week_offset,
                step,
                columns,
                position,
            } => {
                if *anchor_pending {
                    *anchor_pending = false;
                    return (*anchor <= horizon).then_some(*anchor);
                }
                loop {
                    if *position >= columns.len() {
                        *position = 0;
                        *week_offset += *step;
                    }
                    let offset = *week_offset + columns[*position];
                    *position += 1;
                    // Days up to the anchor belong to its first week and are never emitted
                    if offset <= 0 {
                        continue;
                    }
                    let date = anchor.checked_add_signed(Duration::days(offset))?;
                    if date > horizon {
                        return None;
                    }
                    return Some(date);
                }
            }

            Stream::Months {
                anchor,
                anchor_month,
                period,
                gap,
                mode,
                weekday,
                ordinal,
            } => {
                let mut skipped = 0;
                loop {
                    let (year, month0) = from_month_index(*anchor_month + *period * *gap)?;
                    *period += 1;
                    if first_of_month(year, month0)? > horizon {
                        return None;
                    }
                    let date = match mode {
                        MonthMode::DayOfMonth => NaiveDate::from_ymd_opt(year, month0 + 1, anchor.day()),
                        MonthMode::NthWeekday => {
                            NaiveDate::from_weekday_of_month_opt(year, month0 + 1, *weekday, *ordinal)
                        }
                    };
                    match date {
                        Some(date) if date > horizon => return None,
                        Some(date) => return Some(date),
                        None => {
                            skipped += 1;
                            if skipped > MAX_SKIPPED_PERIODS {
                                return None;
                            }
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reminder::ReminderDraft;
    use crate::rule::{RecurrenceRule, Weekdays};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn reminder(anchor: NaiveDate, repeat: Repeat, termination: Termination) -> Reminder {
        let rule = RecurrenceRule::new(repeat, termination).unwrap();
        ReminderDraft::new("test", anchor)
            .with_repeat(rule)
            .into_reminder("r".into(), 0)
    }

    fn window(from: NaiveDate, to: NaiveDate) -> DateWindow {
        DateWindow::new(from, to).unwrap()
    }

    fn dates(occurrences: Occurrences) -> Vec<NaiveDate> {
        occurrences.map(|o| o.date).collect()
    }

    #[test]
    fn test_single_reminder_occurs_on_anchor_only() {
        let r = ReminderDraft::new("once", date(2024, 5, 1)).into_reminder("r".into(), 0);
        let got = dates(generate(&r, window(date(2024, 1, 1), date(2024, 12, 31)), FirstWeekday::Sunday));
        assert_eq!(got, vec![date(2024, 5, 1)]);
    }

    #[test]
    fn test_day_stride_matches_anchor_plus_n_gaps() {
        for gap in [1u32, 2, 3, 7, 30] {
            let anchor = date(2024, 2, 27);
            let r = reminder(anchor, Repeat::Day { gap }, Termination::Never);
            let occurrences = generate(&r, window(anchor, date(2025, 2, 27)), FirstWeekday::Sunday);
            for occ in occurrences {
                assert_eq!(
                    occ.date,
                    anchor + Duration::days(occ.index as i64 * gap as i64),
                    "gap {gap}, index {}",
                    occ.index
                );
            }
        }
    }

    #[test]
    fn test_huge_day_gap_keeps_anchor() {
        let anchor = date(2024, 1, 1);
        let r = reminder(anchor, Repeat::Day { gap: 200_000_000 }, Termination::Never);
        let got: Vec<_> = generate(&r, window(anchor, date(2024, 12, 31)), FirstWeekday::Sunday).collect();
        assert_eq!(
            got,
            vec![Occurrence {
                date: anchor,
                index: 0
            }]
        );
    }

    #[test]
    fn test_huge_week_gap_keeps_current_week() {
        // Thursday anchor, flagged Thursday and Saturday
        let mut flags = [false; 7];
        flags[4] = true;
        flags[6] = true;
        let weekdays = Weekdays::fixed(flags);
        let anchor = date(2024, 5, 2);
        let r = reminder(anchor, Repeat::Week { gap: u32::MAX, weekdays }, Termination::Never);
        let got = dates(generate(&r, window(anchor, date(2024, 12, 31)), FirstWeekday::Sunday));
        assert_eq!(got, vec![anchor, date(2024, 5, 4)]);
    }

    #[test]
    fn test_window_at_calendar_end() {
        let anchor = NaiveDate::MAX - Duration::days(3);
        let last_two = DateWindow::starting_at(NaiveDate::MAX - Duration::days(1), 366);
        let daily = reminder(anchor, Repeat::Day { gap: 1 }, Termination::Never);
        let got: Vec<_> = generate(&daily, last_two, FirstWeekday::Sunday).collect();
        assert_eq!(
            got,
            vec![
                Occurrence {
                    date: NaiveDate::MAX - Duration::days(1),
                    index: 2
                },
                Occurrence {
                    date: NaiveDate::MAX,
                    index: 3
                },
            ]
        );

        let rest = DateWindow::starting_at(anchor, 366);
        let monthly = reminder(anchor, Repeat::Month { gap: 1 }, Termination::Never);
        assert_eq!(dates(generate(&monthly, rest, FirstWeekday::Sunday)), vec![anchor]);

        let every_day = Weekdays::fixed([true; 7]);
        let weekly = reminder(
            anchor,
            Repeat::Week {
                gap: 1,
                weekdays: every_day,
            },
            Termination::Never,
        );
        let got = dates(generate(&weekly, rest, FirstWeekday::Sunday));
        assert_eq!(got.len(), 4);
        assert_eq!(got.last(), Some(&NaiveDate::MAX));
    }

    #[test]
    fn test_day_fast_forward_keeps_indices() {
        let anchor = date(2020, 1, 1);
        let r = reminder(anchor, Repeat::Day { gap: 3 }, Termination::Never);
        let first = generate(&r, window(date(2024, 1, 1), date(2024, 1, 10)), FirstWeekday::Sunday)
            .next()
            .unwrap();
        assert!(first.date >= date(2024, 1, 1));
        assert_eq!(first.date, anchor + Duration::days(first.index as i64 * 3));
        assert!(first.date < date(2024, 1, 4));
    }

    #[test]
    fn test_count_is_counted_from_anchor_not_window() {
        let anchor = date(2024, 1, 1);
        let r = reminder(anchor, Repeat::Day { gap: 1 }, Termination::Count(10));
        // Only the last three fall inside the window
        let got = generate(&r, window(date(2024, 1, 8), date(2024, 1, 31)), FirstWeekday::Sunday)
            .collect::<Vec<_>>();
        assert_eq!(got.len(), 3);
        assert_eq!(got[0].index, 7);
        assert_eq!(got[2].date, date(2024, 1, 10));

        // Window after the series has ended
        let after = generate(&r, window(date(2024, 2, 1), date(2024, 2, 28)), FirstWeekday::Sunday);
        assert_eq!(after.count(), 0);
    }

    #[test]
    fn test_count_caps_results_in_ascending_order() {
        let r = reminder(date(2024, 1, 1), Repeat::Day { gap: 2 }, Termination::Count(4));
        let got = dates(generate(&r, window(date(2024, 1, 1), date(2024, 12, 31)), FirstWeekday::Sunday));
        assert_eq!(
            got,
            vec![date(2024, 1, 1), date(2024, 1, 3), date(2024, 1, 5), date(2024, 1, 7)]
        );
        assert!(got.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_end_date_is_inclusive() {
        let r = reminder(
            date(2024, 1, 1),
            Repeat::Day { gap: 7 },
            Termination::Until(date(2024, 1, 22)),
        );
        let got = dates(generate(&r, window(date(2024, 1, 1), date(2024, 3, 1)), FirstWeekday::Sunday));
        assert_eq!(got.last(), Some(&date(2024, 1, 22)));
        assert_eq!(got.len(), 4);
    }

    #[test]
    fn test_month_end_skips_short_months() {
        let r = reminder(date(2024, 1, 31), Repeat::Month { gap: 1 }, Termination::Count(4));
        let got = dates(generate(&r, window(date(2024, 1, 1), date(2025, 12, 31)), FirstWeekday::Sunday));
        assert_eq!(
            got,
            vec![date(2024, 1, 31), date(2024, 3, 31), date(2024, 5, 31), date(2024, 7, 31)]
        );
    }

    #[test]
    fn test_month_never_changes_day_of_month() {
        for day in [1u32, 15, 29, 30, 31] {
            let anchor = date(2023, 1, day);
            let r = reminder(anchor, Repeat::Month { gap: 1 }, Termination::Never);
            let got = dates(generate(&r, window(anchor, date(2026, 12, 31)), FirstWeekday::Sunday));
            assert!(!got.is_empty());
            assert!(got.iter().all(|d| d.day() == day), "day {day}: {got:?}");
        }
    }

    #[test]
    fn test_month_gap_strides_months() {
        let r = reminder(date(2024, 1, 15), Repeat::Month { gap: 5 }, Termination::Count(3));
        let got = dates(generate(&r, window(date(2024, 1, 1), date(2026, 1, 1)), FirstWeekday::Sunday));
        assert_eq!(got, vec![date(2024, 1, 15), date(2024, 6, 15), date(2024, 11, 15)]);
    }

    #[test]
    fn test_leap_day_yearly() {
        let r = reminder(date(2024, 2, 29), Repeat::Month { gap: 12 }, Termination::Count(3));
        let got = dates(generate(&r, window(date(2024, 1, 1), date(2040, 1, 1)), FirstWeekday::Sunday));
        assert_eq!(got, vec![date(2024, 2, 29), date(2028, 2, 29), date(2032, 2, 29)]);
    }

    #[test]
    fn test_weekday_ordinal_each_month() {
        // Third Tuesday of May 2024
        let r = reminder(date(2024, 5, 21), Repeat::Weekday { gap: 1 }, Termination::Count(3));
        let got = dates(generate(&r, window(date(2024, 1, 1), date(2024, 12, 31)), FirstWeekday::Sunday));
        assert_eq!(got, vec![date(2024, 5, 21), date(2024, 6, 18), date(2024, 7, 16)]);
    }

    #[test]
    fn test_weekday_ordinal_every_other_month() {
        // Third Tuesday, every second month
        let r = reminder(date(2024, 5, 21), Repeat::Weekday { gap: 2 }, Termination::Count(3));
        let got = dates(generate(&r, window(date(2024, 1, 1), date(2024, 12, 31)), FirstWeekday::Sunday));
        assert_eq!(got, vec![date(2024, 5, 21), date(2024, 7, 16), date(2024, 9, 17)]);
    }

    #[test]
    fn test_fifth_weekday_skips_months_without_one() {
        // 2024-01-31 is the fifth Wednesday of January
        let r = reminder(date(2024, 1, 31), Repeat::Weekday { gap: 1 }, Termination::Count(3));
        let got = dates(generate(&r, window(date(2024, 1, 1), date(2024, 12, 31)), FirstWeekday::Sunday));
        // February has no fifth Wednesday, May 29 and July 31 are the next ones
        assert_eq!(got, vec![date(2024, 1, 31), date(2024, 5, 29), date(2024, 7, 31)]);
    }

    #[test]
    fn test_week_dynamic_monday_wednesday_over_a_month() {
        let mut columns = [false; 7];
        columns[0] = true;
        columns[2] = true;
        let weekdays = Weekdays::dynamic(columns, FirstWeekday::Monday);
        // 2024-04-01 is a Monday
        let r = reminder(date(2024, 4, 1), Repeat::Week { gap: 1, weekdays }, Termination::Never);

        let got = dates(generate(&r, DateWindow::month(2024, 3).unwrap(), FirstWeekday::Monday));
        assert_eq!(
            got,
            vec![
                date(2024, 4, 1),
                date(2024, 4, 3),
                date(2024, 4, 8),
                date(2024, 4, 10),
                date(2024, 4, 15),
                date(2024, 4, 17),
                date(2024, 4, 22),
                date(2024, 4, 24),
                date(2024, 4, 29),
            ]
        );
        assert!(got.iter().all(|d| matches!(d.weekday(), Weekday::Mon | Weekday::Wed)));
    }

    #[test]
    fn test_week_gap_skips_weeks_and_keeps_anchor_first() {
        // Anchor on a Thursday, flagged Tuesday and Friday, every other week
        let mut flags = [false; 7];
        flags[2] = true;
        flags[5] = true;
        let weekdays = Weekdays::fixed(flags);
        let r = reminder(date(2024, 5, 2), Repeat::Week { gap: 2, weekdays }, Termination::Count(5));

        let got = dates(generate(&r, window(date(2024, 5, 1), date(2024, 7, 1)), FirstWeekday::Sunday));
        assert_eq!(
            got,
            vec![
                date(2024, 5, 2),
                date(2024, 5, 3),
                date(2024, 5, 14),
                date(2024, 5, 17),
                date(2024, 5, 28),
            ]
        );
    }

    #[test]
    fn test_custom_units() {
        let anchor = date(2024, 3, 6);
        let weeks = reminder(
            anchor,
            Repeat::Custom {
                gap: 3,
                unit: GapUnit::Weeks,
            },
            Termination::Count(3),
        );
        assert_eq!(
            dates(generate(&weeks, window(anchor, date(2024, 12, 31)), FirstWeekday::Monday)),
            vec![anchor, date(2024, 3, 27), date(2024, 4, 17)]
        );

        let days = reminder(
            anchor,
            Repeat::Custom {
                gap: 10,
                unit: GapUnit::Days,
            },
            Termination::Count(2),
        );
        assert_eq!(
            dates(generate(&days, window(anchor, date(2024, 12, 31)), FirstWeekday::Monday)),
            vec![anchor, date(2024, 3, 16)]
        );

        let months = reminder(
            date(2024, 1, 30),
            Repeat::Custom {
                gap: 1,
                unit: GapUnit::Months,
            },
            Termination::Count(2),
        );
        assert_eq!(
            dates(generate(&months, window(anchor, date(2024, 12, 31)), FirstWeekday::Monday)),
            vec![date(2024, 3, 30)]
        );
    }

    #[test]
    fn test_generation_is_repeatable() {
        let r = reminder(date(2024, 1, 31), Repeat::Weekday { gap: 2 }, Termination::Never);
        let w = window(date(2024, 1, 1), date(2026, 1, 1));
        let first: Vec<_> = generate(&r, w, FirstWeekday::Monday).collect();
        let second: Vec<_> = generate(&r, w, FirstWeekday::Monday).collect();
        assert_eq!(first, second);

        let fresh = generate(&r, w, FirstWeekday::Monday);
        let restarted = fresh.clone();
        assert_eq!(fresh.collect::<Vec<_>>(), restarted.collect::<Vec<_>>());
    }

    #[test]
    fn test_window_before_anchor_is_empty() {
        let r = reminder(date(2024, 6, 1), Repeat::Day { gap: 1 }, Termination::Never);
        let got = generate(&r, window(date(2024, 1, 1), date(2024, 5, 31)), FirstWeekday::Sunday);
        assert_eq!(got.count(), 0);
    }

    #[test]
    fn test_occurs_on() {
        let r = reminder(date(2024, 1, 31), Repeat::Month { gap: 1 }, Termination::Never);
        assert!(occurs_on(&r, date(2024, 2, 29), FirstWeekday::Sunday).is_none());
        let march = occurs_on(&r, date(2024, 3, 31), FirstWeekday::Sunday).unwrap();
        assert_eq!(march.index, 1);
    }
}
