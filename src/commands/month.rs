use anyhow::{Context, Result};
use chrono::{Datelike, Local};
use remindcal_core::date_range::DateWindow;

use super::day::print_failures;
use crate::render::render_month;
use crate::session::Session;

pub async fn run(session: &mut Session, month: Option<&str>, remotes: bool) -> Result<()> {
    let today = Local::now().date_naive();
    let (year, month0) = match month {
        Some(value) => parse_month(value)?,
        None => (today.year(), today.month0()),
    };

    if remotes {
        let failures = session.refresh_remotes(DateWindow::month(year, month0)?).await;
        print_failures(&failures);
    }

    let grid = session.store.get_month(year, month0)?;
    let first_weekday = session.store.options().first_weekday;
    for line in render_month(&grid, first_weekday, today) {
        println!("{}", line);
    }

    Ok(())
}

/// "YYYY-MM" to a year and 0-based month.
fn parse_month(value: &str) -> Result<(i32, u32)> {
    let parse = || -> Option<(i32, u32)> {
        let (year, month) = value.trim().split_once('-')?;
        let month: u32 = month.parse().ok()?;
        (1..=12).contains(&month).then_some((year.parse().ok()?, month - 1))
    };
    parse().with_context(|| format!("Invalid month '{}', expected YYYY-MM", value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_month() {
        assert_eq!(parse_month("2024-02").unwrap(), (2024, 1));
        assert_eq!(parse_month("2024-12").unwrap(), (2024, 11));
        assert!(parse_month("2024-13").is_err());
        assert!(parse_month("2024").is_err());
    }
}
