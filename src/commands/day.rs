use anyhow::Result;
use chrono::{Local, NaiveDate};
use owo_colors::OwoColorize;
use remindcal_core::date_range::{DateWindow, parse_date};

use crate::render::{Render, date_label};
use crate::session::Session;

pub async fn run(session: &mut Session, date: Option<&str>, remotes: bool) -> Result<()> {
    let today = Local::now().date_naive();
    let date = date.map(parse_date).transpose()?.unwrap_or(today);

    if remotes {
        let failures = session.refresh_remotes(DateWindow::day(date)).await;
        print_failures(&failures);
    }

    let label = date_label(date, today, &session.config.settings.date_locale);
    println!("{} {}", label.bold(), date.to_string().dimmed());
    for line in day_lines(session, date) {
        println!("  {}", line);
    }

    Ok(())
}

/// Local reminders in day order, then foreign events.
pub fn day_lines(session: &mut Session, date: NaiveDate) -> Vec<String> {
    let settings = session.config.settings.clone();
    let day = session.store.get_day(date);

    if day.is_empty() {
        return vec!["Nothing planned".dimmed().to_string()];
    }

    let mut lines: Vec<String> = day
        .reminders
        .iter()
        .filter_map(|entry| session.store.get(&entry.reminder_id))
        .map(|reminder| reminder.render(&settings))
        .collect();
    lines.extend(day.foreign.iter().map(|entry| entry.render(&settings)));
    lines
}

pub fn print_failures(failures: &[(String, String)]) {
    for (provider, message) in failures {
        eprintln!(
            "{} {}",
            format!("Could not refresh {}:", provider).yellow(),
            message
        );
    }
}
