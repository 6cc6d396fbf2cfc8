use anyhow::Result;
use chrono::Local;
use owo_colors::OwoColorize;
use remindcal_core::date_range::parse_date;

use crate::render::{Render, date_label};
use crate::session::Session;

pub fn run(session: &Session, n: usize, from: Option<&str>) -> Result<()> {
    let today = Local::now().date_naive();
    let from = from.map(parse_date).transpose()?.unwrap_or(today);
    let settings = &session.config.settings;
    let locale = &settings.date_locale;

    let mut current_date = None;
    for item in session.store.get_upcoming(n, from) {
        let date = item.occurrence.date;
        if current_date != Some(date) {
            if current_date.is_some() {
                println!();
            }
            println!("{}", date_label(date, today, locale).bold());
            current_date = Some(date);
        }
        println!("  {}", item.reminder.render(settings));
    }

    if current_date.is_none() {
        println!("{}", "No upcoming reminders".dimmed());
    }

    Ok(())
}

pub fn next(session: &Session) -> Result<()> {
    let now = Local::now().naive_local();
    let settings = session.config.settings.clone();

    match session.store.next_notification(now) {
        Some(notification) => {
            let today = now.date();
            let label = date_label(notification.at.date(), today, &settings.date_locale);
            println!(
                "{} {} {}",
                label.bold(),
                notification.at.format("%H:%M"),
                notification.reminder.render(&settings)
            );
        }
        None => println!("{}", "No notifications scheduled".dimmed()),
    }

    Ok(())
}
