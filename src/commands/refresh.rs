use anyhow::Result;
use chrono::Local;
use owo_colors::OwoColorize;
use remindcal_core::date_range::{DateWindow, parse_date};
use remindcal_core::remote::refresh_external;

use super::REFRESH_DAYS;
use crate::render::{Render, date_label, pluralize};
use crate::session::Session;

pub async fn run(
    session: &mut Session,
    provider: &str,
    from: Option<&str>,
    to: Option<&str>,
) -> Result<()> {
    let today = Local::now().date_naive();
    let start = from.map(parse_date).transpose()?.unwrap_or(today);
    let window = match to {
        Some(to) => DateWindow::new(start, parse_date(to)?)?,
        None => DateWindow::starting_at(start, REFRESH_DAYS),
    };

    let remote = session.remote(provider)?;
    println!("Refreshing {} ({} to {})", provider, window.start, window.end);

    if let Some(message) = refresh_external(&mut session.store, &remote, window).await {
        anyhow::bail!("Could not refresh {}: {}", provider, message);
    }

    let settings = session.config.settings.clone();
    let mut total = 0;
    for date in window.start.iter_days().take_while(|d| *d <= window.end) {
        let day = session.store.get_day(date);
        if day.foreign.is_empty() {
            continue;
        }
        println!("{}", date_label(date, today, &settings.date_locale).bold());
        for entry in &day.foreign {
            println!("  {}", entry.render(&settings));
        }
        total += day.foreign.len();
    }

    println!(
        "{}",
        format!("{} {}", total, pluralize("event", total)).dimmed()
    );
    Ok(())
}
