use anyhow::Result;
use owo_colors::OwoColorize;

use crate::render::short_id;
use crate::session::Session;

pub fn run(session: &mut Session, id: &str) -> Result<()> {
    let id = session.resolve_id(id)?;
    session.store.remove(&id)?;

    println!("Removed {}", short_id(&id));
    println!(
        "{}",
        format!(
            "Run `remindcal undo {}` within {}s to restore it",
            short_id(&id),
            session.config.undo_timeout_secs
        )
        .dimmed()
    );
    Ok(())
}

pub fn undo(session: &mut Session, id: &str) -> Result<()> {
    // Removals past their undo window were purged when the session opened
    let Ok(id) = session.resolve_removed_id(id) else {
        println!("{}", "Nothing to restore".dimmed());
        return Ok(());
    };

    if session.store.undo(&id) {
        println!("Restored {}", short_id(&id));
    } else {
        println!("{}", "Too late to restore, the reminder is deleted".dimmed());
    }
    Ok(())
}

pub fn confirm(session: &mut Session, id: &str) -> Result<()> {
    let id = session.resolve_removed_id(id)?;
    let reminder = session.store.confirm_removal(&id)?;
    println!("Deleted {} ({})", reminder.text, short_id(&id));
    Ok(())
}
