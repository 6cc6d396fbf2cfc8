use anyhow::Result;
use remindcal_core::reminder::ReminderPatch;
use remindcal_core::time::validate_range;

use crate::args::ReminderArgs;
use crate::render::Render;
use crate::session::Session;

pub fn run(session: &mut Session, id: &str, text: Option<String>, args: ReminderArgs) -> Result<()> {
    let id = session.resolve_id(id)?;
    let Some(current) = session.store.get(&id) else {
        return Err(remindcal_core::RemindError::NotFound(id).into());
    };

    let anchor = args.date()?;
    let range = if args.all_day {
        Some(None)
    } else if args.from.is_some() || args.to.is_some() {
        // Changing only the end keeps the current start
        let from = args
            .from
            .clone()
            .or_else(|| current.range.map(|r| r.from().to_string()));
        Some(validate_range(from.as_deref(), args.to.as_deref())?)
    } else {
        None
    };

    let patch = ReminderPatch {
        anchor,
        range,
        repeat: args.rule(
            current.repeat.as_ref(),
            anchor.unwrap_or(current.anchor),
            session.store.options().first_weekday,
        )?,
        notify: args.notify()?,
        color: args.color,
        text,
        description: args.description,
    };

    if patch.is_empty() {
        anyhow::bail!("Nothing to change. Pass at least one option, see `remindcal edit --help`");
    }

    let settings = session.config.settings.clone();
    let reminder = session.store.edit(&id, patch)?;
    println!("Updated {} {}", reminder.anchor, reminder.render(&settings));

    Ok(())
}
