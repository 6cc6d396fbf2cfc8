use anyhow::Result;
use chrono::Local;
use remindcal_core::reminder::ReminderDraft;
use remindcal_core::time::validate_range;

use crate::args::ReminderArgs;
use crate::render::Render;
use crate::session::Session;

pub fn run(session: &mut Session, text: String, args: ReminderArgs) -> Result<()> {
    let anchor = args.date()?.unwrap_or_else(|| Local::now().date_naive());
    let first_weekday = session.store.options().first_weekday;

    let mut draft = ReminderDraft::new(text, anchor);
    if let Some(range) = validate_range(args.from.as_deref(), args.to.as_deref())? {
        draft = draft.with_range(range);
    }
    if let Some(Some(rule)) = args.rule(None, anchor, first_weekday)? {
        draft = draft.with_repeat(rule);
    }
    if let Some(Some(notify)) = args.notify()? {
        draft = draft.with_notify(notify);
    }
    if let Some(color) = args.color {
        draft.color = color;
    }
    if let Some(description) = args.description {
        draft.description = description;
    }

    let settings = session.config.settings.clone();
    let reminder = session.store.add(draft)?;
    println!("Created {} {}", reminder.anchor, reminder.render(&settings));

    Ok(())
}
