use anyhow::Result;
use owo_colors::OwoColorize;
use remindcal_core::time::validate_range;

pub fn run(from: &str, to: Option<&str>) -> Result<()> {
    match validate_range(Some(from), to)? {
        Some(range) => match range.to() {
            Some(to) => println!("{} {} to {}", "ok".green(), range.from(), to),
            None => println!("{} at {}", "ok".green(), range.from()),
        },
        None => println!("{} all-day", "ok".green()),
    }
    Ok(())
}
