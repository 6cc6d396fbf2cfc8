mod args;
mod commands;
mod render;
mod session;

use anyhow::Result;
use clap::{Parser, Subcommand};

use args::ReminderArgs;
use session::Session;

#[derive(Parser)]
#[command(name = "remindcal")]
#[command(about = "Recurring reminders, with events from your other calendars alongside")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a reminder
    Add {
        /// Reminder text
        text: String,

        #[command(flatten)]
        args: ReminderArgs,
    },
    /// Change an existing reminder
    Edit {
        /// Reminder id (a unique prefix is enough)
        id: String,

        /// New reminder text
        #[arg(long)]
        text: Option<String>,

        #[command(flatten)]
        args: ReminderArgs,
    },
    /// Remove a reminder (can be undone for a few seconds)
    Remove {
        id: String,
    },
    /// Restore a just-removed reminder
    Undo {
        id: String,
    },
    /// Delete a removed reminder right away
    Confirm {
        id: String,
    },
    /// Show everything on one day
    Day {
        /// Date (YYYY-MM-DD), defaults to today
        date: Option<String>,

        /// Also fetch events from configured remotes
        #[arg(short, long)]
        remotes: bool,
    },
    /// Show a month grid
    Month {
        /// Month (YYYY-MM), defaults to the current month
        month: Option<String>,

        /// Also fetch events from configured remotes
        #[arg(short, long)]
        remotes: bool,
    },
    /// List the next occurrences across all reminders
    Upcoming {
        /// How many occurrences to show
        #[arg(short, default_value_t = 10)]
        n: usize,

        /// Start date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        from: Option<String>,
    },
    /// Show the next notification that will fire
    Next,
    /// Check a from/to time pair (e.g. "09:00" "9:30 am")
    CheckRange {
        from: String,
        to: Option<String>,
    },
    /// Fetch and list events from a remote calendar
    Refresh {
        /// Provider name, as configured under [remotes.<name>]
        provider: String,

        /// First date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        from: Option<String>,

        /// Last date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,
    },
    /// Connect a remote calendar account
    Connect {
        provider: String,
    },
    /// Stop syncing a remote calendar
    Disconnect {
        provider: String,
    },
    /// Forget the credentials of a remote calendar
    SignOut {
        provider: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Range checks need neither config nor the store
    if let Commands::CheckRange { from, to } = &cli.command {
        return commands::check_range::run(from, to.as_deref());
    }

    let mut session = Session::open()?;

    match cli.command {
        Commands::Add { text, args } => commands::add::run(&mut session, text, args)?,
        Commands::Edit { id, text, args } => commands::edit::run(&mut session, &id, text, args)?,
        Commands::Remove { id } => commands::remove::run(&mut session, &id)?,
        Commands::Undo { id } => commands::remove::undo(&mut session, &id)?,
        Commands::Confirm { id } => commands::remove::confirm(&mut session, &id)?,
        Commands::Day { date, remotes } => {
            commands::day::run(&mut session, date.as_deref(), remotes).await?
        }
        Commands::Month { month, remotes } => {
            commands::month::run(&mut session, month.as_deref(), remotes).await?
        }
        Commands::Upcoming { n, from } => commands::upcoming::run(&session, n, from.as_deref())?,
        Commands::Next => commands::upcoming::next(&session)?,
        Commands::Refresh { provider, from, to } => {
            commands::refresh::run(&mut session, &provider, from.as_deref(), to.as_deref()).await?
        }
        Commands::Connect { provider } => commands::remote::connect(&session, &provider).await?,
        Commands::Disconnect { provider } => {
            commands::remote::disconnect(&mut session, &provider).await?
        }
        Commands::SignOut { provider } => commands::remote::sign_out(&session, &provider).await?,
        Commands::CheckRange { .. } => {}
    }

    session.save()
}
