//! Reminder registration commands.

use chrono::Local;
use clap::Subcommand;
use meditimer_core::reminders::{parse_time_of_day, parse_weekdays};
use meditimer_core::{Config, Database, LocalReminderScheduler, ReminderId, ReminderScheduler};

#[derive(Subcommand)]
pub enum ReminderAction {
    /// Register a weekly reminder for each selected day
    Add {
        /// Time of day, 24-hour HH:MM
        #[arg(long)]
        at: String,
        /// Comma-separated days (mon,wed or 0-6 with 0 = Sunday), or daily/weekdays/weekends
        #[arg(long)]
        days: String,
        /// Notification title (defaults to reminders.title)
        #[arg(long)]
        title: Option<String>,
        /// Notification body (defaults to reminders.body)
        #[arg(long)]
        body: Option<String>,
    },
    /// List registered reminders
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Cancel one reminder by id
    Cancel {
        id: String,
    },
    /// Show when each reminder fires next
    Next,
}

pub fn run(action: ReminderAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let mut scheduler = LocalReminderScheduler::new(&db);

    match action {
        ReminderAction::Add {
            at,
            days,
            title,
            body,
        } => {
            let config = Config::load()?;
            let time = parse_time_of_day(&at)?;
            let weekdays = parse_weekdays(&days)?;
            let ids = scheduler.schedule(
                time,
                &weekdays,
                title.as_deref().unwrap_or(&config.reminders.title),
                body.as_deref().unwrap_or(&config.reminders.body),
            )?;
            for id in ids {
                println!("{id}");
            }
        }
        ReminderAction::List { json } => {
            let reminders = scheduler.list()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&reminders)?);
            } else if reminders.is_empty() {
                println!("No reminders registered.");
            } else {
                for r in reminders {
                    println!("{}  {} {}  {}", r.id, r.weekday, r.time.format("%H:%M"), r.title);
                }
            }
        }
        ReminderAction::Cancel { id } => {
            let id: ReminderId = id.parse()?;
            let removed = scheduler.cancel(id)?;
            println!(
                "cancelled {} {} reminder",
                removed.weekday,
                removed.time.format("%H:%M")
            );
        }
        ReminderAction::Next => {
            let upcoming = scheduler.upcoming(Local::now().naive_local())?;
            if upcoming.is_empty() {
                println!("No reminders registered.");
            }
            for (reminder, at) in upcoming {
                println!("{}  {}", at.format("%a %Y-%m-%d %H:%M"), reminder.id);
            }
        }
    }
    Ok(())
}
