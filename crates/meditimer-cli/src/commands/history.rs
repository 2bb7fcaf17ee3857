use std::path::PathBuf;

use chrono::Local;
use clap::Subcommand;
use meditimer_core::export::{default_export_path, export_history};
use meditimer_core::timer::format_duration;
use meditimer_core::{Config, Database, HistoryStore, ProfileStore};

#[derive(Subcommand)]
pub enum HistoryAction {
    /// List recorded sessions, oldest first
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Totals, today's progress and streak
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write the history to a text file
    Export {
        /// Destination (defaults to meditation_history.txt in the data directory)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

pub fn run(action: HistoryAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let store = HistoryStore::new(&db);

    match action {
        HistoryAction::List { json } => {
            let entries = store.load()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else if entries.is_empty() {
                println!("No meditation history available.");
            } else {
                for entry in &entries {
                    println!("{}", entry.display_line());
                }
            }
        }
        HistoryAction::Stats { json } => {
            let config = Config::load()?;
            let goal = ProfileStore::new(&db)
                .with_default_goal(config.profile.default_daily_goal_min)
                .daily_goal_min()?;
            let summary = store.summary(Local::now().date_naive(), goal)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("Sessions: {}", summary.total_sessions);
                println!("Total time: {}", format_duration(summary.total_secs));
                println!(
                    "Today: {} / {} ({})",
                    format_duration(summary.today_secs),
                    format_duration(summary.daily_goal_secs),
                    if summary.goal_met { "goal met" } else { "in progress" }
                );
                println!("Streak: {} day(s)", summary.streak_days);
            }
        }
        HistoryAction::Export { output } => {
            let path = match output {
                Some(path) => path,
                None => default_export_path()?,
            };
            let entries = store.load()?;
            export_history(&entries, &path)?;
            println!("Exported {} session(s) to {}", entries.len(), path.display());
        }
    }
    Ok(())
}
