//! Profile field commands.

use clap::Subcommand;
use meditimer_core::{Config, Database, ProfileStore};

#[derive(Subcommand)]
pub enum ProfileAction {
    /// Show the profile
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Set the display name
    SetName {
        name: String,
    },
    /// Set the daily meditation goal in minutes
    SetGoal {
        minutes: u32,
    },
}

pub fn run(action: ProfileAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let db = Database::open()?;
    let store = ProfileStore::new(&db).with_default_goal(config.profile.default_daily_goal_min);

    match action {
        ProfileAction::Show { json } => {
            let profile = store.load()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&profile)?);
            } else {
                let name = if profile.name.is_empty() {
                    "(not set)"
                } else {
                    profile.name.as_str()
                };
                println!("Name: {name}");
                println!("Daily goal: {} min", profile.daily_goal_min);
            }
        }
        ProfileAction::SetName { name } => {
            store.set_name(&name)?;
            println!("ok");
        }
        ProfileAction::SetGoal { minutes } => {
            store.set_daily_goal_min(minutes)?;
            println!("ok");
        }
    }
    Ok(())
}
