mod config;
pub mod database;
pub mod history;
pub mod profile;

pub use config::{Config, ProfileConfig, RemindersConfig, TimerConfig};
pub use database::Database;
pub use history::{CompletionReason, HistoryEntry, HistoryStore, HistorySummary, HISTORY_KEY};
pub use profile::{Profile, ProfileStore};

use std::path::PathBuf;

use crate::error::StorageError;

/// Returns the application data directory, creating it if needed.
///
/// `MEDITIMER_DATA_DIR` overrides the location outright. Otherwise this is
/// `~/.config/meditimer[-dev]/`, with `MEDITIMER_ENV=dev` selecting the
/// development directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, StorageError> {
    let dir = match std::env::var_os("MEDITIMER_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("MEDITIMER_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("meditimer-dev")
            } else {
                base_dir.join("meditimer")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| StorageError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
