//! Plain-text history export.

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::storage::{data_dir, HistoryEntry};

/// Default export location inside the data directory.
pub fn default_export_path() -> Result<PathBuf> {
    Ok(data_dir()?.join("meditation_history.txt"))
}

/// Render the history as text: a header, then one line per entry.
pub fn render_history(entries: &[HistoryEntry]) -> String {
    let mut out = String::from("Meditation History\n");
    if entries.is_empty() {
        out.push_str("No meditation history available.\n");
        return out;
    }
    for entry in entries {
        out.push_str(&entry.display_line());
        out.push('\n');
    }
    out
}

/// Write the rendered history to `path`, replacing any existing file.
pub fn export_history(entries: &[HistoryEntry], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = std::fs::File::create(path)?;
    file.write_all(render_history(entries).as_bytes())?;
    file.flush()?;
    tracing::info!(path = %path.display(), count = entries.len(), "history exported");
    Ok(())
}
