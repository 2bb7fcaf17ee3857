//! Foreground session: a live countdown driven by the async runner.
//!
//! While the session runs, type `p` to pause, `r` to resume and `s` (or
//! `q`) to stop. Ctrl-C also stops the session and records it.

use std::io::Write;
use std::time::Duration;

use clap::Subcommand;
use meditimer_core::timer::{format_duration, Command};
use meditimer_core::{Config, Database, Event, HistoryStore, SessionConfig, SessionRunner};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use super::describe;

#[derive(Subcommand)]
pub enum SessionAction {
    /// Count down a meditation phase followed by a rest phase
    Run {
        /// Meditation length, SS or M:SS (defaults to timer.default_meditation_secs)
        #[arg(long, short)]
        meditation: Option<String>,
        /// Rest length, SS or M:SS (defaults to timer.default_rest_secs)
        #[arg(long, short)]
        rest: Option<String>,
        /// Print every event as a JSON line instead of a live display
        #[arg(long)]
        json: bool,
        /// Tick period in milliseconds
        #[arg(long, default_value_t = 1000, hide = true)]
        tick_ms: u64,
    },
}

pub fn run(action: SessionAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        SessionAction::Run {
            meditation,
            rest,
            json,
            tick_ms,
        } => {
            let config = Config::load()?;
            let session = config.session_from_input(meditation.as_deref(), rest.as_deref());
            if session.is_empty() {
                return Err("nothing to time: meditation and rest are both zero".into());
            }

            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            let result = runtime.block_on(drive(session, json, Duration::from_millis(tick_ms.max(1))));
            // A pending stdin read can't be cancelled; don't wait for it.
            runtime.shutdown_background();
            result
        }
    }
}

fn parse_command(line: &str) -> Option<Command> {
    match line.trim().to_ascii_lowercase().as_str() {
        "p" | "pause" => Some(Command::Pause),
        "r" | "resume" => Some(Command::Resume),
        "s" | "stop" | "q" | "quit" => Some(Command::Stop),
        _ => None,
    }
}

async fn drive(
    session: SessionConfig,
    json: bool,
    period: Duration,
) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();

    let stdin_tx = cmd_tx.clone();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if let Some(command) = parse_command(&line) {
                if stdin_tx.send(command).is_err() {
                    break;
                }
            }
        }
    });

    let signal_tx = cmd_tx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = signal_tx.send(Command::Stop);
        }
    });

    let mut runner = SessionRunner::new(HistoryStore::new(&db), event_tx).with_period(period);
    runner.start(session);

    {
        let run = runner.run(cmd_rx);
        tokio::pin!(run);
        loop {
            tokio::select! {
                _ = &mut run => break,
                Some(event) = event_rx.recv() => render(&event, json)?,
            }
        }
    }
    while let Ok(event) = event_rx.try_recv() {
        render(&event, json)?;
    }
    // Held until here so closing stdin never ends the session.
    drop(cmd_tx);
    Ok(())
}

fn render(event: &Event, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string(event)?);
        return Ok(());
    }
    let mut stdout = std::io::stdout();
    match event {
        Event::Tick {
            phase,
            remaining_secs,
            ..
        } => {
            write!(stdout, "\r{phase:<10} {:>6} remaining", format_duration(*remaining_secs))?;
            stdout.flush()?;
        }
        other => {
            if let Some(line) = describe(other) {
                writeln!(stdout, "\r{line:<40}")?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_interactive_commands() {
        assert_eq!(parse_command("p"), Some(Command::Pause));
        assert_eq!(parse_command(" Resume "), Some(Command::Resume));
        assert_eq!(parse_command("q"), Some(Command::Stop));
        assert_eq!(parse_command("hello"), None);
    }
}
