use clap::Subcommand;
use meditimer_core::timer::now_ms;
use meditimer_core::{Config, Database, DetachedSession, Event, HistoryStore};

const SESSION_KEY: &str = "timer_session";

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start a session that keeps counting between invocations
    Start {
        /// Meditation length, SS or M:SS (defaults to timer.default_meditation_secs)
        #[arg(long, short)]
        meditation: Option<String>,
        /// Rest length, SS or M:SS (defaults to timer.default_rest_secs)
        #[arg(long, short)]
        rest: Option<String>,
    },
    /// Pause the running session
    Pause,
    /// Resume a paused session
    Resume,
    /// End the session early and record it
    Stop,
    /// Print current timer state as JSON
    Status,
}

/// Load the stored session. A blob that no longer decodes is reported and
/// replaced by an idle session.
fn load_session(db: &Database) -> Result<DetachedSession, Box<dyn std::error::Error>> {
    let Some(json) = db.kv_get(SESSION_KEY)? else {
        return Ok(DetachedSession::new());
    };
    match serde_json::from_str::<DetachedSession>(&json) {
        Ok(session) => Ok(session),
        Err(e) => {
            tracing::warn!(error = %e, "discarding unreadable timer session");
            eprintln!("warning: stored timer session is unreadable and was reset: {e}");
            Ok(DetachedSession::new())
        }
    }
}

fn save_session(db: &Database, session: &DetachedSession) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string(session)?;
    db.kv_set(SESSION_KEY, &json)?;
    Ok(())
}

/// Print non-tick events and hand completions to the history store.
///
/// A failed history write is reported but does not fail the command.
fn emit(db: &Database, events: &[Event]) -> Result<(), Box<dyn std::error::Error>> {
    let history = HistoryStore::new(db);
    for event in events.iter().filter(|e| !e.is_tick()) {
        println!("{}", serde_json::to_string_pretty(event)?);
        if let Some(entry) = event.completed_entry() {
            if let Err(e) = history.append(entry) {
                tracing::error!(error = %e, "failed to append history entry");
                eprintln!("warning: session not saved to history: {e}");
            }
        }
    }
    Ok(())
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let mut session = load_session(&db)?;
    let now = now_ms();

    let events = match action {
        TimerAction::Start { meditation, rest } => {
            let config = Config::load()?;
            let session_config = config.session_from_input(meditation.as_deref(), rest.as_deref());
            if session_config.is_empty() {
                return Err("nothing to time: meditation and rest are both zero".into());
            }
            session.start(session_config, now)
        }
        TimerAction::Pause => session.pause(now),
        TimerAction::Resume => session.resume(now),
        TimerAction::Stop => session.stop(now),
        TimerAction::Status => session.catch_up(now),
    };

    emit(&db, &events)?;
    println!("{}", serde_json::to_string_pretty(&session.timer().snapshot())?);
    save_session(&db, &session)?;
    Ok(())
}
