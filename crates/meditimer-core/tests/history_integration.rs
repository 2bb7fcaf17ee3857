//! Integration tests wiring the runner, history store and export together.

use chrono::Local;
use meditimer_core::export::{export_history, render_history};
use meditimer_core::storage::history::HISTORY_KEY;
use meditimer_core::{
    CompletionReason, Database, Event, HistoryStore, SessionConfig, SessionRunner,
};
use tokio::sync::mpsc;

#[tokio::test(start_paused = true)]
async fn completed_session_lands_in_history() {
    let db = Database::open_memory().unwrap();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let (_cmd_tx, cmd_rx) = mpsc::unbounded_channel();

    let mut runner = SessionRunner::new(HistoryStore::new(&db), tx);
    runner.start(SessionConfig::new(2, 1));
    runner.run(cmd_rx).await;
    drop(runner);

    let mut phase_changes = 0;
    while let Ok(event) = rx.try_recv() {
        if matches!(event, Event::PhaseChanged { .. }) {
            phase_changes += 1;
        }
    }
    assert_eq!(phase_changes, 1);

    let entries = HistoryStore::new(&db).load().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].duration_secs, 3);
    assert_eq!(entries[0].reason, CompletionReason::Finished);

    let summary = HistoryStore::new(&db)
        .summary(Local::now().date_naive(), 1)
        .unwrap();
    assert_eq!(summary.today_sessions, 1);
    assert!(!summary.goal_met);
}

#[tokio::test(start_paused = true)]
async fn stopped_sessions_are_recorded_once() {
    let db = Database::open_memory().unwrap();
    let (tx, _rx) = mpsc::unbounded_channel();
    let mut runner = SessionRunner::new(HistoryStore::new(&db), tx);

    runner.start(SessionConfig::new(30, 30));
    runner.next_tick().await;
    runner.next_tick().await;
    runner.stop();
    runner.stop();
    assert!(!runner.has_live_ticker());
    drop(runner);

    let entries = HistoryStore::new(&db).load().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].duration_secs, 2);
    assert_eq!(entries[0].reason, CompletionReason::Stopped);
}

#[test]
fn legacy_blob_is_readable_and_extendable() {
    let db = Database::open_memory().unwrap();
    db.kv_set(
        HISTORY_KEY,
        r#"[{"year":2023,"month":1,"day":9,"hour":7,"minute":3,"duration":"10:00"}]"#,
    )
    .unwrap();

    let store = HistoryStore::new(&db);
    let entry = meditimer_core::HistoryEntry::new(
        Local::now().naive_local(),
        90,
        CompletionReason::Finished,
    );
    store.append(&entry).unwrap();

    let entries = store.load().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].duration_secs, 600);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.txt");
    export_history(&entries, &path).unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), render_history(&entries));
}
