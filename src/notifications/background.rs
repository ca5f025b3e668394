//! Background reminder checker.
//!
//! Spawns a thread that runs every reminder check once per interval
//! against the database at `db_path`, until shut down.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;

use super::checks::{run_all_checks, CheckSummary};
use super::dispatch::Notifier;
use crate::store::SqliteStore;

/// Sleep granularity for shutdown responsiveness.
const SLEEP_GRANULARITY_MS: u64 = 250;

/// Handle for the checker thread.
///
/// Shuts down via `shutdown()` or automatically on `Drop`.
pub struct ReminderCheckerHandle {
    shutdown: Arc<AtomicBool>,
    handle: Option<std::thread::JoinHandle<()>>,
}

impl ReminderCheckerHandle {
    /// Request shutdown. A pass already running completes first.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Shut down and wait for the thread to exit.
    pub fn join(mut self) {
        self.shutdown();
        if let Some(h) = self.handle.take() {
            let _ = h.join();
        }
    }
}

impl Drop for ReminderCheckerHandle {
    fn drop(&mut self) {
        self.shutdown();
        if let Some(h) = self.handle.take() {
            let _ = h.join();
        }
    }
}

/// Start the checker. The first pass runs immediately.
pub fn start_reminder_checker(
    db_path: PathBuf,
    notifier: Arc<dyn Notifier>,
    interval: Duration,
) -> ReminderCheckerHandle {
    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = shutdown.clone();

    let handle = std::thread::spawn(move || {
        tracing::info!(
            interval_secs = interval.as_secs(),
            db = %db_path.display(),
            "Reminder checker started"
        );
        checker_loop(&db_path, notifier.as_ref(), interval, &flag);
    });

    ReminderCheckerHandle {
        shutdown,
        handle: Some(handle),
    }
}

fn checker_loop(
    db_path: &Path,
    notifier: &dyn Notifier,
    interval: Duration,
    shutdown: &AtomicBool,
) {
    let ticks = (interval.as_millis() / u128::from(SLEEP_GRANULARITY_MS)).max(1);
    while !shutdown.load(Ordering::Relaxed) {
        if let Err(e) = run_pass(db_path, notifier) {
            tracing::warn!(error = %e, "Reminder check failed");
        }

        // Sleep in small increments for responsive shutdown
        for _ in 0..ticks {
            if shutdown.load(Ordering::Relaxed) {
                break;
            }
            std::thread::sleep(Duration::from_millis(SLEEP_GRANULARITY_MS));
        }
    }
    tracing::info!("Reminder checker shutting down");
}

fn run_pass(db_path: &Path, notifier: &dyn Notifier) -> Result<CheckSummary, String> {
    let store = SqliteStore::open(db_path).map_err(|e| format!("Cannot open store: {e}"))?;
    run_all_checks(&store, &Local::now(), notifier).map_err(|e| e.to_string())
}
