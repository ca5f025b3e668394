//! Handing notifications to the platform.

use std::sync::Mutex;

use crate::db::DatabaseError;
use crate::store::KeyValueStore;

use super::push_notification_log;

/// Permission state reported by the platform notifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationPermission {
    Granted,
    Denied,
    Default,
}

/// Platform notification surface.
pub trait Notifier: Send + Sync {
    fn permission(&self) -> NotificationPermission;
    fn show(&self, title: &str, body: &str);
}

/// Show a notification if permitted and record it in the log.
///
/// Returns whether it was shown. Callers record their dedup marker
/// either way, so a denied notification is not retried every minute.
pub fn dispatch(
    store: &dyn KeyValueStore,
    notifier: &dyn Notifier,
    title: &str,
    body: &str,
    at: i64,
) -> Result<bool, DatabaseError> {
    if notifier.permission() != NotificationPermission::Granted {
        tracing::debug!(title, "Notification permission not granted, skipping");
        return Ok(false);
    }
    push_notification_log(store, title, body, at)?;
    notifier.show(title, body);
    tracing::info!(title, "Notification shown");
    Ok(true)
}

/// Notifier that prints to the terminal.
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn permission(&self) -> NotificationPermission {
        NotificationPermission::Granted
    }

    fn show(&self, title: &str, body: &str) {
        println!("[{title}] {body}");
    }
}

/// Notifier that keeps what it was asked to show.
pub struct RecordingNotifier {
    permission: NotificationPermission,
    shown: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub fn new(permission: NotificationPermission) -> Self {
        Self {
            permission,
            shown: Mutex::new(Vec::new()),
        }
    }

    pub fn shown(&self) -> Vec<(String, String)> {
        self.shown.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl Notifier for RecordingNotifier {
    fn permission(&self) -> NotificationPermission {
        self.permission
    }

    fn show(&self, title: &str, body: &str) {
        if let Ok(mut shown) = self.shown.lock() {
            shown.push((title.to_string(), body.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::get_notification_log;
    use crate::store::MemoryStore;

    #[test]
    fn granted_shows_and_logs() {
        let store = MemoryStore::new();
        let notifier = RecordingNotifier::new(NotificationPermission::Granted);
        assert!(dispatch(&store, &notifier, "Dyna", "ciao", 1_000).unwrap());
        assert_eq!(notifier.shown(), vec![("Dyna".to_string(), "ciao".to_string())]);
        let log = get_notification_log(&store).unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].at, 1_000);
        assert!(!log[0].read);
    }

    #[test]
    fn denied_neither_shows_nor_logs() {
        let store = MemoryStore::new();
        for permission in [NotificationPermission::Denied, NotificationPermission::Default] {
            let notifier = RecordingNotifier::new(permission);
            assert!(!dispatch(&store, &notifier, "Dyna", "ciao", 1_000).unwrap());
            assert!(notifier.shown().is_empty());
        }
        assert!(get_notification_log(&store).unwrap().is_empty());
    }
}
