//! Reminder, preference and notification log commands.

use std::time::Duration;

use chrono::Local;

use super::appointment::MAX_REMINDER_MINUTES;
use super::{open, validate_time};
use crate::core_state::CoreState;
use crate::models::{
    NotificationLogEntry, NotificationPrefs, NotificationPrefsPatch, RemindersState,
};
use crate::notifications::{
    self as notif, start_reminder_checker, CheckSummary, ReminderCheckerHandle,
};
use crate::therapy as plan;

pub fn get_reminders(state: &CoreState) -> Result<RemindersState, String> {
    let store = open(state)?;
    notif::load_reminders(&store).map_err(|e| e.to_string())
}

/// Set or clear the daily reminder of a therapy in the plan.
pub fn set_medicine_reminder(
    therapy_id: u32,
    time: &str,
    enabled: bool,
    state: &CoreState,
) -> Result<(), String> {
    validate_time(time)?;
    let store = open(state)?;
    let therapy_plan = plan::load_therapy_plan(&store).map_err(|e| e.to_string())?;
    if !therapy_plan.iter().any(|t| t.id == therapy_id) {
        return Err(format!("No therapy with id {therapy_id}"));
    }
    notif::set_medicine_reminder(&store, therapy_id, time, enabled).map_err(|e| e.to_string())
}

pub fn get_prefs(state: &CoreState) -> Result<NotificationPrefs, String> {
    let store = open(state)?;
    notif::get_notification_prefs(&store).map_err(|e| e.to_string())
}

pub fn set_prefs(
    patch: NotificationPrefsPatch,
    state: &CoreState,
) -> Result<NotificationPrefs, String> {
    if let Some(m) = patch.appointment_minutes_before {
        if m > MAX_REMINDER_MINUTES {
            return Err(format!(
                "Reminder lead time must be at most {MAX_REMINDER_MINUTES} minutes"
            ));
        }
    }
    let store = open(state)?;
    let therapy_plan = plan::load_therapy_plan(&store).map_err(|e| e.to_string())?;
    notif::set_notification_prefs(&store, patch, &therapy_plan).map_err(|e| e.to_string())
}

/// Log entries, newest first.
pub fn notification_log(state: &CoreState) -> Result<Vec<NotificationLogEntry>, String> {
    let store = open(state)?;
    let mut log = notif::get_notification_log(&store).map_err(|e| e.to_string())?;
    log.reverse();
    Ok(log)
}

pub fn mark_read(id: &str, state: &CoreState) -> Result<(), String> {
    let store = open(state)?;
    if notif::mark_notification_read(&store, id).map_err(|e| e.to_string())? {
        Ok(())
    } else {
        Err(format!("No notification with id {id}"))
    }
}

pub fn mark_all_read(state: &CoreState) -> Result<(), String> {
    let store = open(state)?;
    notif::mark_all_notifications_read(&store).map_err(|e| e.to_string())
}

/// Run every reminder check once, now.
pub fn check_now(state: &CoreState) -> Result<CheckSummary, String> {
    let store = open(state)?;
    let notifier = state.notifier();
    notif::run_all_checks(&store, &Local::now(), notifier.as_ref()).map_err(|e| e.to_string())
}

/// Start the background checker on the state's database.
pub fn start_watch(state: &CoreState, interval: Duration) -> ReminderCheckerHandle {
    start_reminder_checker(state.db_path.clone(), state.notifier(), interval)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::super::test_state;
    use super::*;
    use crate::commands::therapy;
    use crate::notifications::dispatch::RecordingNotifier;
    use crate::notifications::NotificationPermission;

    #[test]
    fn medicine_reminder_needs_known_therapy() {
        let (_dir, state) = test_state();
        assert!(set_medicine_reminder(1, "08:00", true, &state).is_err());

        therapy::seed_default_plan(&state).unwrap();
        assert!(set_medicine_reminder(1, "8:00", true, &state).is_err());
        set_medicine_reminder(1, "07:45", true, &state).unwrap();
        assert_eq!(get_reminders(&state).unwrap().medicine["1"].time, "07:45");
    }

    #[test]
    fn prefs_toggle_clears_medicine_reminders() {
        let (_dir, state) = test_state();
        therapy::seed_default_plan(&state).unwrap();
        assert_eq!(get_reminders(&state).unwrap().medicine.len(), 4);

        let off = NotificationPrefsPatch {
            medicine_enabled: Some(false),
            ..Default::default()
        };
        assert!(!set_prefs(off, &state).unwrap().medicine_enabled);
        assert!(get_reminders(&state).unwrap().medicine.is_empty());

        let too_long = NotificationPrefsPatch {
            appointment_minutes_before: Some(MAX_REMINDER_MINUTES + 1),
            ..Default::default()
        };
        assert!(set_prefs(too_long, &state).is_err());
    }

    #[test]
    fn log_newest_first_and_read_marks() {
        let (_dir, state) = test_state();
        {
            let store = state.open_store().unwrap();
            notif::push_notification_log(&store, "Dyna", "prima", 1_000).unwrap();
            notif::push_notification_log(&store, "Dyna", "seconda", 2_000).unwrap();
        }
        let log = notification_log(&state).unwrap();
        assert_eq!(log[0].body, "seconda");

        mark_read(&log[0].id, &state).unwrap();
        assert!(mark_read("n-0-missing", &state).is_err());
        mark_all_read(&state).unwrap();
        assert!(notification_log(&state).unwrap().iter().all(|e| e.read));
    }

    #[test]
    fn check_now_with_empty_store() {
        let (_dir, state) = test_state();
        let notifier = Arc::new(RecordingNotifier::new(NotificationPermission::Granted));
        let state = state.with_notifier(notifier.clone());
        assert_eq!(check_now(&state).unwrap().total(), 0);
        assert!(notifier.shown().is_empty());
    }
}
