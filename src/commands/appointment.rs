//! Appointment commands.
//!
//! Appointments live inside day entries; their reminders live in the
//! reminder state and are created with the default lead time unless the
//! caller gives one.

use chrono::NaiveDate;

use super::{open, validate_time, MAX_NAME_LEN};
use crate::config::APPOINTMENT_LOOKAHEAD_DAYS;
use crate::core_state::CoreState;
use crate::day_entries::{self, UpcomingAppointment};
use crate::models::{AppointmentDraft, DayAppointment};
use crate::notifications as notif;
use crate::store::SqliteStore;

/// Longest accepted reminder lead time: one week.
pub const MAX_REMINDER_MINUTES: u32 = 7 * 24 * 60;

fn validate_draft(draft: &AppointmentDraft) -> Result<(), String> {
    validate_time(&draft.time)?;
    if let Some(ref other) = draft.type_other {
        if other.chars().count() > MAX_NAME_LEN {
            return Err("Appointment type too long".into());
        }
    }
    if let Some(ref place) = draft.place {
        if place.chars().count() > MAX_NAME_LEN * 2 {
            return Err("Place too long".into());
        }
    }
    Ok(())
}

fn validate_minutes(minutes: Option<u32>) -> Result<(), String> {
    match minutes {
        Some(m) if m > MAX_REMINDER_MINUTES => Err(format!(
            "Reminder lead time must be at most {MAX_REMINDER_MINUTES} minutes"
        )),
        _ => Ok(()),
    }
}

/// Register the reminder for a newly saved appointment: the given lead
/// time, or the default one when appointment reminders are on.
fn register_reminder(
    store: &SqliteStore,
    appointment_id: &str,
    minutes_before: Option<u32>,
) -> Result<(), String> {
    let prefs = notif::get_notification_prefs(store).map_err(|e| e.to_string())?;
    let minutes = match minutes_before {
        Some(m) => m,
        None if prefs.appointment_enabled => prefs.appointment_minutes_before,
        None => return Ok(()),
    };
    notif::set_appointment_reminder(store, appointment_id, minutes, true)
        .map_err(|e| e.to_string())
}

pub fn add_appointment(
    date: NaiveDate,
    draft: AppointmentDraft,
    minutes_before: Option<u32>,
    state: &CoreState,
) -> Result<DayAppointment, String> {
    validate_draft(&draft)?;
    validate_minutes(minutes_before)?;

    let store = open(state)?;
    let appointment =
        day_entries::add_appointment(&store, date, draft).map_err(|e| e.to_string())?;
    register_reminder(&store, &appointment.id, minutes_before)?;
    Ok(appointment)
}

/// Edit an appointment and refile it under `new_date`. A given lead
/// time replaces the reminder; otherwise the existing one is kept.
pub fn move_appointment(
    from: NaiveDate,
    id: &str,
    new_date: NaiveDate,
    draft: AppointmentDraft,
    minutes_before: Option<u32>,
    state: &CoreState,
) -> Result<DayAppointment, String> {
    validate_draft(&draft)?;
    validate_minutes(minutes_before)?;

    let store = open(state)?;
    let appointment = day_entries::move_appointment(&store, from, id, new_date, draft)
        .map_err(|e| e.to_string())?;
    if let Some(m) = minutes_before {
        notif::set_appointment_reminder(&store, id, m, true).map_err(|e| e.to_string())?;
    }
    Ok(appointment)
}

/// Remove the appointment and its reminder.
pub fn remove_appointment(
    date: NaiveDate,
    id: &str,
    state: &CoreState,
) -> Result<DayAppointment, String> {
    let store = open(state)?;
    let removed = day_entries::remove_appointment(&store, date, id).map_err(|e| e.to_string())?;
    notif::set_appointment_reminder(&store, id, 0, false).map_err(|e| e.to_string())?;
    Ok(removed)
}

/// Appointments in the reminder window starting at `today`.
pub fn upcoming_appointments(
    today: NaiveDate,
    state: &CoreState,
) -> Result<Vec<UpcomingAppointment>, String> {
    let store = open(state)?;
    let entries = day_entries::load_day_entries(&store).map_err(|e| e.to_string())?;
    Ok(day_entries::upcoming_appointments(
        &entries,
        today,
        APPOINTMENT_LOOKAHEAD_DAYS,
    ))
}

pub fn set_appointment_reminder(
    id: &str,
    minutes_before: u32,
    enabled: bool,
    state: &CoreState,
) -> Result<(), String> {
    validate_minutes(Some(minutes_before))?;
    let store = open(state)?;
    notif::set_appointment_reminder(&store, id, minutes_before, enabled)
        .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::super::{parse_date, test_state};
    use super::*;
    use crate::models::{AppointmentType, NotificationPrefsPatch};

    fn draft(time: &str) -> AppointmentDraft {
        AppointmentDraft {
            appointment_type: AppointmentType::Gynecologist,
            type_other: None,
            time: time.into(),
            place: Some("Ospedale".into()),
        }
    }

    #[test]
    fn add_uses_default_lead_time() {
        let (_dir, state) = test_state();
        let date = parse_date("2024-06-03").unwrap();
        let apt = add_appointment(date, draft("10:30"), None, &state).unwrap();

        let store = state.open_store().unwrap();
        let reminder = notif::get_appointment_reminder(&store, &apt.id).unwrap().unwrap();
        assert_eq!(reminder.minutes_before, 15);
    }

    #[test]
    fn no_reminder_when_disabled() {
        let (_dir, state) = test_state();
        {
            let store = state.open_store().unwrap();
            let patch = NotificationPrefsPatch {
                appointment_enabled: Some(false),
                ..Default::default()
            };
            notif::set_notification_prefs(&store, patch, &[]).unwrap();
        }
        let date = parse_date("2024-06-03").unwrap();
        let apt = add_appointment(date, draft("10:30"), None, &state).unwrap();
        let store = state.open_store().unwrap();
        assert!(notif::get_appointment_reminder(&store, &apt.id).unwrap().is_none());

        let explicit = add_appointment(date, draft("11:30"), Some(60), &state).unwrap();
        let reminder = notif::get_appointment_reminder(&store, &explicit.id).unwrap().unwrap();
        assert_eq!(reminder.minutes_before, 60);
    }

    #[test]
    fn invalid_input_rejected() {
        let (_dir, state) = test_state();
        let date = parse_date("2024-06-03").unwrap();
        assert!(add_appointment(date, draft("25:00"), None, &state).is_err());
        assert!(add_appointment(date, draft("10:00"), Some(20_000), &state).is_err());
    }

    #[test]
    fn move_then_remove() {
        let (_dir, state) = test_state();
        let from = parse_date("2024-06-03").unwrap();
        let to = parse_date("2024-06-05").unwrap();
        let apt = add_appointment(from, draft("10:30"), None, &state).unwrap();

        let moved = move_appointment(from, &apt.id, to, draft("09:00"), None, &state).unwrap();
        assert_eq!(moved.id, apt.id);
        assert_eq!(moved.date, Some(to));

        let upcoming = upcoming_appointments(from, &state).unwrap();
        assert_eq!(upcoming.len(), 1);
        assert_eq!(upcoming[0].date, to);

        assert!(remove_appointment(from, &apt.id, &state).is_err());
        remove_appointment(to, &apt.id, &state).unwrap();
        assert!(upcoming_appointments(from, &state).unwrap().is_empty());
        let store = state.open_store().unwrap();
        assert!(notif::get_appointment_reminder(&store, &apt.id).unwrap().is_none());
    }
}
