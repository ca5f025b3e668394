//! Local reminders: stored reminder settings, user preferences, the
//! notification log, and the periodic checks that fire notifications.

pub mod background;
pub mod checks;
pub mod dispatch;

use std::collections::BTreeMap;

use crate::config::NOTIFICATION_LOG_CAP;
use crate::db::DatabaseError;
use crate::models::{
    AppointmentReminder, MedicineReminder, NotificationLogEntry, NotificationPrefs,
    NotificationPrefsPatch, RemindersState, ShownState, TherapyPlanItem, VariationShown,
};
use crate::store::{keys, load_items, load_json, save_items, save_json, KeyValueStore};

pub use background::{start_reminder_checker, ReminderCheckerHandle};
pub use checks::*;
pub use dispatch::{dispatch, NotificationPermission, Notifier};

// ═══════════════════════════════════════════
// State documents
// ═══════════════════════════════════════════

pub fn load_reminders(store: &dyn KeyValueStore) -> Result<RemindersState, DatabaseError> {
    load_json(store, keys::REMINDERS)
}

fn save_reminders(store: &dyn KeyValueStore, state: &RemindersState) -> Result<(), DatabaseError> {
    save_json(store, keys::REMINDERS, state)
}

pub(crate) fn load_shown(store: &dyn KeyValueStore) -> Result<ShownState, DatabaseError> {
    load_json(store, keys::NOTIFICATIONS_SHOWN)
}

pub(crate) fn save_shown(store: &dyn KeyValueStore, state: &ShownState) -> Result<(), DatabaseError> {
    save_json(store, keys::NOTIFICATIONS_SHOWN, state)
}

pub(crate) fn load_variation_shown(
    store: &dyn KeyValueStore,
) -> Result<VariationShown, DatabaseError> {
    load_json(store, keys::THERAPY_VARIATION_SHOWN)
}

pub(crate) fn save_variation_shown(
    store: &dyn KeyValueStore,
    shown: &VariationShown,
) -> Result<(), DatabaseError> {
    save_json(store, keys::THERAPY_VARIATION_SHOWN, shown)
}

// ═══════════════════════════════════════════
// Reminders
// ═══════════════════════════════════════════

/// Enable a daily reminder at `time`, or delete it.
pub fn set_medicine_reminder(
    store: &dyn KeyValueStore,
    therapy_id: u32,
    time: &str,
    enabled: bool,
) -> Result<(), DatabaseError> {
    let mut state = load_reminders(store)?;
    let key = therapy_id.to_string();
    if enabled {
        state.medicine.insert(
            key,
            MedicineReminder {
                time: time.to_string(),
                enabled: true,
            },
        );
    } else {
        state.medicine.remove(&key);
    }
    save_reminders(store, &state)
}

pub fn get_medicine_reminder(
    store: &dyn KeyValueStore,
    therapy_id: u32,
) -> Result<Option<MedicineReminder>, DatabaseError> {
    Ok(load_reminders(store)?.medicine.remove(&therapy_id.to_string()))
}

/// Enable a reminder `minutes_before` the appointment, or delete it.
pub fn set_appointment_reminder(
    store: &dyn KeyValueStore,
    appointment_id: &str,
    minutes_before: u32,
    enabled: bool,
) -> Result<(), DatabaseError> {
    let mut state = load_reminders(store)?;
    if enabled {
        state.appointment.insert(
            appointment_id.to_string(),
            AppointmentReminder {
                minutes_before,
                enabled: true,
            },
        );
    } else {
        state.appointment.remove(appointment_id);
    }
    save_reminders(store, &state)
}

pub fn get_appointment_reminder(
    store: &dyn KeyValueStore,
    appointment_id: &str,
) -> Result<Option<AppointmentReminder>, DatabaseError> {
    Ok(load_reminders(store)?.appointment.remove(appointment_id))
}

/// Keep medicine reminders in step with plan edits.
///
/// Compares the plan with the snapshot taken on the previous call:
/// reminders of removed or paused therapies are dropped, a changed time
/// moves its reminder, and (with medicine reminders on) new or resumed
/// therapies get one. Returns whether reminders changed.
pub fn sync_medicine_reminders(
    store: &dyn KeyValueStore,
    plan: &[TherapyPlanItem],
) -> Result<bool, DatabaseError> {
    let snapshot: BTreeMap<String, String> = load_json(store, keys::THERAPY_SNAPSHOT)?;
    let prefs = get_notification_prefs(store)?;
    let mut state = load_reminders(store)?;
    let before = state.medicine.clone();

    let active: BTreeMap<String, &TherapyPlanItem> = plan
        .iter()
        .filter(|t| !t.paused)
        .map(|t| (t.id.to_string(), t))
        .collect();

    state.medicine.retain(|id, _| active.contains_key(id));

    for (id, item) in &active {
        match (snapshot.get(id), state.medicine.get_mut(id)) {
            (Some(old_time), Some(reminder)) if *old_time != item.time => {
                reminder.time = item.time.clone();
            }
            (None, None) if prefs.medicine_enabled => {
                state.medicine.insert(
                    id.clone(),
                    MedicineReminder {
                        time: item.time.clone(),
                        enabled: true,
                    },
                );
            }
            _ => {}
        }
    }

    let new_snapshot: BTreeMap<String, String> = active
        .iter()
        .map(|(id, t)| (id.clone(), t.time.clone()))
        .collect();
    save_json(store, keys::THERAPY_SNAPSHOT, &new_snapshot)?;

    let changed = state.medicine != before;
    if changed {
        save_reminders(store, &state)?;
        tracing::info!(reminders = state.medicine.len(), "Medicine reminders synced with plan");
    }
    Ok(changed)
}

// ═══════════════════════════════════════════
// Preferences
// ═══════════════════════════════════════════

pub fn get_notification_prefs(
    store: &dyn KeyValueStore,
) -> Result<NotificationPrefs, DatabaseError> {
    load_json(store, keys::NOTIFICATION_PREFS)
}

/// Merge `patch` into the stored preferences.
///
/// Switching medicine reminders on registers one at the time of every
/// non-paused therapy; switching them off deletes all of them.
pub fn set_notification_prefs(
    store: &dyn KeyValueStore,
    patch: NotificationPrefsPatch,
    plan: &[TherapyPlanItem],
) -> Result<NotificationPrefs, DatabaseError> {
    let mut prefs = get_notification_prefs(store)?;
    if let Some(v) = patch.appointment_enabled {
        prefs.appointment_enabled = v;
    }
    if let Some(v) = patch.appointment_minutes_before {
        prefs.appointment_minutes_before = v;
    }
    if let Some(v) = patch.medicine_enabled {
        prefs.medicine_enabled = v;
        let mut state = load_reminders(store)?;
        state.medicine = if v {
            plan.iter()
                .filter(|t| !t.paused)
                .map(|t| {
                    (
                        t.id.to_string(),
                        MedicineReminder {
                            time: t.time.clone(),
                            enabled: true,
                        },
                    )
                })
                .collect()
        } else {
            BTreeMap::new()
        };
        save_reminders(store, &state)?;
        tracing::info!(enabled = v, count = state.medicine.len(), "Medicine reminders toggled");
    }
    save_json(store, keys::NOTIFICATION_PREFS, &prefs)?;
    Ok(prefs)
}

// ═══════════════════════════════════════════
// Notification log
// ═══════════════════════════════════════════

/// Log entries, oldest first.
pub fn get_notification_log(
    store: &dyn KeyValueStore,
) -> Result<Vec<NotificationLogEntry>, DatabaseError> {
    load_items(store, keys::NOTIFICATION_LOG)
}

fn save_log(store: &dyn KeyValueStore, log: &[NotificationLogEntry]) -> Result<(), DatabaseError> {
    let start = log.len().saturating_sub(NOTIFICATION_LOG_CAP);
    save_items(store, keys::NOTIFICATION_LOG, &log[start..])
}

/// Append an unread entry stamped `at` (epoch millis). Only the newest
/// entries up to the cap are kept.
pub fn push_notification_log(
    store: &dyn KeyValueStore,
    title: &str,
    body: &str,
    at: i64,
) -> Result<NotificationLogEntry, DatabaseError> {
    let mut log = get_notification_log(store)?;
    let suffix: String = uuid::Uuid::new_v4().simple().to_string().chars().take(7).collect();
    let entry = NotificationLogEntry {
        id: format!("n-{at}-{suffix}"),
        title: title.to_string(),
        body: body.to_string(),
        at,
        read: false,
    };
    log.push(entry.clone());
    save_log(store, &log)?;
    Ok(entry)
}

/// Returns false when no entry has that id.
pub fn mark_notification_read(store: &dyn KeyValueStore, id: &str) -> Result<bool, DatabaseError> {
    let mut log = get_notification_log(store)?;
    let Some(entry) = log.iter_mut().find(|e| e.id == id) else {
        return Ok(false);
    };
    entry.read = true;
    save_log(store, &log)?;
    Ok(true)
}

pub fn mark_all_notifications_read(store: &dyn KeyValueStore) -> Result<(), DatabaseError> {
    let mut log = get_notification_log(store)?;
    for entry in &mut log {
        entry.read = true;
    }
    save_log(store, &log)
}

pub fn unread_count(store: &dyn KeyValueStore) -> Result<usize, DatabaseError> {
    Ok(get_notification_log(store)?.iter().filter(|e| !e.read).count())
}
