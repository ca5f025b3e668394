//! Calendar day entries (`dyna-day-entries`): pain, period, therapies
//! taken, notes and appointments, one record per `YYYY-MM-DD`.

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;

use crate::data::new_id;
use crate::db::DatabaseError;
use crate::models::{
    AppointmentDraft, AppointmentType, DayAppointment, DayEntry, FlowIntensity, StoredDayEntry,
    TherapyPlanItem, TherapyTaken,
};
use crate::store::{keys, load_entries, save_entries, KeyValueStore};
use crate::therapy::{dose_label_on, therapies_for_day, time_to_minutes};

/// Stored entries keyed by date text.
pub type DayEntries = BTreeMap<String, StoredDayEntry>;

pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn parse_key(key: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(key, "%Y-%m-%d").ok()
}

// ═══════════════════════════════════════════
// Storage
// ═══════════════════════════════════════════

/// Load every entry. Entries that cannot be read are skipped here and
/// kept in storage.
pub fn load_day_entries(store: &dyn KeyValueStore) -> Result<DayEntries, DatabaseError> {
    load_entries(store, keys::DAY_ENTRIES)
}

pub fn save_day_entries(
    store: &dyn KeyValueStore,
    entries: &DayEntries,
) -> Result<(), DatabaseError> {
    save_entries(store, keys::DAY_ENTRIES, entries)
}

// ═══════════════════════════════════════════
// Normalisation
// ═══════════════════════════════════════════

fn normalize_flow(stored: &StoredDayEntry) -> Option<FlowIntensity> {
    match &stored.period_flow {
        Some(serde_json::Value::String(s)) => s.parse().ok(),
        Some(serde_json::Value::Null) | None if stored.has_period == Some(true) => {
            Some(FlowIntensity::Medium)
        }
        _ => None,
    }
}

/// The day's therapies from the plan, keeping the stored `taken` flags.
pub fn merge_therapies_for_day(
    plan: &[TherapyPlanItem],
    date: NaiveDate,
    saved: &[TherapyTaken],
) -> Vec<TherapyTaken> {
    therapies_for_day(plan, date)
        .into_iter()
        .map(|item| TherapyTaken {
            id: item.id,
            name: item.name.clone(),
            dose: dose_label_on(item, date),
            time: item.time.clone(),
            taken: saved.iter().any(|t| t.id == item.id && t.taken),
        })
        .collect()
}

/// Build the view of a day from its stored record (if any) and the plan.
pub fn normalize_entry(
    stored: Option<&StoredDayEntry>,
    plan: &[TherapyPlanItem],
    date: NaiveDate,
) -> DayEntry {
    let Some(stored) = stored else {
        return DayEntry {
            therapies: merge_therapies_for_day(plan, date, &[]),
            ..DayEntry::default()
        };
    };
    DayEntry {
        pain_level: stored
            .pain_level
            .filter(|p| (1..=4).contains(p))
            .and_then(|p| u8::try_from(p).ok()),
        period_flow: normalize_flow(stored),
        appointments: stored.appointments.clone().unwrap_or_default(),
        therapies: merge_therapies_for_day(
            plan,
            date,
            stored.therapies.as_deref().unwrap_or_default(),
        ),
        notes: stored.notes.clone().unwrap_or_default(),
    }
}

/// Whether a stored record carries anything worth marking on the calendar.
pub fn entry_has_content(entry: &StoredDayEntry) -> bool {
    entry.pain_level.is_some()
        || matches!(&entry.period_flow, Some(v) if !v.is_null())
        || entry.has_period == Some(true)
        || entry.appointments.as_ref().is_some_and(|a| !a.is_empty())
        || entry.therapies.as_ref().is_some_and(|t| t.iter().any(|t| t.taken))
        || entry.notes.as_ref().is_some_and(|n| !n.trim().is_empty())
}

// ═══════════════════════════════════════════
// Day operations
// ═══════════════════════════════════════════

pub fn get_entry(
    store: &dyn KeyValueStore,
    plan: &[TherapyPlanItem],
    date: NaiveDate,
) -> Result<DayEntry, DatabaseError> {
    let entries = load_day_entries(store)?;
    Ok(normalize_entry(entries.get(&date_key(date)), plan, date))
}

pub fn set_entry(
    store: &dyn KeyValueStore,
    date: NaiveDate,
    entry: &DayEntry,
) -> Result<(), DatabaseError> {
    let mut entries = load_day_entries(store)?;
    entries.insert(date_key(date), StoredDayEntry::from(entry));
    save_day_entries(store, &entries)?;
    tracing::debug!(date = %date, "Day entry saved");
    Ok(())
}

pub fn has_entry(store: &dyn KeyValueStore, date: NaiveDate) -> Result<bool, DatabaseError> {
    let entries = load_day_entries(store)?;
    Ok(entries.get(&date_key(date)).is_some_and(entry_has_content))
}

/// Tick or untick a scheduled therapy. Fails when the therapy is not
/// scheduled on `date`.
pub fn set_therapy_taken(
    store: &dyn KeyValueStore,
    plan: &[TherapyPlanItem],
    date: NaiveDate,
    therapy_id: u32,
    taken: bool,
) -> Result<DayEntry, DatabaseError> {
    let mut entry = get_entry(store, plan, date)?;
    let therapy = entry
        .therapies
        .iter_mut()
        .find(|t| t.id == therapy_id)
        .ok_or_else(|| DatabaseError::not_found("scheduled therapy", therapy_id))?;
    therapy.taken = taken;
    set_entry(store, date, &entry)?;
    Ok(entry)
}

/// Days of the month that have content, normalised against the plan.
pub fn entries_in_month(
    store: &dyn KeyValueStore,
    plan: &[TherapyPlanItem],
    year: i32,
    month: u32,
) -> Result<BTreeMap<NaiveDate, DayEntry>, DatabaseError> {
    let entries = load_day_entries(store)?;
    let days = entries
        .iter()
        .filter(|(_, e)| entry_has_content(e))
        .filter_map(|(k, e)| parse_key(k).map(|d| (d, e)))
        .filter(|(d, _)| d.year() == year && d.month() == month)
        .map(|(d, e)| (d, normalize_entry(Some(e), plan, d)))
        .collect();
    Ok(days)
}

// ═══════════════════════════════════════════
// Appointments
// ═══════════════════════════════════════════

/// An appointment together with the day it is filed under.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpcomingAppointment {
    pub date: NaiveDate,
    pub appointment: DayAppointment,
}

/// Display label: the specialist, the free-text type for "altro", or
/// the legacy title.
pub fn appointment_type_label(appointment: &DayAppointment) -> String {
    fn non_blank(s: &Option<String>) -> Option<&str> {
        s.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
    match appointment.appointment_type {
        AppointmentType::Other => non_blank(&appointment.type_other)
            .or_else(|| non_blank(&appointment.title))
            .unwrap_or(AppointmentType::Other.label())
            .to_string(),
        kind => kind.label().to_string(),
    }
}

/// Appointments filed on `from` or later (through `until` when given),
/// by date then time.
fn appointments_between(
    entries: &DayEntries,
    from: NaiveDate,
    until: Option<NaiveDate>,
) -> Vec<UpcomingAppointment> {
    let mut found: Vec<UpcomingAppointment> = entries
        .iter()
        .filter_map(|(k, e)| parse_key(k).map(|d| (d, e)))
        .filter(|(d, _)| *d >= from && until.map_or(true, |u| *d <= u))
        .flat_map(|(date, e)| {
            e.appointments
                .iter()
                .flatten()
                .map(move |a| UpcomingAppointment {
                    date,
                    appointment: a.clone(),
                })
        })
        .collect();
    found.sort_by_key(|u| (u.date, time_to_minutes(&u.appointment.time).unwrap_or(0)));
    found
}

/// Appointments from `today` through `today + days`.
pub fn upcoming_appointments(
    entries: &DayEntries,
    today: NaiveDate,
    days: i64,
) -> Vec<UpcomingAppointment> {
    appointments_between(entries, today, Some(today + Duration::days(days)))
}

/// The first appointment on or after `today`.
pub fn next_appointment(entries: &DayEntries, today: NaiveDate) -> Option<UpcomingAppointment> {
    appointments_between(entries, today, None).into_iter().next()
}

fn build_appointment(id: String, date: NaiveDate, draft: AppointmentDraft) -> DayAppointment {
    let type_other = match draft.appointment_type {
        AppointmentType::Other => draft
            .type_other
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
        _ => None,
    };
    DayAppointment {
        id,
        appointment_type: draft.appointment_type,
        type_other,
        title: None,
        date: Some(date),
        time: draft.time,
        place: draft.place.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
    }
}

pub fn add_appointment(
    store: &dyn KeyValueStore,
    date: NaiveDate,
    draft: AppointmentDraft,
) -> Result<DayAppointment, DatabaseError> {
    let mut entries = load_day_entries(store)?;
    let appointment = build_appointment(new_id(), date, draft);
    entries
        .entry(date_key(date))
        .or_default()
        .appointments
        .get_or_insert_with(Vec::new)
        .push(appointment.clone());
    save_day_entries(store, &entries)?;
    tracing::info!(date = %date, appointment_id = %appointment.id, "Appointment added");
    Ok(appointment)
}

fn take_appointment(
    entries: &mut DayEntries,
    date: NaiveDate,
    id: &str,
) -> Result<DayAppointment, DatabaseError> {
    let list = entries
        .get_mut(&date_key(date))
        .and_then(|e| e.appointments.as_mut())
        .ok_or_else(|| DatabaseError::not_found("appointment", id))?;
    let idx = list
        .iter()
        .position(|a| a.id == id)
        .ok_or_else(|| DatabaseError::not_found("appointment", id))?;
    Ok(list.remove(idx))
}

/// Edit an appointment, refiling it under `new_date` when the date changes.
pub fn move_appointment(
    store: &dyn KeyValueStore,
    from: NaiveDate,
    id: &str,
    new_date: NaiveDate,
    draft: AppointmentDraft,
) -> Result<DayAppointment, DatabaseError> {
    let mut entries = load_day_entries(store)?;
    let old = take_appointment(&mut entries, from, id)?;
    let updated = build_appointment(old.id, new_date, draft);

    let list = entries
        .entry(date_key(new_date))
        .or_default()
        .appointments
        .get_or_insert_with(Vec::new);
    list.push(updated.clone());

    save_day_entries(store, &entries)?;
    if from != new_date {
        tracing::info!(appointment_id = %id, from = %from, to = %new_date, "Appointment moved");
    }
    Ok(updated)
}

pub fn remove_appointment(
    store: &dyn KeyValueStore,
    date: NaiveDate,
    id: &str,
) -> Result<DayAppointment, DatabaseError> {
    let mut entries = load_day_entries(store)?;
    let removed = take_appointment(&mut entries, date, id)?;
    save_day_entries(store, &entries)?;
    tracing::info!(appointment_id = %id, "Appointment removed");
    Ok(removed)
}
