//! Reminder checks run once a minute.
//!
//! Each check is idempotent within its window: a medicine reminder
//! fires at most once per day, an appointment reminder once, and a
//! dose-change notice once per therapy and date.

use chrono::{DateTime, Duration, TimeZone, Timelike};
use serde::Serialize;

use crate::config::APPOINTMENT_LOOKAHEAD_DAYS;
use crate::day_entries::{
    appointment_type_label, load_day_entries, upcoming_appointments, UpcomingAppointment,
};
use crate::db::DatabaseError;
use crate::models::TherapyPlanItem;
use crate::store::KeyValueStore;
use crate::therapy::{
    dose_changes, dose_label_on, load_therapy_plan, therapies_for_day, time_to_minutes,
};

use super::dispatch::{dispatch, Notifier};
use super::{
    get_notification_prefs, load_reminders, load_shown, load_variation_shown, save_shown,
    save_variation_shown,
};

pub const MEDICINE_TITLE: &str = "Dyna – Promemoria";
pub const APPOINTMENT_TITLE: &str = "Dyna – Appuntamento";
pub const VARIATION_TITLE: &str = "Dyna – Terapia";

/// Tolerance around a reminder's minute.
const MEDICINE_WINDOW_MINUTES: i64 = 1;

/// Tolerance around an appointment's notify instant.
const APPOINTMENT_WINDOW_MS: i64 = 60 * 1000;

/// Notifications fired by one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CheckSummary {
    pub medicine: usize,
    pub appointment: usize,
    pub variation: usize,
}

impl CheckSummary {
    pub fn total(&self) -> usize {
        self.medicine + self.appointment + self.variation
    }
}

/// Fire medicine reminders due at `now`.
///
/// Only therapies scheduled today are considered, so paused items, the
/// off-day of an alternating pair and deleted items stay silent.
pub fn check_medicine_reminders<Tz: TimeZone>(
    store: &dyn KeyValueStore,
    plan: &[TherapyPlanItem],
    now: &DateTime<Tz>,
    notifier: &dyn Notifier,
) -> Result<usize, DatabaseError> {
    if !get_notification_prefs(store)?.medicine_enabled {
        return Ok(0);
    }
    let reminders = load_reminders(store)?;
    let mut shown = load_shown(store)?;
    let today = now.date_naive();
    let current = i64::from(now.hour() * 60 + now.minute());
    let scheduled = therapies_for_day(plan, today);

    let mut fired = 0;
    for (id, reminder) in &reminders.medicine {
        if !reminder.enabled {
            continue;
        }
        let Some(at) = time_to_minutes(&reminder.time) else {
            tracing::warn!(therapy_id = %id, time = %reminder.time, "Unreadable reminder time");
            continue;
        };
        if (current - i64::from(at)).abs() > MEDICINE_WINDOW_MINUTES {
            continue;
        }
        if shown.medicine.get(id) == Some(&today) {
            continue;
        }
        let Some(item) = scheduled.iter().find(|t| t.id.to_string() == *id) else {
            tracing::debug!(therapy_id = %id, "Reminder skipped, therapy not scheduled today");
            continue;
        };

        let body = format!("{}: ora di prendere il farmaco.", item.name);
        dispatch(store, notifier, MEDICINE_TITLE, &body, now.timestamp_millis())?;
        shown.medicine.insert(id.clone(), today);
        fired += 1;
    }

    if fired > 0 {
        save_shown(store, &shown)?;
    }
    Ok(fired)
}

/// Fire appointment reminders whose notify instant is within a minute
/// of `now`.
pub fn check_appointment_reminders<Tz: TimeZone>(
    store: &dyn KeyValueStore,
    appointments: &[UpcomingAppointment],
    now: &DateTime<Tz>,
    notifier: &dyn Notifier,
) -> Result<usize, DatabaseError> {
    if !get_notification_prefs(store)?.appointment_enabled {
        return Ok(0);
    }
    let reminders = load_reminders(store)?;
    let mut shown = load_shown(store)?;
    let now_ms = now.timestamp_millis();

    let mut fired = 0;
    for upcoming in appointments {
        let apt = &upcoming.appointment;
        let Some(reminder) = reminders.appointment.get(&apt.id).filter(|r| r.enabled) else {
            continue;
        };
        let Some(minutes) = time_to_minutes(&apt.time) else {
            continue;
        };
        let local = upcoming.date.and_hms_opt(0, 0, 0).map(|midnight| {
            midnight + Duration::minutes(i64::from(minutes))
        });
        let Some(instant) = local.and_then(|l| now.timezone().from_local_datetime(&l).earliest())
        else {
            continue;
        };
        let notify_at = instant.timestamp_millis() - i64::from(reminder.minutes_before) * 60 * 1000;
        if now_ms < notify_at - APPOINTMENT_WINDOW_MS || now_ms > notify_at + APPOINTMENT_WINDOW_MS {
            continue;
        }
        if shown.appointment.contains_key(&apt.id) {
            continue;
        }

        let body = format!(
            "{} tra {} minuti ({})",
            appointment_type_label(apt),
            reminder.minutes_before,
            apt.time
        );
        dispatch(store, notifier, APPOINTMENT_TITLE, &body, now_ms)?;
        shown.appointment.insert(apt.id.clone(), now_ms);
        fired += 1;
    }

    if fired > 0 {
        save_shown(store, &shown)?;
    }
    Ok(fired)
}

/// Announce dose changes taking effect today, once per therapy and date.
pub fn check_variation_reminders<Tz: TimeZone>(
    store: &dyn KeyValueStore,
    plan: &[TherapyPlanItem],
    now: &DateTime<Tz>,
    notifier: &dyn Notifier,
) -> Result<usize, DatabaseError> {
    if !get_notification_prefs(store)?.medicine_enabled {
        return Ok(0);
    }
    let today = now.date_naive();
    let mut shown = load_variation_shown(store)?;

    let mut fired = 0;
    for item in therapies_for_day(plan, today) {
        if !dose_changes(item).iter().any(|s| s.date == today) {
            continue;
        }
        let marker = format!("{}|{}", item.id, today.format("%Y-%m-%d"));
        if shown.contains(&marker) {
            continue;
        }
        let body = format!("{}: da oggi la dose è {}.", item.name, dose_label_on(item, today));
        dispatch(store, notifier, VARIATION_TITLE, &body, now.timestamp_millis())?;
        shown.insert(marker);
        fired += 1;
    }

    if fired > 0 {
        save_variation_shown(store, &shown)?;
    }
    Ok(fired)
}

/// One full pass over the stored plan and upcoming appointments.
pub fn run_all_checks<Tz: TimeZone>(
    store: &dyn KeyValueStore,
    now: &DateTime<Tz>,
    notifier: &dyn Notifier,
) -> Result<CheckSummary, DatabaseError> {
    let plan = load_therapy_plan(store)?;
    let entries = load_day_entries(store)?;
    let upcoming = upcoming_appointments(&entries, now.date_naive(), APPOINTMENT_LOOKAHEAD_DAYS);

    let summary = CheckSummary {
        medicine: check_medicine_reminders(store, &plan, now, notifier)?,
        appointment: check_appointment_reminders(store, &upcoming, now, notifier)?,
        variation: check_variation_reminders(store, &plan, now, notifier)?,
    };
    if summary.total() > 0 {
        tracing::info!(
            medicine = summary.medicine,
            appointment = summary.appointment,
            variation = summary.variation,
            "Reminder check fired notifications"
        );
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    use crate::day_entries::add_appointment;
    use crate::models::{
        AlternateFrequency, AppointmentDraft, AppointmentType, PosologyPeriod, TherapyPlanItem,
        TherapyVariation,
    };
    use crate::notifications::dispatch::RecordingNotifier;
    use crate::notifications::{
        get_notification_log, set_appointment_reminder, sync_medicine_reminders,
        NotificationPermission,
    };
    use crate::store::MemoryStore;
    use crate::therapy::{default_plan, save_therapy_plan};

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    fn granted() -> RecordingNotifier {
        RecordingNotifier::new(NotificationPermission::Granted)
    }

    #[test]
    fn medicine_fires_once_per_day() {
        let store = MemoryStore::new();
        let plan = default_plan();
        sync_medicine_reminders(&store, &plan).unwrap();
        let notifier = granted();

        assert_eq!(check_medicine_reminders(&store, &plan, &at(2024, 1, 2, 22, 1, 0), &notifier).unwrap(), 1);
        assert_eq!(check_medicine_reminders(&store, &plan, &at(2024, 1, 2, 21, 59, 0), &notifier).unwrap(), 0);
        assert_eq!(check_medicine_reminders(&store, &plan, &at(2024, 1, 3, 22, 0, 0), &notifier).unwrap(), 1);

        let shown = notifier.shown();
        assert_eq!(shown.len(), 2);
        assert_eq!(shown[0].0, MEDICINE_TITLE);
        assert_eq!(shown[0].1, "Amitriptilina: ora di prendere il farmaco.");
    }

    #[test]
    fn medicine_outside_window_is_silent() {
        let store = MemoryStore::new();
        let plan = default_plan();
        sync_medicine_reminders(&store, &plan).unwrap();
        let notifier = granted();
        let fired = check_medicine_reminders(&store, &plan, &at(2024, 1, 2, 22, 2, 0), &notifier).unwrap();
        assert_eq!(fired, 0);
    }

    #[test]
    fn paused_therapy_is_silent() {
        let store = MemoryStore::new();
        let mut plan = default_plan();
        sync_medicine_reminders(&store, &plan).unwrap();
        plan[0].paused = true;
        let notifier = granted();
        let fired = check_medicine_reminders(&store, &plan, &at(2024, 1, 2, 22, 0, 0), &notifier).unwrap();
        assert_eq!(fired, 0);
    }

    /// Amitriptilina (id 1) and Diazepam (id 4) alternating day by day
    /// from 2024-01-01: Amitriptilina on even day offsets.
    fn alternating_plan() -> Vec<TherapyPlanItem> {
        let mut plan = default_plan();
        plan[0].alternate_with_id = Some(4);
        plan[0].alternate_frequency = Some(AlternateFrequency::DayByDay);
        plan[3].alternate_with_id = Some(1);
        plan[3].alternate_frequency = Some(AlternateFrequency::DayByDay);
        plan
    }

    #[test]
    fn alternating_therapy_fires_only_on_its_days() {
        let store = MemoryStore::new();
        let plan = alternating_plan();
        sync_medicine_reminders(&store, &plan).unwrap();
        let notifier = granted();

        let off_day = at(2024, 1, 2, 22, 0, 0);
        assert_eq!(check_medicine_reminders(&store, &plan, &off_day, &notifier).unwrap(), 0);
        let partner_day = at(2024, 1, 2, 21, 0, 0);
        assert_eq!(check_medicine_reminders(&store, &plan, &partner_day, &notifier).unwrap(), 1);
        let on_day = at(2024, 1, 3, 22, 0, 0);
        assert_eq!(check_medicine_reminders(&store, &plan, &on_day, &notifier).unwrap(), 1);

        let bodies: Vec<String> = notifier.shown().into_iter().map(|(_, body)| body).collect();
        assert_eq!(
            bodies,
            vec![
                "Diazepam: ora di prendere il farmaco.".to_string(),
                "Amitriptilina: ora di prendere il farmaco.".to_string(),
            ]
        );
    }

    #[test]
    fn removed_therapy_reminder_is_silent() {
        let store = MemoryStore::new();
        let mut plan = default_plan();
        sync_medicine_reminders(&store, &plan).unwrap();
        plan.retain(|t| t.id != 1);
        assert!(crate::notifications::load_reminders(&store).unwrap().medicine.contains_key("1"));

        let notifier = granted();
        let fired = check_medicine_reminders(&store, &plan, &at(2024, 1, 2, 22, 0, 0), &notifier).unwrap();
        assert_eq!(fired, 0);
        assert!(notifier.shown().is_empty());
    }

    #[test]
    fn dose_change_on_off_day_is_not_announced() {
        let store = MemoryStore::new();
        let mut plan = alternating_plan();
        plan[0].therapy_variation = Some(TherapyVariation {
            initial_qty: 10.0,
            increase_by: 10.0,
            every_value: 7,
            every_period: PosologyPeriod::Day,
            final_qty: 30.0,
        });
        let notifier = granted();

        let off_day_change = at(2024, 1, 8, 9, 0, 0);
        assert_eq!(check_variation_reminders(&store, &plan, &off_day_change, &notifier).unwrap(), 0);
        let on_day_change = at(2024, 1, 15, 9, 0, 0);
        assert_eq!(check_variation_reminders(&store, &plan, &on_day_change, &notifier).unwrap(), 1);
        assert_eq!(notifier.shown()[0].1, "Amitriptilina: da oggi la dose è 30mg.");
    }

    #[test]
    fn denied_permission_still_marks_shown() {
        let store = MemoryStore::new();
        let plan = default_plan();
        sync_medicine_reminders(&store, &plan).unwrap();
        let denied = RecordingNotifier::new(NotificationPermission::Denied);
        let now = at(2024, 1, 2, 22, 0, 0);

        assert_eq!(check_medicine_reminders(&store, &plan, &now, &denied).unwrap(), 1);
        assert!(denied.shown().is_empty());
        assert!(get_notification_log(&store).unwrap().is_empty());

        let notifier = granted();
        assert_eq!(check_medicine_reminders(&store, &plan, &now, &notifier).unwrap(), 0);
    }

    #[test]
    fn disabled_prefs_skip_medicine() {
        let store = MemoryStore::new();
        let plan = default_plan();
        sync_medicine_reminders(&store, &plan).unwrap();
        store.set(crate::store::keys::NOTIFICATION_PREFS, r#"{"medicineEnabled":false}"#).unwrap();
        let notifier = granted();
        let fired = check_medicine_reminders(&store, &plan, &at(2024, 1, 2, 22, 0, 0), &notifier).unwrap();
        assert_eq!(fired, 0);
    }

    #[test]
    fn appointment_fires_inside_window_once() {
        let store = MemoryStore::new();
        let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        let apt = add_appointment(
            &store,
            date,
            AppointmentDraft {
                appointment_type: AppointmentType::Gynecologist,
                type_other: None,
                time: "10:00".into(),
                place: None,
            },
        )
        .unwrap();
        set_appointment_reminder(&store, &apt.id, 15, true).unwrap();
        let entries = load_day_entries(&store).unwrap();
        let upcoming = upcoming_appointments(&entries, date, 7);
        let notifier = granted();

        let early = at(2024, 1, 5, 9, 43, 59);
        assert_eq!(check_appointment_reminders(&store, &upcoming, &early, &notifier).unwrap(), 0);

        let due = at(2024, 1, 5, 9, 45, 30);
        assert_eq!(check_appointment_reminders(&store, &upcoming, &due, &notifier).unwrap(), 1);
        assert_eq!(check_appointment_reminders(&store, &upcoming, &due, &notifier).unwrap(), 0);

        assert_eq!(notifier.shown()[0].1, "Ginecologo tra 15 minuti (10:00)");
    }

    #[test]
    fn appointment_without_reminder_is_silent() {
        let store = MemoryStore::new();
        let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        add_appointment(
            &store,
            date,
            AppointmentDraft {
                appointment_type: AppointmentType::Other,
                type_other: Some("Psicologa".into()),
                time: "10:00".into(),
                place: None,
            },
        )
        .unwrap();
        let entries = load_day_entries(&store).unwrap();
        let upcoming = upcoming_appointments(&entries, date, 7);
        let notifier = granted();
        let due = at(2024, 1, 5, 9, 45, 0);
        assert_eq!(check_appointment_reminders(&store, &upcoming, &due, &notifier).unwrap(), 0);
    }

    #[test]
    fn dose_change_announced_once() {
        let store = MemoryStore::new();
        let mut plan = default_plan();
        plan[0].therapy_variation = Some(TherapyVariation {
            initial_qty: 10.0,
            increase_by: 10.0,
            every_value: 7,
            every_period: PosologyPeriod::Day,
            final_qty: 30.0,
        });
        let notifier = granted();

        let change_day = at(2024, 1, 8, 9, 0, 0);
        assert_eq!(check_variation_reminders(&store, &plan, &change_day, &notifier).unwrap(), 1);
        assert_eq!(check_variation_reminders(&store, &plan, &change_day, &notifier).unwrap(), 0);
        assert_eq!(check_variation_reminders(&store, &plan, &at(2024, 1, 9, 9, 0, 0), &notifier).unwrap(), 0);

        let shown = notifier.shown();
        assert_eq!(shown[0].0, VARIATION_TITLE);
        assert_eq!(shown[0].1, "Amitriptilina: da oggi la dose è 20mg.");
    }

    #[test]
    fn full_pass_reads_stored_plan() {
        let store = MemoryStore::new();
        let plan = default_plan();
        save_therapy_plan(&store, &plan).unwrap();
        sync_medicine_reminders(&store, &plan).unwrap();
        let notifier = granted();

        let summary = run_all_checks(&store, &at(2024, 1, 2, 8, 0, 0), &notifier).unwrap();
        assert_eq!(summary.medicine, 1);
        assert_eq!(summary.total(), 1);
        assert_eq!(notifier.shown()[0].1, "Lilith: ora di prendere il farmaco.");
    }
}
