//! Command layer: input validation in front of the stores.
//!
//! Every command takes the shared `CoreState`, checks its input, opens
//! the store and returns `Result<T, String>` with a message fit for the
//! user.

pub mod appointment;
pub mod backup;
pub mod day;
pub mod diary;
pub mod notifications;
pub mod profile;
pub mod therapy;
pub mod voiding;

use chrono::{DateTime, FixedOffset, Local, NaiveDate};
use serde::Serialize;

use crate::core_state::CoreState;
use crate::day_entries::{self, UpcomingAppointment};
use crate::models::DayEntry;
use crate::store::SqliteStore;
use crate::{notifications as notif, therapy as plan};

/// Maximum length of free-text notes.
pub const MAX_NOTES_LEN: usize = 500;

/// Maximum length of names and short labels.
pub const MAX_NAME_LEN: usize = 100;

pub(crate) fn open(state: &CoreState) -> Result<SqliteStore, String> {
    state.open_store().map_err(|e| e.to_string())
}

/// Parse `YYYY-MM-DD`.
pub fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| format!("Invalid date {s:?} (expected YYYY-MM-DD)"))
}

/// Parse an RFC 3339 instant, or a local `YYYY-MM-DDTHH:MM`.
pub fn parse_instant(s: &str) -> Result<DateTime<FixedOffset>, String> {
    let s = s.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Ok(t);
    }
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M")
        .ok()
        .and_then(|naive| naive.and_local_timezone(Local).earliest())
        .map(|t| t.fixed_offset())
        .ok_or_else(|| format!("Invalid time {s:?} (expected RFC 3339 or YYYY-MM-DDTHH:MM)"))
}

/// Check an `HH:MM` clock time.
pub fn validate_time(time: &str) -> Result<(), String> {
    let valid = time.len() == 5
        && time.as_bytes()[2] == b':'
        && matches!(
            (time[..2].parse::<u32>(), time[3..].parse::<u32>()),
            (Ok(h), Ok(m)) if h < 24 && m < 60
        );
    if valid {
        Ok(())
    } else {
        Err(format!("Invalid time {time:?} (expected HH:MM)"))
    }
}

pub fn validate_notes(notes: &str) -> Result<(), String> {
    if notes.chars().count() > MAX_NOTES_LEN {
        return Err(format!("Notes must be {MAX_NOTES_LEN} characters or fewer"));
    }
    Ok(())
}

pub fn validate_name(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field} is required"));
    }
    if value.chars().count() > MAX_NAME_LEN {
        return Err(format!("{field} too long"));
    }
    Ok(())
}

/// Everything the home screen shows for one day.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodayView {
    pub date: NaiveDate,
    pub entry: DayEntry,
    pub next_appointment: Option<UpcomingAppointment>,
    pub unread_notifications: usize,
}

pub fn today(date: NaiveDate, state: &CoreState) -> Result<TodayView, String> {
    let store = open(state)?;
    let therapy_plan = plan::load_therapy_plan(&store).map_err(|e| e.to_string())?;
    let entry = day_entries::get_entry(&store, &therapy_plan, date).map_err(|e| e.to_string())?;
    let entries = day_entries::load_day_entries(&store).map_err(|e| e.to_string())?;
    let unread = notif::unread_count(&store).map_err(|e| e.to_string())?;

    Ok(TodayView {
        date,
        entry,
        next_appointment: day_entries::next_appointment(&entries, date),
        unread_notifications: unread,
    })
}

#[cfg(test)]
pub(crate) fn test_state() -> (tempfile::TempDir, CoreState) {
    let dir = tempfile::tempdir().unwrap();
    let state = CoreState::with_path(dir.path().join("dyna.db"));
    (dir, state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_validation() {
        assert!(validate_time("08:00").is_ok());
        assert!(validate_time("23:59").is_ok());
        assert!(validate_time("24:00").is_err());
        assert!(validate_time("8:00").is_err());
        assert!(validate_time("08-00").is_err());
        assert!(validate_time("ab:cd").is_err());
    }

    #[test]
    fn notes_limit_counts_chars() {
        assert!(validate_notes(&"è".repeat(500)).is_ok());
        assert!(validate_notes(&"a".repeat(501)).is_err());
    }

    #[test]
    fn instants_accept_local_form() {
        assert!(parse_instant("2024-02-01T09:30:00+01:00").is_ok());
        assert!(parse_instant("2024-02-01T09:30").is_ok());
        assert!(parse_instant("ieri").is_err());
    }

    #[test]
    fn today_on_empty_store() {
        let (_dir, state) = test_state();
        let view = today(parse_date("2024-01-02").unwrap(), &state).unwrap();
        assert!(view.entry.therapies.is_empty());
        assert!(view.next_appointment.is_none());
        assert_eq!(view.unread_notifications, 0);
    }
}
