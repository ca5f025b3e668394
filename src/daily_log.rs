//! Simple daily logs kept in the app data root.

use chrono::{Datelike, NaiveDate, Utc};

use crate::data::{load_data, new_id, update_data};
use crate::db::DatabaseError;
use crate::models::{DailyLog, DailyLogDraft};
use crate::store::KeyValueStore;

/// Insert or update the log for `draft.date`.
///
/// An existing log matching the draft's id or date is updated in place
/// and keeps its id and `created_at`.
pub fn upsert_daily_log(
    store: &dyn KeyValueStore,
    draft: DailyLogDraft,
) -> Result<DailyLog, DatabaseError> {
    let now = Utc::now();
    let mut saved = None;

    update_data(store, |data| {
        let idx = data.daily_logs.iter().position(|x| {
            draft.id.as_deref() == Some(x.id.as_str()) || x.date == draft.date
        });
        let log = DailyLog {
            id: draft.id.clone().unwrap_or_else(new_id),
            date: draft.date,
            pain_level: draft.pain_level,
            menstruation: draft.menstruation,
            flow_intensity: draft.flow_intensity,
            therapy_adherence_simple: draft.therapy_adherence_simple,
            notes: draft.notes.clone().unwrap_or_default(),
            created_at: draft.created_at.unwrap_or(now),
            updated_at: now,
        };
        match idx {
            Some(i) => {
                let existing = &mut data.daily_logs[i];
                *existing = DailyLog {
                    id: existing.id.clone(),
                    created_at: existing.created_at,
                    ..log
                };
                saved = Some(existing.clone());
            }
            None => {
                saved = Some(log.clone());
                data.daily_logs.push(log);
            }
        }
    })?;

    let log = saved.ok_or_else(|| DatabaseError::not_found("daily log", draft.date))?;
    tracing::debug!(date = %log.date, "Daily log saved");
    Ok(log)
}

pub fn get_daily_log_by_date(
    store: &dyn KeyValueStore,
    date: NaiveDate,
) -> Result<Option<DailyLog>, DatabaseError> {
    Ok(load_data(store)?.daily_logs.into_iter().find(|l| l.date == date))
}

pub fn list_daily_logs_in_month(
    store: &dyn KeyValueStore,
    year: i32,
    month: u32,
) -> Result<Vec<DailyLog>, DatabaseError> {
    let mut logs: Vec<DailyLog> = load_data(store)?
        .daily_logs
        .into_iter()
        .filter(|l| l.date.year() == year && l.date.month() == month)
        .collect();
    logs.sort_by_key(|l| l.date);
    Ok(logs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn draft(date: &str, pain: u8) -> DailyLogDraft {
        DailyLogDraft {
            id: None,
            date: d(date),
            pain_level: pain,
            menstruation: false,
            flow_intensity: None,
            therapy_adherence_simple: Some(true),
            notes: None,
            created_at: None,
        }
    }

    #[test]
    fn upsert_by_date_keeps_identity() {
        let store = MemoryStore::new();
        let first = upsert_daily_log(&store, draft("2024-03-01", 2)).unwrap();
        let second = upsert_daily_log(&store, draft("2024-03-01", 4)).unwrap();

        assert_eq!(second.id, first.id);
        assert_eq!(second.created_at, first.created_at);
        assert_eq!(second.pain_level, 4);
        assert_eq!(load_data(&store).unwrap().daily_logs.len(), 1);
    }

    #[test]
    fn upsert_by_id_can_move_date() {
        let store = MemoryStore::new();
        let first = upsert_daily_log(&store, draft("2024-03-01", 2)).unwrap();
        let mut moved = draft("2024-03-02", 1);
        moved.id = Some(first.id.clone());
        upsert_daily_log(&store, moved).unwrap();

        assert!(get_daily_log_by_date(&store, d("2024-03-01")).unwrap().is_none());
        let log = get_daily_log_by_date(&store, d("2024-03-02")).unwrap().unwrap();
        assert_eq!(log.id, first.id);
    }

    #[test]
    fn month_listing_sorted() {
        let store = MemoryStore::new();
        upsert_daily_log(&store, draft("2024-03-15", 1)).unwrap();
        upsert_daily_log(&store, draft("2024-03-02", 1)).unwrap();
        upsert_daily_log(&store, draft("2024-04-01", 1)).unwrap();

        let logs = list_daily_logs_in_month(&store, 2024, 3).unwrap();
        let dates: Vec<NaiveDate> = logs.iter().map(|l| l.date).collect();
        assert_eq!(dates, vec![d("2024-03-02"), d("2024-03-15")]);
    }
}
