//! Calendar day commands: pain, period, notes, therapy ticks and the
//! simple daily log.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{open, validate_notes};
use crate::core_state::CoreState;
use crate::daily_log;
use crate::day_entries;
use crate::models::{DailyLog, DailyLogDraft, DayEntry, FlowIntensity};
use crate::therapy as plan;

/// Fields of a day the user edits directly. `None` leaves the stored
/// value untouched; `clear_*` wipes it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DayUpdate {
    pub pain_level: Option<u8>,
    pub clear_pain: bool,
    pub period_flow: Option<FlowIntensity>,
    pub clear_period: bool,
    pub notes: Option<String>,
}

fn validate_month(month: u32) -> Result<(), String> {
    if !(1..=12).contains(&month) {
        return Err(format!("Invalid month {month} (expected 1-12)"));
    }
    Ok(())
}

pub fn get_day(date: NaiveDate, state: &CoreState) -> Result<DayEntry, String> {
    let store = open(state)?;
    let therapy_plan = plan::load_therapy_plan(&store).map_err(|e| e.to_string())?;
    day_entries::get_entry(&store, &therapy_plan, date).map_err(|e| e.to_string())
}

pub fn set_day(date: NaiveDate, update: DayUpdate, state: &CoreState) -> Result<DayEntry, String> {
    if let Some(pain) = update.pain_level {
        if !(1..=4).contains(&pain) {
            return Err("Pain level must be between 1 and 4".into());
        }
    }
    if let Some(ref notes) = update.notes {
        validate_notes(notes)?;
    }

    let store = open(state)?;
    let therapy_plan = plan::load_therapy_plan(&store).map_err(|e| e.to_string())?;
    let mut entry =
        day_entries::get_entry(&store, &therapy_plan, date).map_err(|e| e.to_string())?;

    if update.clear_pain {
        entry.pain_level = None;
    } else if let Some(pain) = update.pain_level {
        entry.pain_level = Some(pain);
    }
    if update.clear_period {
        entry.period_flow = None;
    } else if let Some(flow) = update.period_flow {
        entry.period_flow = Some(flow);
    }
    if let Some(notes) = update.notes {
        entry.notes = notes.trim().to_string();
    }

    day_entries::set_entry(&store, date, &entry).map_err(|e| e.to_string())?;
    Ok(entry)
}

/// Tick (or untick) a therapy scheduled on `date`.
pub fn take_therapy(
    date: NaiveDate,
    therapy_id: u32,
    taken: bool,
    state: &CoreState,
) -> Result<DayEntry, String> {
    let store = open(state)?;
    let therapy_plan = plan::load_therapy_plan(&store).map_err(|e| e.to_string())?;
    day_entries::set_therapy_taken(&store, &therapy_plan, date, therapy_id, taken)
        .map_err(|e| e.to_string())
}

pub fn has_entry(date: NaiveDate, state: &CoreState) -> Result<bool, String> {
    let store = open(state)?;
    day_entries::has_entry(&store, date).map_err(|e| e.to_string())
}

/// Days of a month with something recorded.
pub fn month(
    year: i32,
    month: u32,
    state: &CoreState,
) -> Result<BTreeMap<NaiveDate, DayEntry>, String> {
    validate_month(month)?;
    let store = open(state)?;
    let therapy_plan = plan::load_therapy_plan(&store).map_err(|e| e.to_string())?;
    day_entries::entries_in_month(&store, &therapy_plan, year, month).map_err(|e| e.to_string())
}

pub fn record_daily_log(draft: DailyLogDraft, state: &CoreState) -> Result<DailyLog, String> {
    if draft.pain_level > 4 {
        return Err("Pain level must be between 0 and 4".into());
    }
    if let Some(ref notes) = draft.notes {
        validate_notes(notes)?;
    }
    if !draft.menstruation && draft.flow_intensity.is_some() {
        return Err("Flow intensity needs menstruation".into());
    }

    let store = open(state)?;
    daily_log::upsert_daily_log(&store, draft).map_err(|e| e.to_string())
}

pub fn daily_log_on(date: NaiveDate, state: &CoreState) -> Result<Option<DailyLog>, String> {
    let store = open(state)?;
    daily_log::get_daily_log_by_date(&store, date).map_err(|e| e.to_string())
}

pub fn daily_logs_in_month(
    year: i32,
    month: u32,
    state: &CoreState,
) -> Result<Vec<DailyLog>, String> {
    validate_month(month)?;
    let store = open(state)?;
    daily_log::list_daily_logs_in_month(&store, year, month).map_err(|e| e.to_string())
}
