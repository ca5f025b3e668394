//! Voiding diary: fluid intakes and voidings stored in the app data
//! root, and the two-hour block view built from them.

use chrono::{DateTime, FixedOffset, Local, NaiveDate, TimeZone, Timelike};
use serde::Serialize;

use crate::data::{load_data, new_id, update_data};
use crate::db::DatabaseError;
use crate::diaries::get_diary;
use crate::models::{DiaryType, FluidIntake, FluidIntakeType, VoidingEntry};
use crate::store::KeyValueStore;

/// `(start, end)` labels of the twelve blocks.
pub const BLOCK_LABELS: [(&str, &str); 12] = [
    ("00:00", "02:00"),
    ("02:00", "04:00"),
    ("04:00", "06:00"),
    ("06:00", "08:00"),
    ("08:00", "10:00"),
    ("10:00", "12:00"),
    ("12:00", "14:00"),
    ("14:00", "16:00"),
    ("16:00", "18:00"),
    ("18:00", "20:00"),
    ("20:00", "22:00"),
    ("22:00", "00:00"),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeBlock {
    pub start: &'static str,
    pub end: &'static str,
    pub fluids: Vec<FluidIntake>,
    pub voidings: Vec<VoidingEntry>,
    pub total_fluid_in: u64,
    pub total_urine_out: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySummary {
    pub total_fluid_in: u64,
    pub total_urine_out: u64,
    pub intake_count: usize,
    pub voiding_count: usize,
    pub urgency_count: usize,
    pub burning_count: usize,
}

// ═══════════════════════════════════════════
// Records
// ═══════════════════════════════════════════

fn value_id(value: &serde_json::Value) -> Option<&str> {
    value.get("id").and_then(|v| v.as_str())
}

fn upsert_value(
    list: &mut Vec<serde_json::Value>,
    id: &str,
    value: serde_json::Value,
) {
    match list.iter_mut().find(|v| value_id(v) == Some(id)) {
        Some(slot) => *slot = value,
        None => list.push(value),
    }
}

fn to_value<T: Serialize>(record: &T, kind: &str) -> Result<serde_json::Value, DatabaseError> {
    serde_json::to_value(record).map_err(|e| DatabaseError::Serialization {
        key: kind.to_string(),
        reason: e.to_string(),
    })
}

fn require_voiding_diary(store: &dyn KeyValueStore, diary_id: &str) -> Result<(), DatabaseError> {
    match get_diary(store, diary_id)? {
        Some(diary) if diary.diary_type == DiaryType::Voiding => Ok(()),
        _ => Err(DatabaseError::not_found("voiding diary", diary_id)),
    }
}

/// Insert or replace an intake by id.
pub fn upsert_fluid_intake(
    store: &dyn KeyValueStore,
    intake: &FluidIntake,
) -> Result<(), DatabaseError> {
    let value = to_value(intake, "fluidIntake")?;
    update_data(store, |data| upsert_value(&mut data.fluid_intakes, &intake.id, value))?;
    Ok(())
}

/// Insert or replace a voiding by id.
pub fn upsert_voiding_entry(
    store: &dyn KeyValueStore,
    entry: &VoidingEntry,
) -> Result<(), DatabaseError> {
    let value = to_value(entry, "voidingEntry")?;
    update_data(store, |data| upsert_value(&mut data.voiding_entries, &entry.id, value))?;
    Ok(())
}

/// Returns whether an intake was removed.
pub fn remove_fluid_intake(store: &dyn KeyValueStore, id: &str) -> Result<bool, DatabaseError> {
    let mut removed = false;
    update_data(store, |data| {
        let before = data.fluid_intakes.len();
        data.fluid_intakes.retain(|v| value_id(v) != Some(id));
        removed = data.fluid_intakes.len() != before;
    })?;
    Ok(removed)
}

/// Returns whether a voiding was removed.
pub fn remove_voiding_entry(store: &dyn KeyValueStore, id: &str) -> Result<bool, DatabaseError> {
    let mut removed = false;
    update_data(store, |data| {
        let before = data.voiding_entries.len();
        data.voiding_entries.retain(|v| value_id(v) != Some(id));
        removed = data.voiding_entries.len() != before;
    })?;
    Ok(removed)
}

/// Drop every record filed under `diary_id`. Returns how many went.
pub fn remove_diary_records(store: &dyn KeyValueStore, diary_id: &str) -> Result<usize, DatabaseError> {
    let mut dropped = 0;
    let belongs = |v: &serde_json::Value| v.get("diaryId").and_then(|d| d.as_str()) == Some(diary_id);
    update_data(store, |data| {
        let before = data.fluid_intakes.len() + data.voiding_entries.len();
        data.fluid_intakes.retain(|v| !belongs(v));
        data.voiding_entries.retain(|v| !belongs(v));
        dropped = before - data.fluid_intakes.len() - data.voiding_entries.len();
    })?;
    Ok(dropped)
}

/// Record a drink at `at` in a voiding diary.
pub fn record_fluid_intake(
    store: &dyn KeyValueStore,
    diary_id: &str,
    at: DateTime<FixedOffset>,
    intake_type: FluidIntakeType,
    volume_ml: u32,
    label: Option<String>,
) -> Result<FluidIntake, DatabaseError> {
    require_voiding_diary(store, diary_id)?;
    let intake = FluidIntake {
        id: new_id(),
        diary_id: diary_id.to_string(),
        date: at.date_naive(),
        timestamp: at.to_rfc3339(),
        intake_type,
        volume_ml,
        label: label.map(|l| l.trim().to_string()).filter(|l| !l.is_empty()),
    };
    upsert_fluid_intake(store, &intake)?;
    tracing::debug!(diary_id, volume_ml, "Fluid intake recorded");
    Ok(intake)
}

/// Record a voiding at `at` in a voiding diary.
pub fn record_voiding(
    store: &dyn KeyValueStore,
    diary_id: &str,
    at: DateTime<FixedOffset>,
    volume_ml: Option<u32>,
    urgency: bool,
    burning: bool,
) -> Result<VoidingEntry, DatabaseError> {
    require_voiding_diary(store, diary_id)?;
    let entry = VoidingEntry {
        id: new_id(),
        diary_id: diary_id.to_string(),
        date: at.date_naive(),
        timestamp: at.to_rfc3339(),
        volume_ml,
        urgency,
        burning,
    };
    upsert_voiding_entry(store, &entry)?;
    tracing::debug!(diary_id, urgency, burning, "Voiding recorded");
    Ok(entry)
}

// ═══════════════════════════════════════════
// Queries
// ═══════════════════════════════════════════

pub fn fluid_intakes_for(
    store: &dyn KeyValueStore,
    diary_id: &str,
    date: NaiveDate,
) -> Result<Vec<FluidIntake>, DatabaseError> {
    let mut list = fluid_intakes_for_diary(store, diary_id)?;
    list.retain(|f| f.date == date);
    Ok(list)
}

pub fn fluid_intakes_for_diary(
    store: &dyn KeyValueStore,
    diary_id: &str,
) -> Result<Vec<FluidIntake>, DatabaseError> {
    let data = load_data(store)?;
    Ok(data
        .fluid_intakes()
        .into_iter()
        .filter(|f| f.diary_id == diary_id)
        .collect())
}

pub fn voiding_entries_for(
    store: &dyn KeyValueStore,
    diary_id: &str,
    date: NaiveDate,
) -> Result<Vec<VoidingEntry>, DatabaseError> {
    let mut list = voiding_entries_for_diary(store, diary_id)?;
    list.retain(|v| v.date == date);
    Ok(list)
}

/// Voidings of a diary. Legacy records without boolean flags are skipped.
pub fn voiding_entries_for_diary(
    store: &dyn KeyValueStore,
    diary_id: &str,
) -> Result<Vec<VoidingEntry>, DatabaseError> {
    let data = load_data(store)?;
    Ok(data
        .voiding_entries()
        .into_iter()
        .filter(|v| v.diary_id == diary_id)
        .collect())
}

// ═══════════════════════════════════════════
// Time blocks
// ═══════════════════════════════════════════

/// Block 0..=11 for an hour 0..=23.
pub fn block_index(hour: u32) -> usize {
    (hour.min(23) / 2) as usize
}

fn block_of<Tz: TimeZone>(timestamp: &str, tz: &Tz) -> Option<usize> {
    DateTime::parse_from_rfc3339(timestamp.trim())
        .ok()
        .map(|t| block_index(t.with_timezone(tz).hour()))
}

/// Group records into the twelve two-hour blocks of local time.
pub fn group_by_time_block(fluids: &[FluidIntake], voidings: &[VoidingEntry]) -> Vec<TimeBlock> {
    group_by_time_block_in(fluids, voidings, &Local)
}

/// Same as [`group_by_time_block`] for an explicit time zone.
pub fn group_by_time_block_in<Tz: TimeZone>(
    fluids: &[FluidIntake],
    voidings: &[VoidingEntry],
    tz: &Tz,
) -> Vec<TimeBlock> {
    let mut blocks: Vec<TimeBlock> = BLOCK_LABELS
        .iter()
        .map(|&(start, end)| TimeBlock {
            start,
            end,
            fluids: Vec::new(),
            voidings: Vec::new(),
            total_fluid_in: 0,
            total_urine_out: 0,
        })
        .collect();

    for f in fluids {
        let Some(idx) = block_of(&f.timestamp, tz) else {
            tracing::warn!(id = %f.id, timestamp = %f.timestamp, "Skipping intake with bad timestamp");
            continue;
        };
        blocks[idx].total_fluid_in += u64::from(f.volume_ml);
        blocks[idx].fluids.push(f.clone());
    }
    for v in voidings {
        let Some(idx) = block_of(&v.timestamp, tz) else {
            tracing::warn!(id = %v.id, timestamp = %v.timestamp, "Skipping voiding with bad timestamp");
            continue;
        };
        blocks[idx].total_urine_out += u64::from(v.volume_ml.unwrap_or(0));
        blocks[idx].voidings.push(v.clone());
    }
    blocks
}

pub fn daily_summary(fluids: &[FluidIntake], voidings: &[VoidingEntry]) -> DailySummary {
    DailySummary {
        total_fluid_in: fluids.iter().map(|f| u64::from(f.volume_ml)).sum(),
        total_urine_out: voidings.iter().filter_map(|v| v.volume_ml).map(u64::from).sum(),
        intake_count: fluids.len(),
        voiding_count: voidings.len(),
        urgency_count: voidings.iter().filter(|v| v.urgency).count(),
        burning_count: voidings.iter().filter(|v| v.burning).count(),
    }
}
