//! Voiding diary commands.

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::Serialize;

use super::{open, MAX_NAME_LEN};
use crate::core_state::CoreState;
use crate::diaries;
use crate::models::{FluidIntake, FluidIntakeType, VoidingEntry};
use crate::voiding::{self, DailySummary, TimeBlock};

/// Largest single volume accepted, in millilitres.
pub const MAX_VOLUME_ML: u32 = 5000;

/// One day of a voiding diary, grouped into two-hour blocks.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoidingDay {
    pub diary_id: String,
    pub date: NaiveDate,
    pub blocks: Vec<TimeBlock>,
    pub summary: DailySummary,
}

fn validate_volume(volume_ml: u32) -> Result<(), String> {
    if volume_ml == 0 || volume_ml > MAX_VOLUME_ML {
        return Err(format!("Volume must be between 1 and {MAX_VOLUME_ML} ml"));
    }
    Ok(())
}

pub fn add_fluid_intake(
    diary_id: &str,
    at: DateTime<FixedOffset>,
    intake_type: FluidIntakeType,
    volume_ml: u32,
    label: Option<String>,
    state: &CoreState,
) -> Result<FluidIntake, String> {
    validate_volume(volume_ml)?;
    if let Some(ref l) = label {
        if l.chars().count() > MAX_NAME_LEN {
            return Err("Label too long".into());
        }
    }
    let store = open(state)?;
    voiding::record_fluid_intake(&store, diary_id, at, intake_type, volume_ml, label)
        .map_err(|e| e.to_string())
}

pub fn add_voiding(
    diary_id: &str,
    at: DateTime<FixedOffset>,
    volume_ml: Option<u32>,
    urgency: bool,
    burning: bool,
    state: &CoreState,
) -> Result<VoidingEntry, String> {
    if let Some(v) = volume_ml {
        validate_volume(v)?;
    }
    let store = open(state)?;
    voiding::record_voiding(&store, diary_id, at, volume_ml, urgency, burning)
        .map_err(|e| e.to_string())
}

/// Remove an intake or a voiding by id.
pub fn remove_record(id: &str, state: &CoreState) -> Result<(), String> {
    let store = open(state)?;
    if voiding::remove_fluid_intake(&store, id).map_err(|e| e.to_string())? {
        return Ok(());
    }
    if voiding::remove_voiding_entry(&store, id).map_err(|e| e.to_string())? {
        return Ok(());
    }
    Err(format!("No voiding diary record with id {id}"))
}

pub fn voiding_day(
    diary_id: &str,
    date: NaiveDate,
    state: &CoreState,
) -> Result<VoidingDay, String> {
    let store = open(state)?;
    if diaries::get_diary(&store, diary_id)
        .map_err(|e| e.to_string())?
        .is_none()
    {
        return Err(format!("No diary with id {diary_id}"));
    }
    let fluids = voiding::fluid_intakes_for(&store, diary_id, date).map_err(|e| e.to_string())?;
    let voidings =
        voiding::voiding_entries_for(&store, diary_id, date).map_err(|e| e.to_string())?;

    Ok(VoidingDay {
        diary_id: diary_id.to_string(),
        date,
        blocks: voiding::group_by_time_block(&fluids, &voidings),
        summary: voiding::daily_summary(&fluids, &voidings),
    })
}

#[cfg(test)]
mod tests {
    use super::super::{parse_date, parse_instant, test_state};
    use super::*;
    use crate::commands::diary;
    use crate::models::{DiaryType, NewDiary};

    fn voiding_diary(state: &CoreState) -> String {
        let new = NewDiary {
            name: "Minzionale".into(),
            diary_type: DiaryType::Voiding,
            start_date: parse_date("2024-02-01").unwrap(),
            content: None,
        };
        diary::add_diary(new, state).unwrap().id
    }

    #[test]
    fn volume_limits() {
        let (_dir, state) = test_state();
        let id = voiding_diary(&state);
        let at = parse_instant("2024-02-01T08:15:00+01:00").unwrap();
        assert!(add_fluid_intake(&id, at, FluidIntakeType::Water, 0, None, &state).is_err());
        assert!(add_fluid_intake(&id, at, FluidIntakeType::Water, 6000, None, &state).is_err());
        assert!(add_voiding(&id, at, Some(0), false, false, &state).is_err());
        assert!(add_voiding(&id, at, None, true, false, &state).is_ok());
    }

    #[test]
    fn day_summary_counts_records() {
        let (_dir, state) = test_state();
        let id = voiding_diary(&state);
        let morning = parse_instant("2024-02-01T08:15:00+01:00").unwrap();
        let evening = parse_instant("2024-02-01T20:40:00+01:00").unwrap();

        add_fluid_intake(&id, morning, FluidIntakeType::Coffee, 150, None, &state).unwrap();
        add_fluid_intake(&id, evening, FluidIntakeType::Water, 300, None, &state).unwrap();
        let v = add_voiding(&id, evening, Some(250), true, true, &state).unwrap();

        let day = voiding_day(&id, parse_date("2024-02-01").unwrap(), &state).unwrap();
        assert_eq!(day.blocks.len(), 12);
        assert_eq!(day.summary.total_fluid_in, 450);
        assert_eq!(day.summary.total_urine_out, 250);
        assert_eq!(day.summary.burning_count, 1);

        remove_record(&v.id, &state).unwrap();
        assert!(remove_record(&v.id, &state).is_err());
        let day = voiding_day(&id, parse_date("2024-02-01").unwrap(), &state).unwrap();
        assert_eq!(day.summary.voiding_count, 0);
    }

    #[test]
    fn personal_diary_cannot_hold_records() {
        let (_dir, state) = test_state();
        let new = NewDiary {
            name: "Note".into(),
            diary_type: DiaryType::Personal,
            start_date: parse_date("2024-02-01").unwrap(),
            content: None,
        };
        let id = diary::add_diary(new, &state).unwrap().id;
        let at = parse_instant("2024-02-01T08:15:00+01:00").unwrap();
        assert!(add_voiding(&id, at, None, false, false, &state).is_err());
        assert!(voiding_day("missing", at.date_naive(), &state).is_err());
    }
}
