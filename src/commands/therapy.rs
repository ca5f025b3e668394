//! Therapy plan commands.
//!
//! Every plan edit is followed by a reminder sync so medicine reminders
//! track added, paused, resumed and re-timed therapies.

use chrono::NaiveDate;
use serde::Serialize;

use super::{open, parse_date, validate_name, validate_notes, validate_time};
use crate::core_state::CoreState;
use crate::models::{
    AlternateFrequency, NewTherapy, TherapyForm, TherapyHistoryEntry, TherapyPatch,
    TherapyPlanItem, TherapyVariation,
};
use crate::notifications as notif;
use crate::store::SqliteStore;
use crate::therapy::{self as plan, DoseStep};

fn validate_partner(
    therapy_plan: &[TherapyPlanItem],
    own_id: Option<u32>,
    partner: Option<u32>,
) -> Result<(), String> {
    let Some(partner) = partner else {
        return Ok(());
    };
    if own_id == Some(partner) {
        return Err("A therapy cannot alternate with itself".into());
    }
    if !therapy_plan.iter().any(|t| t.id == partner) {
        return Err(format!("No therapy with id {partner} to alternate with"));
    }
    Ok(())
}

fn validate_months(
    frequency: Option<AlternateFrequency>,
    months: Option<u32>,
) -> Result<(), String> {
    if frequency == Some(AlternateFrequency::MonthsByMonths) && months == Some(0) {
        return Err("Alternation months must be at least 1".into());
    }
    Ok(())
}

fn validate_variation(variation: Option<&TherapyVariation>) -> Result<(), String> {
    let Some(v) = variation else {
        return Ok(());
    };
    if v.every_value == 0 {
        return Err("Dose change interval must be at least 1".into());
    }
    if !(v.initial_qty.is_finite() && v.increase_by.is_finite() && v.final_qty.is_finite()) {
        return Err("Dose quantities must be numbers".into());
    }
    if v.initial_qty < 0.0 || v.final_qty < 0.0 {
        return Err("Dose quantities cannot be negative".into());
    }
    Ok(())
}

fn sync_reminders(store: &SqliteStore) -> Result<(), String> {
    let therapy_plan = plan::load_therapy_plan(store).map_err(|e| e.to_string())?;
    notif::sync_medicine_reminders(store, &therapy_plan).map_err(|e| e.to_string())?;
    Ok(())
}

pub fn list_therapies(state: &CoreState) -> Result<Vec<TherapyPlanItem>, String> {
    let store = open(state)?;
    plan::load_therapy_plan(&store).map_err(|e| e.to_string())
}

/// Therapies scheduled on `date`, ordered by time of day, then id.
pub fn therapies_on(date: NaiveDate, state: &CoreState) -> Result<Vec<TherapyPlanItem>, String> {
    let store = open(state)?;
    let therapy_plan = plan::load_therapy_plan(&store).map_err(|e| e.to_string())?;
    Ok(plan::therapies_for_day(&therapy_plan, date)
        .into_iter()
        .cloned()
        .collect())
}

pub fn add_therapy(therapy: NewTherapy, state: &CoreState) -> Result<TherapyPlanItem, String> {
    validate_name("Name", &therapy.name)?;
    validate_time(&therapy.time)?;
    parse_date(&therapy.start_date)?;
    validate_notes(&therapy.notes)?;
    validate_months(therapy.alternate_frequency, therapy.alternate_months_value)?;
    validate_variation(therapy.therapy_variation.as_ref())?;

    let store = open(state)?;
    let therapy_plan = plan::load_therapy_plan(&store).map_err(|e| e.to_string())?;
    validate_partner(&therapy_plan, None, therapy.alternate_with_id)?;

    let item = plan::add_therapy(&store, therapy).map_err(|e| e.to_string())?;
    sync_reminders(&store)?;
    Ok(item)
}

pub fn update_therapy(
    id: u32,
    patch: TherapyPatch,
    state: &CoreState,
) -> Result<TherapyPlanItem, String> {
    if let Some(ref name) = patch.name {
        validate_name("Name", name)?;
    }
    if let Some(ref time) = patch.time {
        validate_time(time)?;
    }
    if let Some(ref start) = patch.start_date {
        parse_date(start)?;
    }
    if let Some(ref notes) = patch.notes {
        validate_notes(notes)?;
    }
    if let Some(Some(ref variation)) = patch.therapy_variation {
        validate_variation(Some(variation))?;
    }

    let store = open(state)?;
    let therapy_plan = plan::load_therapy_plan(&store).map_err(|e| e.to_string())?;
    let current = therapy_plan
        .iter()
        .find(|t| t.id == id)
        .ok_or_else(|| format!("No therapy with id {id}"))?;

    if let Some(partner) = patch.alternate_with_id {
        validate_partner(&therapy_plan, Some(id), partner)?;
    }
    let frequency = patch
        .alternate_frequency
        .unwrap_or(current.alternate_frequency);
    let months = patch
        .alternate_months_value
        .unwrap_or(current.alternate_months_value);
    validate_months(frequency, months)?;

    let item = plan::update_therapy(&store, id, patch).map_err(|e| e.to_string())?;
    sync_reminders(&store)?;
    Ok(item)
}

pub fn pause_therapy(id: u32, state: &CoreState) -> Result<TherapyPlanItem, String> {
    let store = open(state)?;
    let item = plan::set_paused(&store, id, true).map_err(|e| e.to_string())?;
    sync_reminders(&store)?;
    Ok(item)
}

pub fn resume_therapy(id: u32, state: &CoreState) -> Result<TherapyPlanItem, String> {
    let store = open(state)?;
    let item = plan::set_paused(&store, id, false).map_err(|e| e.to_string())?;
    sync_reminders(&store)?;
    Ok(item)
}

pub fn remove_therapy(id: u32, state: &CoreState) -> Result<TherapyPlanItem, String> {
    let store = open(state)?;
    let item = plan::remove_therapy(&store, id).map_err(|e| e.to_string())?;
    sync_reminders(&store)?;
    Ok(item)
}

pub fn therapy_history(state: &CoreState) -> Result<Vec<TherapyHistoryEntry>, String> {
    let store = open(state)?;
    plan::load_therapy_history(&store).map_err(|e| e.to_string())
}

/// Dates on which the therapy's dose changes.
pub fn therapy_schedule(id: u32, state: &CoreState) -> Result<Vec<DoseStep>, String> {
    let store = open(state)?;
    let therapy_plan = plan::load_therapy_plan(&store).map_err(|e| e.to_string())?;
    let item = therapy_plan
        .iter()
        .find(|t| t.id == id)
        .ok_or_else(|| format!("No therapy with id {id}"))?;
    Ok(plan::dose_changes(item))
}

/// Write the starter plan on first run. Returns false when a plan exists.
pub fn seed_default_plan(state: &CoreState) -> Result<bool, String> {
    let store = open(state)?;
    let seeded = plan::seed_default_plan(&store).map_err(|e| e.to_string())?;
    if seeded {
        sync_reminders(&store)?;
    }
    Ok(seeded)
}

/// A therapy form as offered in the add dialog.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormInfo {
    pub form: TherapyForm,
    pub label: &'static str,
    pub oral: bool,
    pub units: &'static [&'static str],
}

pub fn therapy_forms() -> Vec<FormInfo> {
    TherapyForm::ALL
        .iter()
        .map(|&form| FormInfo {
            form,
            label: form.label(),
            oral: plan::display::is_oral_form(form),
            units: plan::display::posology_units(form),
        })
        .collect()
}
