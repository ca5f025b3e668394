//! Profile commands.

use chrono::NaiveDate;
use serde::Serialize;

use super::{open, validate_name, validate_notes};
use crate::core_state::CoreState;
use crate::models::{Profile, ProfilePatch, Specialist, SpecialistType, SwabScores, SwabVisit};
use crate::profile;

/// Oldest accepted age.
pub const MAX_AGE: u32 = 120;

/// Highest swab test score per zone.
pub const MAX_SWAB_SCORE: u8 = 10;

/// Profile plus the values derived from it for display.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileView {
    pub profile: Profile,
    pub display_name: Option<String>,
    pub age: Option<u32>,
}

fn validate_scores(scores: &SwabScores) -> Result<(), String> {
    let all = [
        scores.clitoride,
        scores.orefizio_uretrale,
        scores.labbro_destro,
        scores.labbro_sinistro,
        scores.forchetta,
    ];
    if all.into_iter().flatten().any(|s| s > MAX_SWAB_SCORE) {
        return Err(format!("Swab scores must be between 0 and {MAX_SWAB_SCORE}"));
    }
    Ok(())
}

fn validate_patch(patch: &ProfilePatch) -> Result<(), String> {
    for (field, value) in [
        ("Name", &patch.name),
        ("First name", &patch.first_name),
        ("Last name", &patch.last_name),
    ] {
        if let Some(v) = value {
            validate_name(field, v)?;
        }
    }
    if let Some(age) = patch.age {
        if age > MAX_AGE {
            return Err(format!("Age must be {MAX_AGE} or less"));
        }
    }
    if let (Some(born), Some(diagnosed)) = (patch.date_of_birth, patch.diagnosis_date) {
        if diagnosed < born {
            return Err("Diagnosis date cannot precede date of birth".into());
        }
    }
    if let Some(ref swab) = patch.swab_test {
        if let Some(ref note) = swab.note {
            validate_notes(note)?;
        }
        if let Some(ref scores) = swab.scores {
            validate_scores(scores)?;
        }
    }
    for visit in patch.swab_visits.iter().flatten() {
        validate_scores(&visit.swab_scores)?;
    }
    Ok(())
}

pub fn get_profile(today: NaiveDate, state: &CoreState) -> Result<ProfileView, String> {
    let store = open(state)?;
    let profile = profile::get_profile(&store).map_err(|e| e.to_string())?;
    Ok(ProfileView {
        display_name: profile::display_name(&profile),
        age: profile::age_on(&profile, today),
        profile,
    })
}

pub fn update_profile(patch: ProfilePatch, state: &CoreState) -> Result<Profile, String> {
    validate_patch(&patch)?;
    let store = open(state)?;
    profile::update_profile(&store, patch).map_err(|e| e.to_string())
}

pub fn add_swab_visit(
    date: NaiveDate,
    scores: SwabScores,
    state: &CoreState,
) -> Result<SwabVisit, String> {
    validate_scores(&scores)?;
    let store = open(state)?;
    profile::add_swab_visit(&store, date, scores).map_err(|e| e.to_string())
}

pub fn remove_swab_visit(id: &str, state: &CoreState) -> Result<SwabVisit, String> {
    let store = open(state)?;
    profile::remove_swab_visit(&store, id).map_err(|e| e.to_string())
}

pub fn add_specialist(
    specialist_type: SpecialistType,
    type_other: Option<String>,
    start_date: NaiveDate,
    state: &CoreState,
) -> Result<Specialist, String> {
    if let Some(ref other) = type_other {
        validate_name("Specialist type", other)?;
    }
    let store = open(state)?;
    profile::add_specialist(&store, specialist_type, type_other, start_date)
        .map_err(|e| e.to_string())
}

pub fn end_specialist(
    id: &str,
    end_date: NaiveDate,
    state: &CoreState,
) -> Result<Specialist, String> {
    let store = open(state)?;
    let current = profile::get_profile(&store).map_err(|e| e.to_string())?;
    if let Some(s) = current.specialists.iter().find(|s| s.id == id) {
        if end_date < s.start_date {
            return Err("End date cannot precede start date".into());
        }
    }
    profile::end_specialist(&store, id, end_date).map_err(|e| e.to_string())
}
