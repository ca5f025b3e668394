//! Diary commands.

use super::{open, validate_name};
use crate::core_state::CoreState;
use crate::diaries;
use crate::models::{Diary, DiaryPatch, NewDiary};

/// Longest personal diary body.
pub const MAX_CONTENT_LEN: usize = 20_000;

fn validate_content(content: Option<&String>) -> Result<(), String> {
    match content {
        Some(c) if c.chars().count() > MAX_CONTENT_LEN => Err(format!(
            "Diary text must be {MAX_CONTENT_LEN} characters or fewer"
        )),
        _ => Ok(()),
    }
}

pub fn list_diaries(state: &CoreState) -> Result<Vec<Diary>, String> {
    let store = open(state)?;
    diaries::list_diaries(&store).map_err(|e| e.to_string())
}

pub fn get_diary(id: &str, state: &CoreState) -> Result<Diary, String> {
    let store = open(state)?;
    diaries::get_diary(&store, id)
        .map_err(|e| e.to_string())?
        .ok_or_else(|| format!("No diary with id {id}"))
}

pub fn add_diary(diary: NewDiary, state: &CoreState) -> Result<Diary, String> {
    validate_name("Diary name", &diary.name)?;
    validate_content(diary.content.as_ref())?;
    let store = open(state)?;
    diaries::add_diary(&store, diary).map_err(|e| e.to_string())
}

pub fn update_diary(id: &str, patch: DiaryPatch, state: &CoreState) -> Result<Diary, String> {
    if let Some(ref name) = patch.name {
        validate_name("Diary name", name)?;
    }
    validate_content(patch.content.as_ref())?;
    let store = open(state)?;
    diaries::update_diary(&store, id, patch).map_err(|e| e.to_string())
}

/// Remove a diary; a voiding diary's records go with it.
pub fn remove_diary(id: &str, state: &CoreState) -> Result<Diary, String> {
    let store = open(state)?;
    diaries::remove_diary(&store, id).map_err(|e| e.to_string())
}
