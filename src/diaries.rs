//! Diary list (`dyna_diaries_v1`).

use crate::data::new_id;
use crate::db::DatabaseError;
use crate::models::{Diary, DiaryPatch, DiaryType, NewDiary};
use crate::store::{keys, load_items, save_items, KeyValueStore};
use crate::voiding;

/// Load every diary. Diaries that cannot be read are skipped here and
/// kept in storage.
pub fn list_diaries(store: &dyn KeyValueStore) -> Result<Vec<Diary>, DatabaseError> {
    load_items(store, keys::DIARIES)
}

fn save_diaries(store: &dyn KeyValueStore, diaries: &[Diary]) -> Result<(), DatabaseError> {
    save_items(store, keys::DIARIES, diaries)
}

/// Personal diaries always carry a body; voiding diaries never do.
fn normalize_content(diary: &mut Diary) {
    diary.content = match diary.diary_type {
        DiaryType::Personal => Some(diary.content.take().unwrap_or_default()),
        DiaryType::Voiding => None,
    };
}

pub fn get_diary(store: &dyn KeyValueStore, id: &str) -> Result<Option<Diary>, DatabaseError> {
    Ok(list_diaries(store)?.into_iter().find(|d| d.id == id))
}

pub fn add_diary(store: &dyn KeyValueStore, new: NewDiary) -> Result<Diary, DatabaseError> {
    let mut diaries = list_diaries(store)?;
    let mut diary = Diary {
        id: new_id(),
        name: new.name.trim().to_string(),
        diary_type: new.diary_type,
        start_date: new.start_date,
        content: new.content,
    };
    normalize_content(&mut diary);
    diaries.push(diary.clone());
    save_diaries(store, &diaries)?;
    tracing::info!(diary_id = %diary.id, diary_type = diary.diary_type.as_str(), "Diary added");
    Ok(diary)
}

pub fn update_diary(
    store: &dyn KeyValueStore,
    id: &str,
    patch: DiaryPatch,
) -> Result<Diary, DatabaseError> {
    let mut diaries = list_diaries(store)?;
    let diary = diaries
        .iter_mut()
        .find(|d| d.id == id)
        .ok_or_else(|| DatabaseError::not_found("diary", id))?;

    if let Some(name) = patch.name {
        diary.name = name.trim().to_string();
    }
    if let Some(kind) = patch.diary_type {
        diary.diary_type = kind;
    }
    if let Some(start) = patch.start_date {
        diary.start_date = start;
    }
    if let Some(content) = patch.content {
        diary.content = Some(content);
    }
    normalize_content(diary);

    let updated = diary.clone();
    save_diaries(store, &diaries)?;
    Ok(updated)
}

/// Remove a diary. A voiding diary takes its fluid and voiding records
/// with it.
pub fn remove_diary(store: &dyn KeyValueStore, id: &str) -> Result<Diary, DatabaseError> {
    let mut diaries = list_diaries(store)?;
    let idx = diaries
        .iter()
        .position(|d| d.id == id)
        .ok_or_else(|| DatabaseError::not_found("diary", id))?;
    let removed = diaries.remove(idx);
    save_diaries(store, &diaries)?;

    if removed.diary_type == DiaryType::Voiding {
        let dropped = voiding::remove_diary_records(store, id)?;
        tracing::info!(diary_id = %id, records = dropped, "Voiding records removed with diary");
    }
    tracing::info!(diary_id = %id, "Diary removed");
    Ok(removed)
}
