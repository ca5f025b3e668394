//! Therapy plan: editable medication list, change history, and the
//! scheduling rules that decide what is taken on a given day.

pub mod display;
pub mod schedule;
pub mod variation;

use chrono::Utc;

use crate::data::new_id;
use crate::db::DatabaseError;
use crate::models::{
    AlternateFrequency, DurationType, NewTherapy, TherapyAction, TherapyDuration, TherapyForm,
    TherapyHistoryEntry, TherapyPatch, TherapyPlanItem,
};
use crate::store::{keys, load_items, load_json, save_items, KeyValueStore, Lenient};

pub use display::*;
pub use schedule::*;
pub use variation::*;

const DEFAULT_THERAPY_NAME: &str = "Nuovo farmaco";
const DEFAULT_THERAPY_TIME: &str = "09:00";

// ═══════════════════════════════════════════
// Plan storage
// ═══════════════════════════════════════════

/// Load the plan. Items that cannot be read are skipped here and kept in
/// storage; a malformed document yields an empty plan.
pub fn load_therapy_plan(
    store: &dyn KeyValueStore,
) -> Result<Vec<TherapyPlanItem>, DatabaseError> {
    let plan: Vec<TherapyPlanItem> = load_items(store, keys::THERAPY_PLAN)?;
    Ok(plan.into_iter().map(normalize_item).collect())
}

pub fn save_therapy_plan(
    store: &dyn KeyValueStore,
    plan: &[TherapyPlanItem],
) -> Result<(), DatabaseError> {
    save_items(store, keys::THERAPY_PLAN, plan)
}

/// Defaults applied on every save: a name and a time are always set,
/// and the month count only survives with the months frequency.
fn normalize_item(mut item: TherapyPlanItem) -> TherapyPlanItem {
    if item.name.trim().is_empty() {
        item.name = DEFAULT_THERAPY_NAME.to_string();
    } else {
        item.name = item.name.trim().to_string();
    }
    if item.time.trim().is_empty() {
        item.time = DEFAULT_THERAPY_TIME.to_string();
    }
    if item.alternate_frequency != Some(AlternateFrequency::MonthsByMonths) {
        item.alternate_months_value = None;
    }
    if item.form != TherapyForm::Other {
        item.form_other = None;
    }
    item.notes = item.notes.trim().to_string();
    item
}

/// One past the highest id in use, counting stored items that could not
/// be read.
fn next_id(store: &dyn KeyValueStore, plan: &[TherapyPlanItem]) -> Result<u32, DatabaseError> {
    let stored: Lenient<TherapyPlanItem> = load_json(store, keys::THERAPY_PLAN)?;
    let unreadable_max = stored
        .unreadable()
        .iter()
        .filter_map(|v| v.get("id").and_then(|id| id.as_u64()))
        .filter_map(|id| u32::try_from(id).ok())
        .max();
    let max = plan.iter().map(|t| t.id).max().max(unreadable_max).unwrap_or(0);
    Ok(max + 1)
}

fn find_item(plan: &[TherapyPlanItem], id: u32) -> Result<usize, DatabaseError> {
    plan.iter()
        .position(|t| t.id == id)
        .ok_or_else(|| DatabaseError::not_found("therapy", id))
}

// ═══════════════════════════════════════════
// Plan mutations (each one is recorded in the history)
// ═══════════════════════════════════════════

/// Append a new item with the next free id.
pub fn add_therapy(
    store: &dyn KeyValueStore,
    therapy: NewTherapy,
) -> Result<TherapyPlanItem, DatabaseError> {
    let mut plan = load_therapy_plan(store)?;
    let item = normalize_item(therapy.into_item(next_id(store, &plan)?));
    plan.push(item.clone());
    save_therapy_plan(store, &plan)?;
    record_history(store, TherapyAction::Added, &item)?;
    tracing::info!(therapy_id = item.id, "Therapy added");
    Ok(item)
}

/// Apply a patch to an item. Pausing/resuming is recorded as such.
pub fn update_therapy(
    store: &dyn KeyValueStore,
    id: u32,
    patch: TherapyPatch,
) -> Result<TherapyPlanItem, DatabaseError> {
    let mut plan = load_therapy_plan(store)?;
    let idx = find_item(&plan, id)?;

    let action = match patch.paused {
        Some(true) => TherapyAction::Paused,
        Some(false) => TherapyAction::Resumed,
        None => TherapyAction::Modified,
    };

    let item = apply_patch(plan[idx].clone(), patch);
    plan[idx] = normalize_item(item);
    let updated = plan[idx].clone();

    save_therapy_plan(store, &plan)?;
    record_history(store, action, &updated)?;
    tracing::info!(therapy_id = id, action = action.as_str(), "Therapy updated");
    Ok(updated)
}

fn apply_patch(mut item: TherapyPlanItem, patch: TherapyPatch) -> TherapyPlanItem {
    if let Some(v) = patch.name {
        item.name = v;
    }
    if let Some(v) = patch.form {
        item.form = v;
    }
    if let Some(v) = patch.quantity {
        item.quantity = v;
    }
    if let Some(v) = patch.posology {
        item.posology = v;
    }
    if let Some(v) = patch.start_date {
        item.start_date = v;
    }
    if let Some(v) = patch.duration {
        item.duration = v;
    }
    if let Some(v) = patch.therapy_variation {
        item.therapy_variation = v;
    }
    if let Some(v) = patch.alternate_with_id {
        item.alternate_with_id = v;
    }
    if let Some(v) = patch.alternate_frequency {
        item.alternate_frequency = v;
    }
    if let Some(v) = patch.alternate_months_value {
        item.alternate_months_value = v;
    }
    if let Some(v) = patch.time {
        item.time = v;
    }
    if let Some(v) = patch.cream_time_of_day {
        item.cream_time_of_day = v;
    }
    if let Some(v) = patch.paused {
        item.paused = v;
    }
    if let Some(v) = patch.notes {
        item.notes = v;
    }
    item
}

pub fn set_paused(
    store: &dyn KeyValueStore,
    id: u32,
    paused: bool,
) -> Result<TherapyPlanItem, DatabaseError> {
    update_therapy(
        store,
        id,
        TherapyPatch {
            paused: Some(paused),
            ..TherapyPatch::default()
        },
    )
}

/// Remove an item. Any partner that alternated with it loses the link.
pub fn remove_therapy(
    store: &dyn KeyValueStore,
    id: u32,
) -> Result<TherapyPlanItem, DatabaseError> {
    let mut plan = load_therapy_plan(store)?;
    let idx = find_item(&plan, id)?;
    let removed = plan.remove(idx);

    for other in plan.iter_mut().filter(|t| t.alternate_with_id == Some(id)) {
        other.alternate_with_id = None;
        tracing::debug!(therapy_id = other.id, removed_id = id, "Cleared alternation link");
    }

    save_therapy_plan(store, &plan)?;
    record_history(store, TherapyAction::Removed, &removed)?;
    tracing::info!(therapy_id = id, "Therapy removed");
    Ok(removed)
}

// ═══════════════════════════════════════════
// History
// ═══════════════════════════════════════════

/// History, newest first.
pub fn load_therapy_history(
    store: &dyn KeyValueStore,
) -> Result<Vec<TherapyHistoryEntry>, DatabaseError> {
    load_items(store, keys::THERAPY_HISTORY)
}

fn record_history(
    store: &dyn KeyValueStore,
    action: TherapyAction,
    item: &TherapyPlanItem,
) -> Result<(), DatabaseError> {
    let mut history = load_therapy_history(store)?;
    history.insert(
        0,
        TherapyHistoryEntry {
            id: new_id(),
            date: Utc::now(),
            action,
            detail: item.name.clone(),
            therapy_id: Some(item.id),
        },
    );
    save_items(store, keys::THERAPY_HISTORY, &history)
}

// ═══════════════════════════════════════════
// Starter plan
// ═══════════════════════════════════════════

fn starter(
    id: u32,
    name: &str,
    form: TherapyForm,
    quantity: &str,
    months: u32,
    time: &str,
) -> TherapyPlanItem {
    TherapyPlanItem {
        id,
        name: name.into(),
        form,
        form_other: None,
        quantity: quantity.into(),
        posology: None,
        start_date: "2024-01-01".into(),
        duration: TherapyDuration {
            duration_type: DurationType::Months,
            value: months,
        },
        quantity_change_date: None,
        quantity_after_change: None,
        gocce_ramp: None,
        therapy_variation: None,
        alternate_with_id: None,
        alternate_frequency: None,
        alternate_months_value: None,
        time: time.into(),
        cream_time_of_day: None,
        paused: false,
        notes: String::new(),
    }
}

/// The four-item plan offered on first run.
pub fn default_plan() -> Vec<TherapyPlanItem> {
    vec![
        starter(1, "Amitriptilina", TherapyForm::Tablet, "10mg", 6, "22:00"),
        starter(2, "Lilith", TherapyForm::Sachet, "1 bustina", 3, "08:00"),
        starter(3, "Deha / Ubigel", TherapyForm::Cream, "", 6, "22:30"),
        starter(4, "Diazepam", TherapyForm::Tablet, "2.5mg", 12, "21:00"),
    ]
}

/// Write the starter plan if no plan exists yet. Returns whether it was written.
pub fn seed_default_plan(store: &dyn KeyValueStore) -> Result<bool, DatabaseError> {
    if !load_therapy_plan(store)?.is_empty() {
        return Ok(false);
    }
    save_therapy_plan(store, &default_plan())?;
    Ok(true)
}
