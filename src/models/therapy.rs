use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::enums::{
    AlternateFrequency, DurationType, PosologyPeriod, TherapyAction, TherapyForm, TimeOfDay,
};

/// Structured posology: `dose_value` times per `dose_period`, for
/// `freq_value` × `freq_period` (e.g. once a day for 4 months).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Posology {
    pub dose_value: u32,
    pub dose_period: PosologyPeriod,
    pub freq_value: u32,
    pub freq_period: PosologyPeriod,
}

/// Dose ramp: from `initial_qty`, change by `increase_by` every
/// `every_value` × `every_period` until `final_qty`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TherapyVariation {
    pub initial_qty: f64,
    pub increase_by: f64,
    pub every_value: u32,
    pub every_period: PosologyPeriod,
    pub final_qty: f64,
}

/// Older drops-only ramp, superseded by `TherapyVariation`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GocceRamp {
    pub start_drops: u32,
    pub increase_every_days: u32,
    pub increase_by: u32,
    pub max_drops: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TherapyDuration {
    #[serde(rename = "type", default)]
    pub duration_type: DurationType,
    #[serde(default)]
    pub value: u32,
}

/// One configured medication or treatment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TherapyPlanItem {
    pub id: u32,
    pub name: String,
    pub form: TherapyForm,
    #[serde(default)]
    pub form_other: Option<String>,
    #[serde(default)]
    pub quantity: String,
    #[serde(default)]
    pub posology: Option<Posology>,
    /// YYYY-MM-DD; kept as text so a bad value does not drop the item.
    pub start_date: String,
    #[serde(default)]
    pub duration: TherapyDuration,
    #[serde(default)]
    pub quantity_change_date: Option<String>,
    #[serde(default)]
    pub quantity_after_change: Option<String>,
    #[serde(default)]
    pub gocce_ramp: Option<GocceRamp>,
    #[serde(default)]
    pub therapy_variation: Option<TherapyVariation>,
    #[serde(default)]
    pub alternate_with_id: Option<u32>,
    #[serde(default)]
    pub alternate_frequency: Option<AlternateFrequency>,
    #[serde(default)]
    pub alternate_months_value: Option<u32>,
    /// "HH:MM"
    #[serde(default = "super::appointment::default_time")]
    pub time: String,
    #[serde(default)]
    pub cream_time_of_day: Option<TimeOfDay>,
    #[serde(default)]
    pub paused: bool,
    #[serde(default)]
    pub notes: String,
}

impl TherapyPlanItem {
    pub fn start(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.start_date.trim(), "%Y-%m-%d").ok()
    }
}

/// Input for a new plan item (id assigned on insert).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTherapy {
    pub name: String,
    pub form: TherapyForm,
    #[serde(default)]
    pub form_other: Option<String>,
    #[serde(default)]
    pub quantity: String,
    #[serde(default)]
    pub posology: Option<Posology>,
    pub start_date: String,
    #[serde(default)]
    pub duration: TherapyDuration,
    #[serde(default)]
    pub therapy_variation: Option<TherapyVariation>,
    #[serde(default)]
    pub gocce_ramp: Option<GocceRamp>,
    #[serde(default)]
    pub alternate_with_id: Option<u32>,
    #[serde(default)]
    pub alternate_frequency: Option<AlternateFrequency>,
    #[serde(default)]
    pub alternate_months_value: Option<u32>,
    #[serde(default = "super::appointment::default_time")]
    pub time: String,
    #[serde(default)]
    pub cream_time_of_day: Option<TimeOfDay>,
    #[serde(default)]
    pub paused: bool,
    #[serde(default)]
    pub notes: String,
}

impl NewTherapy {
    pub fn into_item(self, id: u32) -> TherapyPlanItem {
        TherapyPlanItem {
            id,
            name: self.name,
            form: self.form,
            form_other: self.form_other,
            quantity: self.quantity,
            posology: self.posology,
            start_date: self.start_date,
            duration: self.duration,
            quantity_change_date: None,
            quantity_after_change: None,
            gocce_ramp: self.gocce_ramp,
            therapy_variation: self.therapy_variation,
            alternate_with_id: self.alternate_with_id,
            alternate_frequency: self.alternate_frequency,
            alternate_months_value: self.alternate_months_value,
            time: self.time,
            cream_time_of_day: self.cream_time_of_day,
            paused: self.paused,
            notes: self.notes,
        }
    }
}

/// Partial update of a plan item. Nullable fields use a nested
/// `Option` so a patch can clear them (`Some(None)`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TherapyPatch {
    pub name: Option<String>,
    pub form: Option<TherapyForm>,
    pub quantity: Option<String>,
    pub posology: Option<Option<Posology>>,
    pub start_date: Option<String>,
    pub duration: Option<TherapyDuration>,
    pub therapy_variation: Option<Option<TherapyVariation>>,
    pub alternate_with_id: Option<Option<u32>>,
    pub alternate_frequency: Option<Option<AlternateFrequency>>,
    pub alternate_months_value: Option<Option<u32>>,
    pub time: Option<String>,
    pub cream_time_of_day: Option<Option<TimeOfDay>>,
    pub paused: Option<bool>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TherapyHistoryEntry {
    pub id: String,
    pub date: DateTime<Utc>,
    pub action: TherapyAction,
    pub detail: String,
    #[serde(default)]
    pub therapy_id: Option<u32>,
}
