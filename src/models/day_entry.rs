use serde::{Deserialize, Serialize};

use super::appointment::DayAppointment;
use super::enums::FlowIntensity;

/// A therapy scheduled on a day and whether it was taken.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TherapyTaken {
    pub id: u32,
    pub name: String,
    pub dose: String,
    pub time: String,
    pub taken: bool,
}

/// Everything recorded for one calendar date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayEntry {
    /// 1 = low .. 4 = intense; None = not set.
    pub pain_level: Option<u8>,
    pub period_flow: Option<FlowIntensity>,
    pub appointments: Vec<DayAppointment>,
    pub therapies: Vec<TherapyTaken>,
    pub notes: String,
}

/// On-disk shape of a day entry. Lenient: every field may be missing
/// and the older `hasPeriod` flag is still understood.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoredDayEntry {
    pub pain_level: Option<i64>,
    pub period_flow: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_period: Option<bool>,
    pub appointments: Option<Vec<DayAppointment>>,
    pub therapies: Option<Vec<TherapyTaken>>,
    pub notes: Option<String>,
}

impl From<&DayEntry> for StoredDayEntry {
    fn from(entry: &DayEntry) -> Self {
        Self {
            pain_level: entry.pain_level.map(i64::from),
            period_flow: entry
                .period_flow
                .map(|f| serde_json::Value::String(f.as_str().to_string())),
            has_period: None,
            appointments: Some(entry.appointments.clone()),
            therapies: Some(entry.therapies.clone()),
            notes: Some(entry.notes.clone()),
        }
    }
}
