use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::store::or_default;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicineReminder {
    /// "HH:MM"
    pub time: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentReminder {
    pub minutes_before: u32,
    pub enabled: bool,
}

/// Configured reminders, keyed by therapy id / appointment id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemindersState {
    #[serde(deserialize_with = "or_default")]
    pub medicine: BTreeMap<String, MedicineReminder>,
    #[serde(deserialize_with = "or_default")]
    pub appointment: BTreeMap<String, AppointmentReminder>,
}

/// Dedup markers: the day a medicine reminder last fired, the instant
/// (epoch millis) an appointment reminder fired.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShownState {
    #[serde(deserialize_with = "or_default")]
    pub medicine: BTreeMap<String, NaiveDate>,
    #[serde(deserialize_with = "or_default")]
    pub appointment: BTreeMap<String, i64>,
}

/// `"<therapyId>|<YYYY-MM-DD>"` markers for dose-change notices.
pub type VariationShown = BTreeSet<String>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationPrefs {
    pub medicine_enabled: bool,
    pub appointment_enabled: bool,
    pub appointment_minutes_before: u32,
}

impl Default for NotificationPrefs {
    fn default() -> Self {
        Self {
            medicine_enabled: true,
            appointment_enabled: true,
            appointment_minutes_before: 15,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationPrefsPatch {
    pub medicine_enabled: Option<bool>,
    pub appointment_enabled: Option<bool>,
    pub appointment_minutes_before: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationLogEntry {
    pub id: String,
    pub title: String,
    pub body: String,
    /// Epoch millis.
    pub at: i64,
    pub read: bool,
}
