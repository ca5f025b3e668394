use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::enums::AppointmentType;

/// An appointment stored inside a day entry.
///
/// Old entries only carried `{ id, title, time }`; they load as
/// `altro` with the title as label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayAppointment {
    pub id: String,
    #[serde(rename = "type", default)]
    pub appointment_type: AppointmentType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_other: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default = "default_time")]
    pub time: String,
    #[serde(default)]
    pub place: Option<String>,
}

/// Fields the user edits on an appointment; id and date are assigned
/// by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentDraft {
    #[serde(rename = "type", default)]
    pub appointment_type: AppointmentType,
    #[serde(default)]
    pub type_other: Option<String>,
    #[serde(default = "default_time")]
    pub time: String,
    #[serde(default)]
    pub place: Option<String>,
}

/// Doctor appointment in the app data root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: String,
    pub date: NaiveDate,
    pub time: String,
    pub doctor_name: String,
    pub specialty: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub notes: String,
}

pub(crate) fn default_time() -> String {
    "09:00".to_string()
}
