use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::enums::FluidIntakeType;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FluidIntake {
    pub id: String,
    pub diary_id: String,
    pub date: NaiveDate,
    /// RFC 3339 instant, as recorded.
    pub timestamp: String,
    #[serde(rename = "type", default)]
    pub intake_type: FluidIntakeType,
    #[serde(rename = "volume_ml")]
    pub volume_ml: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoidingEntry {
    pub id: String,
    pub diary_id: String,
    pub date: NaiveDate,
    pub timestamp: String,
    #[serde(rename = "volume_ml", default)]
    pub volume_ml: Option<u32>,
    pub urgency: bool,
    pub burning: bool,
}
