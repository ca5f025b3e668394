use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::enums::DiaryType;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diary {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub diary_type: DiaryType,
    pub start_date: NaiveDate,
    /// Note body, only for personal diaries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DiaryPatch {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub diary_type: Option<DiaryType>,
    pub start_date: Option<NaiveDate>,
    pub content: Option<String>,
}

/// Input for a new diary (id assigned on insert).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDiary {
    pub name: String,
    #[serde(rename = "type")]
    pub diary_type: DiaryType,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub content: Option<String>,
}
