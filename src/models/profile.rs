use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::enums::{MedicationType, SpecialistType, SwabTestResult};
use crate::store::{or_default, Lenient};

/// Scores 1-10 for the five vestibular zones of a swab test.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SwabScores {
    pub clitoride: Option<u8>,
    pub orefizio_uretrale: Option<u8>,
    pub labbro_destro: Option<u8>,
    pub labbro_sinistro: Option<u8>,
    pub forchetta: Option<u8>,
}

impl SwabScores {
    /// Per-zone merge: `patch` wins where set, otherwise `self` is kept.
    pub fn merged_with(&self, patch: &SwabScores) -> SwabScores {
        SwabScores {
            clitoride: patch.clitoride.or(self.clitoride),
            orefizio_uretrale: patch.orefizio_uretrale.or(self.orefizio_uretrale),
            labbro_destro: patch.labbro_destro.or(self.labbro_destro),
            labbro_sinistro: patch.labbro_sinistro.or(self.labbro_sinistro),
            forchetta: patch.forchetta.or(self.forchetta),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SwabTestInfo {
    pub result: SwabTestResult,
    pub note: Option<String>,
    /// Superseded by `Profile::swab_visits`; kept for old data.
    pub scores: Option<SwabScores>,
}

/// A visit with a swab test and its per-zone results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwabVisit {
    pub id: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub swab_scores: SwabScores,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Specialist {
    pub id: String,
    #[serde(rename = "type", default)]
    pub specialist_type: SpecialistType,
    #[serde(default)]
    pub type_other: Option<String>,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default = "default_true")]
    pub still_active: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeatureToggles {
    pub voiding_diary_enabled: bool,
}

/// A current therapy as entered during onboarding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationLight {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub medication_type: MedicationType,
    #[serde(default)]
    pub note: String,
    #[serde(default = "default_true")]
    pub active: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Profile {
    /// Legacy single-field name, used when first/last name are absent.
    #[serde(deserialize_with = "or_default")]
    pub name: Option<String>,
    #[serde(deserialize_with = "or_default")]
    pub first_name: Option<String>,
    #[serde(deserialize_with = "or_default")]
    pub last_name: Option<String>,
    #[serde(deserialize_with = "or_default")]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(deserialize_with = "or_default")]
    pub age: Option<u32>,
    #[serde(deserialize_with = "or_default")]
    pub diagnosis_date: Option<NaiveDate>,
    pub specialists: Lenient<Specialist>,
    #[serde(deserialize_with = "or_default")]
    pub swab_test: SwabTestInfo,
    pub swab_visits: Lenient<SwabVisit>,
    pub current_therapies: Lenient<MedicationLight>,
    #[serde(deserialize_with = "or_default")]
    pub features: FeatureToggles,
    #[serde(deserialize_with = "or_default")]
    pub support_removed: bool,
}

/// Partial profile update. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfilePatch {
    pub name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub age: Option<u32>,
    pub diagnosis_date: Option<NaiveDate>,
    pub specialists: Option<Vec<Specialist>>,
    pub swab_test: Option<SwabTestPatch>,
    pub swab_visits: Option<Vec<SwabVisit>>,
    pub current_therapies: Option<Vec<MedicationLight>>,
    pub features: Option<FeatureTogglesPatch>,
    pub support_removed: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SwabTestPatch {
    pub result: Option<SwabTestResult>,
    pub note: Option<String>,
    pub scores: Option<SwabScores>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeatureTogglesPatch {
    pub voiding_diary_enabled: Option<bool>,
}

fn default_true() -> bool {
    true
}
