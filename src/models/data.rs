use serde::{Deserialize, Serialize};

use super::appointment::Appointment;
use super::daily_log::DailyLog;
use super::profile::{MedicationLight, Profile};
use super::voiding::{FluidIntake, VoidingEntry};
use crate::store::{or_default, Lenient};

/// Root document stored under `dyna_data_v1`.
///
/// Each field reads on its own: a `null` or unreadable field falls back
/// to empty without touching the others, and unreadable array items are
/// written back as stored. Voiding records are kept as raw JSON so legacy
/// shapes survive a load/save cycle; typed access filters them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DynaData {
    #[serde(deserialize_with = "or_default")]
    pub profile: Profile,
    pub daily_logs: Lenient<DailyLog>,
    pub medications: Lenient<MedicationLight>,
    pub fluid_intakes: Lenient<serde_json::Value>,
    pub voiding_entries: Lenient<serde_json::Value>,
    pub appointments: Lenient<Appointment>,
}

impl DynaData {
    pub fn fluid_intakes(&self) -> Vec<FluidIntake> {
        self.fluid_intakes
            .iter()
            .filter_map(|v| serde_json::from_value(v.clone()).ok())
            .collect()
    }

    /// Voiding entries in the current shape. Legacy records lacking the
    /// boolean `urgency`/`burning` flags are skipped.
    pub fn voiding_entries(&self) -> Vec<VoidingEntry> {
        self.voiding_entries
            .iter()
            .filter_map(|v| serde_json::from_value(v.clone()).ok())
            .collect()
    }
}
