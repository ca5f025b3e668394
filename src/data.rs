//! App data root (`dyna_data_v1`): profile, daily logs, voiding records.

use crate::db::DatabaseError;
use crate::models::DynaData;
use crate::store::{keys, load_json, save_json, KeyValueStore};

/// Load the data root. A missing or malformed document yields the empty
/// root; a bad field only empties that field.
pub fn load_data(store: &dyn KeyValueStore) -> Result<DynaData, DatabaseError> {
    load_json(store, keys::DATA)
}

pub fn save_data(store: &dyn KeyValueStore, data: &DynaData) -> Result<(), DatabaseError> {
    save_json(store, keys::DATA, data)
}

/// Load, mutate, save. Returns the saved root.
pub fn update_data<F>(store: &dyn KeyValueStore, mutate: F) -> Result<DynaData, DatabaseError>
where
    F: FnOnce(&mut DynaData),
{
    let mut data = load_data(store)?;
    mutate(&mut data);
    save_data(store, &data)?;
    Ok(data)
}

/// Fresh id for stored records.
pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SwabTestResult;
    use crate::store::MemoryStore;

    #[test]
    fn empty_store_yields_empty_root() {
        let store = MemoryStore::new();
        let data = load_data(&store).unwrap();
        assert!(data.daily_logs.is_empty());
        assert!(data.fluid_intakes.is_empty());
        assert_eq!(data.profile.swab_test.result, SwabTestResult::NotDone);
        assert!(!data.profile.features.voiding_diary_enabled);
    }

    #[test]
    fn missing_arrays_are_filled() {
        let store = MemoryStore::new();
        store
            .set(keys::DATA, r#"{"profile":{"firstName":"Giulia"},"dailyLogs":[]}"#)
            .unwrap();
        let data = load_data(&store).unwrap();
        assert_eq!(data.profile.first_name.as_deref(), Some("Giulia"));
        assert!(data.voiding_entries.is_empty());
        assert!(data.appointments.is_empty());
    }

    #[test]
    fn update_data_persists() {
        let store = MemoryStore::new();
        update_data(&store, |d| d.profile.age = Some(31)).unwrap();
        assert_eq!(load_data(&store).unwrap().profile.age, Some(31));
    }

    const LOG: &str = r#"{"id":"l1","date":"2024-03-01","painLevel":2,"menstruation":false,"therapyAdherenceSimple":true,"notes":"","createdAt":"2024-03-01T08:00:00Z","updatedAt":"2024-03-01T08:00:00Z"}"#;

    #[test]
    fn null_array_does_not_empty_the_root() {
        let store = MemoryStore::new();
        let raw = format!(
            r#"{{"profile":{{"firstName":"Giulia"}},"dailyLogs":[{LOG}],"fluidIntakes":null}}"#
        );
        store.set(keys::DATA, &raw).unwrap();

        let data = load_data(&store).unwrap();
        assert_eq!(data.profile.first_name.as_deref(), Some("Giulia"));
        assert_eq!(data.daily_logs.len(), 1);
        assert!(data.fluid_intakes.is_empty());

        update_data(&store, |d| d.profile.age = Some(30)).unwrap();
        let saved = load_data(&store).unwrap();
        assert_eq!(saved.profile.first_name.as_deref(), Some("Giulia"));
        assert_eq!(saved.profile.age, Some(30));
        assert_eq!(saved.daily_logs.len(), 1);
    }

    #[test]
    fn unreadable_log_survives_a_save() {
        let store = MemoryStore::new();
        let raw = format!(r#"{{"dailyLogs":[{LOG},{{"id":"l2","date":"2024-03-02"}}]}}"#);
        store.set(keys::DATA, &raw).unwrap();

        update_data(&store, |d| d.profile.age = Some(30)).unwrap();
        let saved = load_data(&store).unwrap();
        assert_eq!(saved.daily_logs.len(), 1);
        assert_eq!(saved.daily_logs.unreadable()[0]["id"], "l2");
    }

    #[test]
    fn bad_profile_field_keeps_the_rest() {
        let store = MemoryStore::new();
        store
            .set(keys::DATA, r#"{"profile":{"firstName":"Giulia","age":"trenta"}}"#)
            .unwrap();
        let data = load_data(&store).unwrap();
        assert_eq!(data.profile.first_name.as_deref(), Some("Giulia"));
        assert_eq!(data.profile.age, None);
    }
}
