//! Whole-app backup: every application key in one JSON file.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::config::{APP_NAME, APP_VERSION};
use crate::db::DatabaseError;
use crate::store::{clear_all_app_storage, keys, replace_app_storage, KeyValueStore};

#[derive(Error, Debug)]
pub enum BackupError {
    #[error("Backup I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Backup is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Not a Dyna backup: {0}")]
    InvalidFormat(String),

    #[error("Unknown key in backup: {0}")]
    UnknownKey(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Backup {
    pub app: String,
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub data: Map<String, Value>,
}

/// Collect every stored key. Values that are not valid JSON are kept as
/// strings so nothing is lost.
pub fn build_backup(store: &dyn KeyValueStore) -> Result<Backup, BackupError> {
    let mut data = Map::new();
    for key in keys::ALL {
        if let Some(raw) = store.get(key)? {
            let value = serde_json::from_str(&raw).unwrap_or(Value::String(raw));
            data.insert((*key).to_string(), value);
        }
    }
    Ok(Backup {
        app: APP_NAME.to_string(),
        version: APP_VERSION.to_string(),
        exported_at: Utc::now(),
        data,
    })
}

pub fn export_to_file(store: &dyn KeyValueStore, path: &Path) -> Result<usize, BackupError> {
    let backup = build_backup(store)?;
    let json = serde_json::to_string_pretty(&backup)?;
    std::fs::write(path, json)?;
    tracing::info!(path = %path.display(), keys = backup.data.len(), "Backup exported");
    Ok(backup.data.len())
}

/// Check a parsed backup before anything is written.
pub fn validate_backup(backup: &Backup) -> Result<(), BackupError> {
    if backup.app != APP_NAME {
        return Err(BackupError::InvalidFormat(format!("app is {:?}", backup.app)));
    }
    if let Some(key) = backup.data.keys().find(|k| !keys::ALL.contains(&k.as_str())) {
        return Err(BackupError::UnknownKey(key.clone()));
    }
    Ok(())
}

/// Replace all application data with the backup's. The clear and every
/// write land together or not at all.
pub fn restore_backup(store: &dyn KeyValueStore, backup: &Backup) -> Result<usize, BackupError> {
    validate_backup(backup)?;
    let documents: Vec<(String, String)> = backup
        .data
        .iter()
        .map(|(key, value)| {
            let raw = match value {
                Value::String(s) if serde_json::from_str::<Value>(s).is_err() => s.clone(),
                other => other.to_string(),
            };
            (key.clone(), raw)
        })
        .collect();
    replace_app_storage(store, &documents)?;
    Ok(backup.data.len())
}

pub fn import_from_file(store: &dyn KeyValueStore, path: &Path) -> Result<usize, BackupError> {
    let text = std::fs::read_to_string(path)?;
    let backup: Backup = serde_json::from_str(&text)
        .map_err(|e| BackupError::InvalidFormat(e.to_string()))?;
    let count = restore_backup(store, &backup)?;
    tracing::info!(path = %path.display(), keys = count, "Backup imported");
    Ok(count)
}

/// Delete every application key.
pub fn reset_app(store: &dyn KeyValueStore) -> Result<(), BackupError> {
    clear_all_app_storage(store)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, SqliteStore};
    use crate::therapy::{default_plan, load_therapy_plan, save_therapy_plan};

    #[test]
    fn export_import_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dyna-backup.json");

        let source = SqliteStore::open_in_memory().unwrap();
        save_therapy_plan(&source, &default_plan()).unwrap();
        source.set(keys::DAY_ENTRIES, r#"{"2024-01-01":{"painLevel":2}}"#).unwrap();
        assert_eq!(export_to_file(&source, &path).unwrap(), 2);

        let target = MemoryStore::new();
        target.set(keys::DIARIES, r#"[{"stale":true}]"#).unwrap();
        assert_eq!(import_from_file(&target, &path).unwrap(), 2);

        assert_eq!(load_therapy_plan(&target).unwrap().len(), 4);
        assert!(target.get(keys::DIARIES).unwrap().is_none());
    }

    #[test]
    fn malformed_stored_value_survives() {
        let store = MemoryStore::new();
        store.set(keys::NOTIFICATION_LOG, "{broken").unwrap();
        let backup = build_backup(&store).unwrap();

        let target = MemoryStore::new();
        restore_backup(&target, &backup).unwrap();
        assert_eq!(target.get(keys::NOTIFICATION_LOG).unwrap().as_deref(), Some("{broken"));
    }

    #[test]
    fn failed_restore_leaves_existing_data() {
        let conn = crate::db::open_memory_database().unwrap();
        conn.execute_batch(
            "CREATE TRIGGER disk_full BEFORE INSERT ON kv_store WHEN NEW.key = 'dyna_diaries_v1'
             BEGIN SELECT RAISE(ABORT, 'disk full'); END;",
        )
        .unwrap();
        let store = SqliteStore::new(conn);
        store.set(keys::DAY_ENTRIES, r#"{"2024-01-01":{"painLevel":3}}"#).unwrap();

        let mut backup = build_backup(&MemoryStore::new()).unwrap();
        backup.data.insert(keys::THERAPY_PLAN.into(), serde_json::json!([]));
        backup.data.insert(keys::DIARIES.into(), serde_json::json!([]));

        assert!(restore_backup(&store, &backup).is_err());
        assert_eq!(
            store.get(keys::DAY_ENTRIES).unwrap().as_deref(),
            Some(r#"{"2024-01-01":{"painLevel":3}}"#)
        );
        assert!(store.get(keys::THERAPY_PLAN).unwrap().is_none());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let store = MemoryStore::new();
        let mut backup = build_backup(&store).unwrap();
        backup.data.insert("someone_else".into(), Value::Null);
        let err = restore_backup(&store, &backup).unwrap_err();
        assert!(matches!(err, BackupError::UnknownKey(k) if k == "someone_else"));
    }

    #[test]
    fn foreign_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("other.json");
        std::fs::write(&path, r#"{"hello":"world"}"#).unwrap();
        let store = MemoryStore::new();
        store.set(keys::THERAPY_PLAN, "[]").unwrap();

        let err = import_from_file(&store, &path).unwrap_err();
        assert!(matches!(err, BackupError::InvalidFormat(_)));
        assert!(store.get(keys::THERAPY_PLAN).unwrap().is_some());
    }

    #[test]
    fn reset_clears_everything() {
        let store = MemoryStore::new();
        save_therapy_plan(&store, &default_plan()).unwrap();
        reset_app(&store).unwrap();
        assert!(load_therapy_plan(&store).unwrap().is_empty());
    }
}
