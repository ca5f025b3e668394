//! Key-value document store.
//!
//! Every collection the app keeps (profile, therapy plan, diaries,
//! reminder state...) is one JSON document under a fixed key. Readers
//! never fail on bad data: a missing key or malformed JSON yields the
//! collection's empty default. Writers never destroy what a reader
//! skipped: unreadable items are written back as stored, and a document
//! that could not be read at all is copied to `<key>.unreadable` before
//! its first overwrite.

use std::collections::{BTreeMap, HashMap};
use std::ops::{Deref, DerefMut};
use std::sync::Mutex;

use rusqlite::Connection;
use serde::de::DeserializeOwned;
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::db::{self, DatabaseError};

/// Fixed storage keys.
pub mod keys {
    pub const DATA: &str = "dyna_data_v1";
    pub const DAY_ENTRIES: &str = "dyna-day-entries";
    pub const DIARIES: &str = "dyna_diaries_v1";
    pub const REMINDERS: &str = "dyna_reminders_v1";
    pub const NOTIFICATIONS_SHOWN: &str = "dyna_notifications_shown_v1";
    pub const NOTIFICATION_PREFS: &str = "dyna_notification_prefs_v1";
    pub const NOTIFICATION_LOG: &str = "dyna_notification_log_v1";
    pub const THERAPY_SNAPSHOT: &str = "dyna_therapy_snapshot_v1";
    pub const THERAPY_VARIATION_SHOWN: &str = "dyna_therapy_variation_shown_v1";
    pub const THERAPY_PLAN: &str = "dyna-therapy-plan";
    pub const THERAPY_HISTORY: &str = "dyna-therapy-history";

    /// Every key the app writes (used by reset and backup).
    pub const ALL: &[&str] = &[
        DATA,
        DAY_ENTRIES,
        DIARIES,
        REMINDERS,
        NOTIFICATIONS_SHOWN,
        NOTIFICATION_PREFS,
        NOTIFICATION_LOG,
        THERAPY_SNAPSHOT,
        THERAPY_VARIATION_SHOWN,
        THERAPY_PLAN,
        THERAPY_HISTORY,
    ];
}

/// Where a stored document that could not be read is kept.
pub fn unreadable_key(key: &str) -> String {
    format!("{key}.unreadable")
}

/// One write of an atomic batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KvWrite<'a> {
    Set(&'a str, &'a str),
    Remove(&'a str),
}

/// Synchronous string key-value store.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, DatabaseError>;
    fn set(&self, key: &str, value: &str) -> Result<(), DatabaseError>;
    fn remove(&self, key: &str) -> Result<(), DatabaseError>;
    /// Apply every write, or none of them.
    fn apply_batch(&self, writes: &[KvWrite<'_>]) -> Result<(), DatabaseError>;
}

/// Store backed by the `kv_store` table.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn open(path: &std::path::Path) -> Result<Self, DatabaseError> {
        Ok(Self::new(db::open_database(path)?))
    }

    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        Ok(Self::new(db::open_memory_database()?))
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        db::kv::get_value(&self.conn, key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        db::kv::set_value(&self.conn, key, value)
    }

    fn remove(&self, key: &str) -> Result<(), DatabaseError> {
        db::kv::delete_value(&self.conn, key)
    }

    fn apply_batch(&self, writes: &[KvWrite<'_>]) -> Result<(), DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;
        for write in writes {
            match *write {
                KvWrite::Set(key, value) => db::kv::set_value(&tx, key, value)?,
                KvWrite::Remove(key) => db::kv::delete_value(&tx, key)?,
            }
        }
        tx.commit()?;
        Ok(())
    }
}

/// Process-local store, used by tests.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let entries = self.entries.lock().map_err(|_| DatabaseError::LockPoisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        let mut entries = self.entries.lock().map_err(|_| DatabaseError::LockPoisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), DatabaseError> {
        let mut entries = self.entries.lock().map_err(|_| DatabaseError::LockPoisoned)?;
        entries.remove(key);
        Ok(())
    }

    fn apply_batch(&self, writes: &[KvWrite<'_>]) -> Result<(), DatabaseError> {
        let mut entries = self.entries.lock().map_err(|_| DatabaseError::LockPoisoned)?;
        for write in writes {
            match *write {
                KvWrite::Set(key, value) => {
                    entries.insert(key.to_string(), value.to_string());
                }
                KvWrite::Remove(key) => {
                    entries.remove(key);
                }
            }
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════
// Lenient reading
// ═══════════════════════════════════════════

/// A stored array read item by item.
///
/// Items that do not deserialize as `T` are kept as raw JSON and
/// serialized after the readable ones. `null` or a non-array value
/// reads as empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Lenient<T> {
    items: Vec<T>,
    unreadable: Vec<Value>,
}

impl<T: DeserializeOwned> Lenient<T> {
    pub fn from_values(values: Vec<Value>) -> Self {
        let mut out = Self::default();
        for value in values {
            match serde_json::from_value::<T>(value.clone()) {
                Ok(item) => out.items.push(item),
                Err(e) => {
                    tracing::warn!(error = %e, "Keeping unreadable stored item as is");
                    out.unreadable.push(value);
                }
            }
        }
        out
    }
}

impl<T> Lenient<T> {
    /// Raw items that did not read as `T`.
    pub fn unreadable(&self) -> &[Value] {
        &self.unreadable
    }
}

impl<T> Default for Lenient<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            unreadable: Vec::new(),
        }
    }
}

impl<T> From<Vec<T>> for Lenient<T> {
    fn from(items: Vec<T>) -> Self {
        Self {
            items,
            unreadable: Vec::new(),
        }
    }
}

impl<T> Deref for Lenient<T> {
    type Target = Vec<T>;

    fn deref(&self) -> &Vec<T> {
        &self.items
    }
}

impl<T> DerefMut for Lenient<T> {
    fn deref_mut(&mut self) -> &mut Vec<T> {
        &mut self.items
    }
}

impl<T> IntoIterator for Lenient<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Lenient<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T: Serialize> Serialize for Lenient<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.items.len() + self.unreadable.len()))?;
        for item in &self.items {
            seq.serialize_element(item)?;
        }
        for raw in &self.unreadable {
            seq.serialize_element(raw)?;
        }
        seq.end()
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Lenient<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let values = match Value::deserialize(deserializer)? {
            Value::Array(values) => values,
            Value::Null => Vec::new(),
            _ => {
                tracing::warn!("Expected a stored array, reading as empty");
                Vec::new()
            }
        };
        Ok(Self::from_values(values))
    }
}

/// `deserialize_with` helper: a field that does not read as `T` becomes
/// `T::default()` instead of failing the whole document.
pub fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Unreadable stored field, using default");
        T::default()
    }))
}

/// Load a JSON document, falling back to `T::default()` when the key is
/// missing or the stored text does not parse.
pub fn load_json<T>(store: &dyn KeyValueStore, key: &str) -> Result<T, DatabaseError>
where
    T: DeserializeOwned + Default,
{
    let Some(raw) = store.get(key)? else {
        return Ok(T::default());
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Ok(value),
        Err(e) => {
            tracing::warn!(key, error = %e, "Malformed stored JSON, using empty default");
            Ok(T::default())
        }
    }
}

fn to_json_value<T: Serialize + ?Sized>(key: &str, value: &T) -> Result<Value, DatabaseError> {
    serde_json::to_value(value).map_err(|e| DatabaseError::Serialization {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

/// Copy the stored text to `<key>.unreadable` when it is not JSON or its
/// top-level shape differs from the document about to replace it.
fn set_aside_unreadable(
    store: &dyn KeyValueStore,
    key: &str,
    fresh: &Value,
) -> Result<(), DatabaseError> {
    let Some(raw) = store.get(key)? else {
        return Ok(());
    };
    let readable = match serde_json::from_str::<Value>(&raw) {
        Ok(Value::Null) => true,
        Ok(stored) => std::mem::discriminant(&stored) == std::mem::discriminant(fresh),
        Err(_) => false,
    };
    if !readable {
        tracing::warn!(key, "Stored document unreadable, keeping a copy before overwrite");
        store.set(&unreadable_key(key), &raw)?;
    }
    Ok(())
}

/// Serialize and write a JSON document.
pub fn save_json<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), DatabaseError> {
    let fresh = to_json_value(key, value)?;
    set_aside_unreadable(store, key, &fresh)?;
    store.set(key, &fresh.to_string())
}

/// Load an array document; unreadable items are skipped.
pub fn load_items<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Vec<T>, DatabaseError> {
    let stored: Lenient<T> = load_json(store, key)?;
    Ok(stored.into_iter().collect())
}

/// Write an array document. Stored items that do not read as `T` are
/// appended unchanged.
pub fn save_items<T: Serialize + DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
    items: &[T],
) -> Result<(), DatabaseError> {
    let stored: Lenient<T> = load_json(store, key)?;
    let mut values = items
        .iter()
        .map(|item| to_json_value(key, item))
        .collect::<Result<Vec<_>, _>>()?;
    values.extend(stored.unreadable);
    save_json(store, key, &values)
}

/// Load an object document keyed by string; unreadable values are skipped.
pub fn load_entries<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<BTreeMap<String, T>, DatabaseError> {
    let stored: BTreeMap<String, Value> = load_json(store, key)?;
    let entries = stored
        .into_iter()
        .filter_map(|(entry_key, value)| match serde_json::from_value(value) {
            Ok(entry) => Some((entry_key, entry)),
            Err(e) => {
                tracing::warn!(key, entry = %entry_key, error = %e, "Skipping unreadable entry");
                None
            }
        })
        .collect();
    Ok(entries)
}

/// Write an object document. Stored values that do not read as `T` are
/// kept under their key unless `entries` replaces it.
pub fn save_entries<T: Serialize + DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
    entries: &BTreeMap<String, T>,
) -> Result<(), DatabaseError> {
    let stored: BTreeMap<String, Value> = load_json(store, key)?;
    let mut doc: Map<String, Value> = stored
        .into_iter()
        .filter(|(entry_key, value)| {
            !entries.contains_key(entry_key)
                && serde_json::from_value::<T>(value.clone()).is_err()
        })
        .collect();
    for (entry_key, entry) in entries {
        doc.insert(entry_key.clone(), to_json_value(key, entry)?);
    }
    save_json(store, key, &doc)
}

/// Clear every application key, then write `documents`, as one batch.
pub fn replace_app_storage(
    store: &dyn KeyValueStore,
    documents: &[(String, String)],
) -> Result<(), DatabaseError> {
    let aside: Vec<String> = keys::ALL.iter().map(|k| unreadable_key(k)).collect();
    let mut writes: Vec<KvWrite<'_>> = keys::ALL
        .iter()
        .map(|k| KvWrite::Remove(*k))
        .chain(aside.iter().map(|k| KvWrite::Remove(k.as_str())))
        .collect();
    writes.extend(documents.iter().map(|(k, v)| KvWrite::Set(k.as_str(), v.as_str())));
    store.apply_batch(&writes)
}

/// Remove every application key.
pub fn clear_all_app_storage(store: &dyn KeyValueStore) -> Result<(), DatabaseError> {
    replace_app_storage(store, &[])?;
    tracing::info!("All app storage cleared");
    Ok(())
}
