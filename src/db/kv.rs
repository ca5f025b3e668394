//! Key-value rows backing the JSON document store.

use rusqlite::{params, Connection};

use super::DatabaseError;

/// Get a value by key. Returns None if not set.
pub fn get_value(conn: &Connection, key: &str) -> Result<Option<String>, DatabaseError> {
    let mut stmt = conn.prepare("SELECT value FROM kv_store WHERE key = ?1")?;
    match stmt.query_row([key], |row| row.get::<_, String>(0)) {
        Ok(val) => Ok(Some(val)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(DatabaseError::from(e)),
    }
}

/// Set a value (upsert).
pub fn set_value(conn: &Connection, key: &str, value: &str) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO kv_store (key, value, updated_at)
         VALUES (?1, ?2, datetime('now'))
         ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
        params![key, value],
    )?;
    Ok(())
}

/// Delete a value. Deleting a missing key is not an error.
pub fn delete_value(conn: &Connection, key: &str) -> Result<(), DatabaseError> {
    conn.execute("DELETE FROM kv_store WHERE key = ?1", [key])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;

    #[test]
    fn get_missing_returns_none() {
        let conn = open_memory_database().unwrap();
        assert!(get_value(&conn, "nope").unwrap().is_none());
    }

    #[test]
    fn set_then_overwrite() {
        let conn = open_memory_database().unwrap();
        set_value(&conn, "k", "1").unwrap();
        set_value(&conn, "k", "2").unwrap();
        assert_eq!(get_value(&conn, "k").unwrap().as_deref(), Some("2"));
    }

    #[test]
    fn delete_missing_is_ok() {
        let conn = open_memory_database().unwrap();
        delete_value(&conn, "ghost").unwrap();
        set_value(&conn, "a", "x").unwrap();
        delete_value(&conn, "a").unwrap();
        assert!(get_value(&conn, "a").unwrap().is_none());
    }
}
