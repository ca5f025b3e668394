//! Backup, restore and reset commands.

use std::path::Path;

use super::open;
use crate::backup;
use crate::core_state::CoreState;

/// Write every application key to `path`. Returns the key count.
pub fn export_backup(path: &Path, state: &CoreState) -> Result<usize, String> {
    let store = open(state)?;
    backup::export_to_file(&store, path).map_err(|e| e.to_string())
}

/// Replace all data with the backup at `path`. Returns the key count.
pub fn import_backup(path: &Path, state: &CoreState) -> Result<usize, String> {
    if !path.is_file() {
        return Err(format!("Backup file not found: {}", path.display()));
    }
    let store = open(state)?;
    backup::import_from_file(&store, path).map_err(|e| e.to_string())
}

/// Delete all application data. Refuses without confirmation.
pub fn reset_app(confirmed: bool, state: &CoreState) -> Result<(), String> {
    if !confirmed {
        return Err("Reset deletes all data; confirm to proceed".into());
    }
    let store = open(state)?;
    backup::reset_app(&store).map_err(|e| e.to_string())?;
    tracing::warn!("All application data deleted");
    Ok(())
}
