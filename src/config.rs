use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "Dyna";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "DYNA_DATA_DIR";

/// Database file name inside the data directory.
pub const DATABASE_FILE: &str = "dyna.db";

/// How often the background reminder checker wakes up.
pub const REMINDER_CHECK_INTERVAL_SECS: u64 = 60;

/// Upcoming-appointment window scanned by the reminder checker.
pub const APPOINTMENT_LOOKAHEAD_DAYS: i64 = 7;

/// Maximum number of entries kept in the notification log.
pub const NOTIFICATION_LOG_CAP: usize = 100;

/// Default tracing filter when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "dyna=info,dyna_lib=info,warn"
}

/// Get the application data directory.
/// `$DYNA_DATA_DIR` when set, otherwise ~/Dyna/ on all platforms.
pub fn app_data_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Get the SQLite database path.
pub fn database_path() -> PathBuf {
    app_data_dir().join(DATABASE_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_path_under_app_data() {
        let db = database_path();
        assert!(db.starts_with(app_data_dir()));
        assert!(db.ends_with(DATABASE_FILE));
    }

    #[test]
    fn app_name_is_dyna() {
        assert_eq!(APP_NAME, "Dyna");
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.3.0");
    }

    #[test]
    fn default_filter_mentions_crate() {
        assert!(default_log_filter().contains("dyna_lib"));
    }
}
