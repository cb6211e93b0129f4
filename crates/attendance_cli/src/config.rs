//! Runtime configuration for the `attendance` CLI.
//!
//! Values come from flags or their environment fallbacks (wired through
//! clap); anything left unset or blank resolves to a default here.

use anyhow::{bail, Result};
use attendance_core::default_log_level;
use std::path::PathBuf;

pub const DB_PATH_ENV: &str = "ATTENDANCE_DB_PATH";
pub const LOG_LEVEL_ENV: &str = "ATTENDANCE_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "ATTENDANCE_LOG_DIR";

const DEFAULT_DB_FILE_NAME: &str = "attendance.sqlite3";
const DEFAULT_LOG_DIR_NAME: &str = "attendance-logs";

/// Fully resolved settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub db_path: PathBuf,
    pub log_level: String,
    pub log_dir: PathBuf,
    /// Names of settings that fell back to defaults.
    pub defaulted: Vec<&'static str>,
}

impl Config {
    pub fn resolve(
        db_path: Option<String>,
        log_level: Option<String>,
        log_dir: Option<String>,
    ) -> Result<Self> {
        let mut defaulted = Vec::new();

        let db_path = non_blank(db_path).map(PathBuf::from).unwrap_or_else(|| {
            defaulted.push(DB_PATH_ENV);
            std::env::temp_dir().join(DEFAULT_DB_FILE_NAME)
        });
        let log_level = non_blank(log_level).unwrap_or_else(|| {
            defaulted.push(LOG_LEVEL_ENV);
            default_log_level().to_string()
        });
        let log_dir = non_blank(log_dir).map(PathBuf::from).unwrap_or_else(|| {
            defaulted.push(LOG_DIR_ENV);
            std::env::temp_dir().join(DEFAULT_LOG_DIR_NAME)
        });
        if !log_dir.is_absolute() {
            bail!(
                "--log-dir / {LOG_DIR_ENV} must be an absolute path, got `{}`",
                log_dir.display()
            );
        }

        Ok(Self {
            db_path,
            log_level,
            log_dir,
            defaulted,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|trimmed| !trimmed.is_empty())
}

#[cfg(test)]
mod tests {
    use super::{Config, DB_PATH_ENV, LOG_DIR_ENV, LOG_LEVEL_ENV};
    use std::path::PathBuf;

    #[test]
    fn unset_values_fall_back_to_temp_dir_defaults() {
        let config = Config::resolve(None, None, None).unwrap();
        assert_eq!(
            config.db_path,
            std::env::temp_dir().join("attendance.sqlite3")
        );
        assert_eq!(config.log_dir, std::env::temp_dir().join("attendance-logs"));
        assert_eq!(config.log_level, attendance_core::default_log_level());
        assert_eq!(config.defaulted, vec![DB_PATH_ENV, LOG_LEVEL_ENV, LOG_DIR_ENV]);
    }

    #[test]
    fn blank_values_count_as_unset() {
        let config = Config::resolve(Some("   ".to_string()), Some(String::new()), None).unwrap();
        assert_eq!(config.defaulted.len(), 3);
    }

    #[test]
    fn explicit_values_are_trimmed_and_kept() {
        let config = Config::resolve(
            Some(" /data/school.sqlite3 ".to_string()),
            Some("warn".to_string()),
            Some("/var/log/attendance".to_string()),
        )
        .unwrap();
        assert_eq!(config.db_path, PathBuf::from("/data/school.sqlite3"));
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.log_dir, PathBuf::from("/var/log/attendance"));
        assert!(config.defaulted.is_empty());
    }

    #[test]
    fn relative_log_dir_is_rejected_with_flag_name() {
        let err = Config::resolve(None, None, Some("logs".to_string())).unwrap_err();
        let message = err.to_string();
        assert!(message.contains(LOG_DIR_ENV));
        assert!(message.contains("absolute"));
    }
}
