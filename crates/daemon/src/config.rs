// Daemon configuration (environment variables)

use cadence_core::application::worker::constants::{
    DEFAULT_ADVANCE_INTERVAL_HOURS, DEFAULT_POLL_BATCH,
};
use std::path::PathBuf;

pub const DEFAULT_DB_PATH: &str = "~/.cadence/crm.db";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub db_path: String,
    pub log_format: LogFormat,
    pub log_dir: Option<PathBuf>,
    pub poll_batch: i64,
    pub advance_interval_hours: u64,
}

impl DaemonConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unparsable numbers fall back to defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let db_path = shellexpand::tilde(
            &lookup("CADENCE_DB_PATH").unwrap_or_else(|| DEFAULT_DB_PATH.to_string()),
        )
        .into_owned();

        let log_format = match lookup("CADENCE_LOG_FORMAT").as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        let log_dir = lookup("CADENCE_LOG_DIR")
            .filter(|dir| !dir.trim().is_empty())
            .map(|dir| PathBuf::from(shellexpand::tilde(&dir).into_owned()));

        let poll_batch = lookup("CADENCE_POLL_BATCH")
            .and_then(|s| s.parse().ok())
            .filter(|n: &i64| *n > 0)
            .unwrap_or(DEFAULT_POLL_BATCH);

        let advance_interval_hours = lookup("CADENCE_ADVANCE_INTERVAL_HOURS")
            .and_then(|s| s.parse().ok())
            .filter(|n: &u64| *n > 0)
            .unwrap_or(DEFAULT_ADVANCE_INTERVAL_HOURS);

        Self {
            db_path,
            log_format,
            log_dir,
            poll_batch,
            advance_interval_hours,
        }
    }

    /// sqlx connection URL for the configured path
    pub fn database_url(&self) -> String {
        if self.db_path.starts_with("sqlite:") {
            self.db_path.clone()
        } else {
            format!("sqlite://{}", self.db_path)
        }
    }
}
