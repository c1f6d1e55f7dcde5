//! Tailer configuration (environment driven).

use std::path::{Path, PathBuf};

/// Configuration for the event tailer.
///
/// | Variable | Default |
/// |---|---|
/// | `BROKER_URL` | `redis://broker:6379` |
/// | `EVENT_TOPIC` | `task-events` |
/// | `LOG_FILE` | `/app/logs/events.log` |
#[derive(Debug, Clone)]
pub struct TailerConfig {
    pub broker_url: String,
    pub topic: String,
    pub log_file: PathBuf,
}

impl TailerConfig {
    pub fn from_env() -> Self {
        Self {
            broker_url: env_or("BROKER_URL", "redis://broker:6379"),
            topic: env_or("EVENT_TOPIC", "task-events"),
            log_file: PathBuf::from(env_or("LOG_FILE", "/app/logs/events.log")),
        }
    }
}

/// Create the log file's directory when it does not exist yet.
pub fn ensure_log_dir(log_file: &Path) -> std::io::Result<()> {
    match log_file.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => std::fs::create_dir_all(dir),
        _ => Ok(()),
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_log_dir_creates_missing_parents() {
        let dir = tempfile::tempdir().unwrap();
        let log_file = dir.path().join("nested/logs/events.log");

        ensure_log_dir(&log_file).unwrap();
        assert!(log_file.parent().unwrap().is_dir());

        // Idempotent.
        ensure_log_dir(&log_file).unwrap();
    }

    #[test]
    fn bare_file_names_need_no_directory() {
        ensure_log_dir(Path::new("events.log")).unwrap();
    }
}
