//! Edge service configuration (environment driven).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// The signing secret must never ship in source; the process refuses to
    /// start without it.
    #[error("TOKEN_SECRET must be set")]
    MissingTokenSecret,
}

/// Configuration for the edge service.
///
/// | Variable | Default |
/// |---|---|
/// | `EDGE_ADDR` | `0.0.0.0:8081` |
/// | `STORE_URL` | `http://db-service:8080` |
/// | `BROKER_URL` | `redis://broker:6379` |
/// | `EVENT_TOPIC` | `task-events` |
/// | `TOKEN_SECRET` | required, no default |
#[derive(Debug, Clone)]
pub struct EdgeConfig {
    pub addr: String,
    pub store_url: String,
    pub broker_url: String,
    pub event_topic: String,
    pub token_secret: String,
}

impl EdgeConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let token_secret = std::env::var("TOKEN_SECRET")
            .ok()
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::MissingTokenSecret)?;

        Ok(Self {
            addr: env_or("EDGE_ADDR", "0.0.0.0:8081"),
            store_url: env_or("STORE_URL", "http://db-service:8080"),
            broker_url: env_or("BROKER_URL", "redis://broker:6379"),
            event_topic: env_or("EVENT_TOPIC", "task-events"),
            token_secret,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}
