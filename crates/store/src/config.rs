//! Store service configuration (environment driven).

use sqlx::postgres::PgConnectOptions;

/// Configuration for the persistence service.
///
/// | Variable | Default |
/// |---|---|
/// | `STORE_ADDR` | `0.0.0.0:8080` |
/// | `DB_HOST` | `postgres` |
/// | `DB_USER` | `postgres` |
/// | `DB_PASSWORD` | `mypostgres` |
/// | `DB_NAME` | `postgres` |
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub addr: String,
    pub db_host: String,
    pub db_user: String,
    pub db_password: String,
    pub db_name: String,
}

impl StoreConfig {
    pub fn from_env() -> Self {
        Self {
            addr: env_or("STORE_ADDR", "0.0.0.0:8080"),
            db_host: env_or("DB_HOST", "postgres"),
            db_user: env_or("DB_USER", "postgres"),
            db_password: env_or("DB_PASSWORD", "mypostgres"),
            db_name: env_or("DB_NAME", "postgres"),
        }
    }

    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.db_host)
            .port(5432)
            .username(&self.db_user)
            .password(&self.db_password)
            .database(&self.db_name)
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}
