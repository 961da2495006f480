//! Configuration loaded from the process environment.

use std::env;
use std::time::Duration;

use anyhow::{Context, Result};

/// Runtime configuration for the ledger service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// sqlx SQLite URL; the file is created if missing.
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub max_connections: u32,
    /// Bounded wait for store locks (SQLite busy timeout and unit-of-work deadline).
    pub lock_timeout: Duration,
}

impl AppConfig {
    pub const DEFAULT_DATABASE_URL: &'static str = "sqlite://stockledger.db";

    /// Load configuration from environment variables (and `.env`, when present).
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();

        let defaults = Self::default();
        Ok(Self {
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            host: env::var("HOST").unwrap_or(defaults.host),
            port: parse_var("PORT", defaults.port)?,
            max_connections: parse_var("DB_MAX_CONNECTIONS", defaults.max_connections)?,
            lock_timeout: Duration::from_millis(parse_var(
                "LOCK_TIMEOUT_MS",
                defaults.lock_timeout.as_millis() as u64,
            )?),
        })
    }

    /// Configuration pointing at a specific database, other values defaulted.
    pub fn for_database(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Self::default()
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: Self::DEFAULT_DATABASE_URL.to_string(),
            host: "127.0.0.1".to_string(),
            port: 3000,
            max_connections: 5,
            lock_timeout: Duration::from_millis(5_000),
        }
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{name} must be a valid number (got {raw:?})")),
        Err(_) => Ok(default),
    }
}
