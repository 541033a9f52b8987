use anyhow::Result;
use config::Config;
use serde::Deserialize;

use crate::constants::DEFAULT_MAX_WINDOW_DAYS;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub schedule: ScheduleConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Write endpoint. Empty selects the in-memory store.
    pub url: String,
    /// Read endpoint; the write endpoint serves reads when unset.
    pub read_url: Option<String>,
    pub max_connections: u8,
}

impl DatabaseConfig {
    /// ## Summary
    /// Returns the URL used for read-only queries.
    #[must_use]
    pub fn read_url(&self) -> &str {
        match self.read_url.as_deref() {
            Some(url) if !url.is_empty() => url,
            _ => &self.url,
        }
    }

    /// ## Summary
    /// Whether a relational store is configured at all.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.url.is_empty()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    /// ## Summary
    /// Returns the bind address in the format "host:port".
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleConfig {
    /// Largest `[from, to]` window, in days, a single expansion may cover.
    pub max_window_days: u32,
    /// IANA zone used for centers that have none stored.
    pub default_timezone: String,
    /// Seconds before an in-flight expansion is cancelled.
    pub request_timeout_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            max_window_days: DEFAULT_MAX_WINDOW_DAYS,
            default_timezone: "UTC".to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl Settings {
    /// ## Summary
    /// Loads configuration from `.env` file and environment variables into a `Settings`.
    /// Environment variables take precedence over `.env` file values.
    ///
    /// ## Errors
    /// Returns an error if building the configuration or deserializing it fails.
    pub fn load() -> Result<Self> {
        Ok(Config::builder()
            .set_default("database.url", "")?
            .set_default("database.max_connections", 4)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8698)?
            .set_default("logging.level", "debug")?
            .set_default("schedule.max_window_days", DEFAULT_MAX_WINDOW_DAYS)?
            .set_default("schedule.default_timezone", "UTC")?
            .set_default("schedule.request_timeout_secs", 30)?
            // Env file
            .add_source(
                config::Environment::default()
                    .convert_case(config::Case::Snake)
                    .separator("_")
                    .ignore_empty(true)
                    .try_parsing(true),
            )
            // TOML file
            .add_source(config::File::with_name("config.toml").required(false))
            .build()?
            .try_deserialize::<Settings>()?)
    }
}

/// ## Summary
/// Loads configuration from environment variables and `.env` file.
///
/// ## Errors
/// Returns an error if loading or deserializing the configuration fails.
pub fn load_config() -> Result<Settings> {
    dotenvy::dotenv().ok();

    Settings::load()
}
