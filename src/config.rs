use config::{Config, ConfigError, Environment};
use serde::Deserialize;
use validator::Validate;

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_DB_MIN_CONNECTIONS: u32 = 1;
const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 100;

/// Core configuration, loadable from `MEDSTOCK_*` environment variables.
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct CoreConfig {
    /// Database connection URL for the durable stock store.
    pub database_url: String,

    #[serde(default = "default_db_max_connections")]
    #[validate(range(min = 1))]
    pub db_max_connections: u32,

    #[serde(default = "default_db_min_connections")]
    #[validate(range(min = 1))]
    pub db_min_connections: u32,

    /// Capacity of the event channel between services and the event loop.
    #[serde(default = "default_event_channel_capacity")]
    #[validate(range(min = 1))]
    pub event_channel_capacity: usize,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_db_max_connections() -> u32 {
    DEFAULT_DB_MAX_CONNECTIONS
}

fn default_db_min_connections() -> u32 {
    DEFAULT_DB_MIN_CONNECTIONS
}

fn default_event_channel_capacity() -> usize {
    DEFAULT_EVENT_CHANNEL_CAPACITY
}

impl CoreConfig {
    /// Configuration with defaults for everything but the database URL.
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            db_max_connections: DEFAULT_DB_MAX_CONNECTIONS,
            db_min_connections: DEFAULT_DB_MIN_CONNECTIONS,
            event_channel_capacity: DEFAULT_EVENT_CHANNEL_CAPACITY,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_json: false,
        }
    }

    /// Loads configuration from `MEDSTOCK_*` environment variables, e.g.
    /// `MEDSTOCK_DATABASE_URL`, `MEDSTOCK_DB_MAX_CONNECTIONS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(Environment::with_prefix("MEDSTOCK"))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = CoreConfig::new("sqlite::memory:");
        assert!(config.validate().is_ok());
        assert_eq!(config.db_max_connections, 10);
        assert_eq!(config.event_channel_capacity, 100);
    }

    #[test]
    fn zero_pool_size_fails_validation() {
        let mut config = CoreConfig::new("sqlite::memory:");
        config.db_max_connections = 0;
        assert!(config.validate().is_err());
    }
}
