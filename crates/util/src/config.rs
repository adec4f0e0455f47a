use std::{env, fmt, net::SocketAddr};

use super::{server_bind_address, DEFAULT_EVENT_BUS_CAPACITY};

/// Application runtime environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
    Test,
}

impl Environment {
    fn from_str(value: &str) -> Result<Self, ConfigError> {
        match value {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            "test" => Ok(Self::Test),
            other => Err(ConfigError::InvalidEnvironment(other.to_string())),
        }
    }

    /// Returns the canonical name used for logging/metrics labels.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Test => "test",
        }
    }
}

/// Runtime configuration resolved from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub environment: Environment,
    /// Messages buffered per event bus subscriber before the slowest one lags.
    pub event_bus_capacity: usize,
}

impl AppConfig {
    /// Constructs the configuration by reading and validating environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let env_value = env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        let environment = Environment::from_str(&env_value)?;
        let bind_addr = server_bind_address().map_err(ConfigError::BindAddress)?;
        let event_bus_capacity = event_bus_capacity()?;

        Ok(Self {
            bind_addr,
            environment,
            event_bus_capacity,
        })
    }
}

fn event_bus_capacity() -> Result<usize, ConfigError> {
    let Ok(raw) = env::var("EVENT_BUS_CAPACITY") else {
        return Ok(DEFAULT_EVENT_BUS_CAPACITY);
    };
    match raw.trim().parse::<usize>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ConfigError::InvalidEventBusCapacity(raw)),
    }
}

/// Errors that can occur during configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    InvalidEnvironment(String),
    BindAddress(std::net::AddrParseError),
    InvalidEventBusCapacity(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEnvironment(value) => write!(
                f,
                "APP_ENV must be one of 'development', 'production', or 'test' (got {value})"
            ),
            Self::BindAddress(err) => write!(f, "invalid APP_BIND_ADDR value: {err}"),
            Self::InvalidEventBusCapacity(value) => write!(
                f,
                "EVENT_BUS_CAPACITY must be a positive integer (got {value})"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DEFAULT_BIND_ADDR, DEFAULT_EVENT_BUS_CAPACITY, ENV_GUARD};

    #[test]
    fn loads_defaults_in_development() {
        let _guard = ENV_GUARD.lock().expect("env guard poisoned");
        env::remove_var("APP_ENV");
        env::remove_var("APP_BIND_ADDR");
        env::remove_var("EVENT_BUS_CAPACITY");

        let config = AppConfig::from_env().expect("config should load with defaults");
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert_eq!(config.event_bus_capacity, DEFAULT_EVENT_BUS_CAPACITY);
    }

    #[test]
    fn rejects_invalid_environment() {
        let _guard = ENV_GUARD.lock().expect("env guard poisoned");
        env::remove_var("EVENT_BUS_CAPACITY");
        env::set_var("APP_ENV", "invalid");

        let err = AppConfig::from_env().expect_err("invalid env should error");
        assert!(matches!(err, ConfigError::InvalidEnvironment(value) if value == "invalid"));

        env::remove_var("APP_ENV");
    }

    #[test]
    fn parses_production_environment() {
        let _guard = ENV_GUARD.lock().expect("env guard poisoned");
        env::set_var("APP_ENV", "production");
        env::set_var("APP_BIND_ADDR", "0.0.0.0:9000");

        let config = AppConfig::from_env().expect("config should load");
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.bind_addr.to_string(), "0.0.0.0:9000");

        env::remove_var("APP_ENV");
        env::remove_var("APP_BIND_ADDR");
    }

    #[test]
    fn reads_event_bus_capacity() {
        let _guard = ENV_GUARD.lock().expect("env guard poisoned");
        env::remove_var("APP_ENV");
        env::set_var("EVENT_BUS_CAPACITY", "512");

        let config = AppConfig::from_env().expect("config should load");
        assert_eq!(config.event_bus_capacity, 512);

        env::remove_var("EVENT_BUS_CAPACITY");
    }

    #[test]
    fn rejects_zero_event_bus_capacity() {
        let _guard = ENV_GUARD.lock().expect("env guard poisoned");
        env::remove_var("APP_ENV");
        env::set_var("EVENT_BUS_CAPACITY", "0");

        let err = AppConfig::from_env().expect_err("zero capacity should error");
        assert!(matches!(err, ConfigError::InvalidEventBusCapacity(value) if value == "0"));

        env::remove_var("EVENT_BUS_CAPACITY");
    }
}
