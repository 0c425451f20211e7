//! PostgreSQL configuration

use std::time::Duration;
use thiserror::Error;

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required configuration: {0}")]
    Missing(String),

    #[error("Invalid configuration value for {key}: {reason}")]
    Invalid { key: String, reason: String },
}

/// PostgreSQL connection configuration
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub database_url: String,
    /// Connection pool configuration
    pub pool: PoolConfig,
}

impl PostgresConfig {
    /// Load configuration from environment variables.
    ///
    /// Requires `DATABASE_URL`; `SPOTMAP_DB_MAX_CONNECTIONS`,
    /// `SPOTMAP_DB_MIN_CONNECTIONS` and `SPOTMAP_DB_ACQUIRE_TIMEOUT_SECS`
    /// override the pool defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| ConfigError::Missing("DATABASE_URL".to_string()))?;

        let mut pool = PoolConfig::default();
        if let Some(max) = env_number("SPOTMAP_DB_MAX_CONNECTIONS")? {
            pool.max_connections = max;
        }
        if let Some(min) = env_number("SPOTMAP_DB_MIN_CONNECTIONS")? {
            pool.min_connections = min;
        }
        if let Some(secs) = env_number("SPOTMAP_DB_ACQUIRE_TIMEOUT_SECS")? {
            pool.acquire_timeout = Duration::from_secs(u64::from(secs));
        }

        let config = Self { database_url, pool };
        config.validate()?;
        Ok(config)
    }

    /// Create a new configuration with the given database URL
    pub fn new(database_url: impl Into<String>) -> Result<Self, ConfigError> {
        let config = Self { database_url: database_url.into(), pool: PoolConfig::default() };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database_url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "database_url".to_string(),
                reason: "cannot be empty".to_string(),
            });
        }

        self.pool.validate()
    }
}

fn env_number(key: &str) -> Result<Option<u32>, ConfigError> {
    match std::env::var(key) {
        Ok(raw) => parse_number(key, &raw).map(Some),
        Err(_) => Ok(None),
    }
}

fn parse_number(key: &str, raw: &str) -> Result<u32, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::Invalid {
        key: key.to_string(),
        reason: format!("expected a non-negative integer, got '{}'", raw),
    })
}

/// Connection pool configuration
#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub min_connections: u32,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            min_connections: 1,
            max_connections: 5,
            acquire_timeout: Duration::from_secs(10),
            idle_timeout: Duration::from_secs(300),
        }
    }
}

impl PoolConfig {
    /// Validate pool configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_connections == 0 {
            return Err(ConfigError::Invalid {
                key: "pool.max_connections".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }

        if self.min_connections > self.max_connections {
            return Err(ConfigError::Invalid {
                key: "pool.min_connections".to_string(),
                reason: format!(
                    "min_connections ({}) cannot be greater than max_connections ({})",
                    self.min_connections, self.max_connections
                ),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_new_valid() {
        assert!(PostgresConfig::new("postgresql://localhost/spotmap").is_ok());
    }

    #[test]
    fn test_config_new_empty_url() {
        match PostgresConfig::new("  ") {
            Err(ConfigError::Invalid { key, .. }) => assert_eq!(key, "database_url"),
            other => panic!("Expected Invalid error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("SPOTMAP_DB_MAX_CONNECTIONS", " 8 ").ok(), Some(8));
        assert!(matches!(
            parse_number("SPOTMAP_DB_MAX_CONNECTIONS", "many"),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn test_pool_config_bounds() {
        let mut pool = PoolConfig::default();
        assert!(pool.validate().is_ok());

        pool.min_connections = 20;
        assert!(pool.validate().is_err());

        pool.min_connections = 0;
        pool.max_connections = 0;
        assert!(pool.validate().is_err());
    }
}
