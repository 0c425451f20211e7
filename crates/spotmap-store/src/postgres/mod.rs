//! PostgreSQL storage adapter implementation

pub mod config;
mod location;

pub use config::{ConfigError, PoolConfig, PostgresConfig};
pub use location::{escape_like, render_count, render_select};

use spotmap_core::error::{Result, SpotmapError};
use sqlx::{postgres::PgPoolOptions, PgPool};

/// PostgreSQL storage adapter over the three location tables
pub struct PostgresStore {
    pool: PgPool,
    config: PostgresConfig,
}

impl PostgresStore {
    /// Create a new PostgreSQL store with the given configuration
    pub async fn new(config: PostgresConfig) -> Result<Self> {
        config.validate().map_err(|e| SpotmapError::ConfigInvalid {
            key: "database_url".to_string(),
            reason: e.to_string(),
        })?;

        let pool = PgPoolOptions::new()
            .min_connections(config.pool.min_connections)
            .max_connections(config.pool.max_connections)
            .acquire_timeout(config.pool.acquire_timeout)
            .idle_timeout(config.pool.idle_timeout)
            .connect(&config.database_url)
            .await
            .map_err(|e| SpotmapError::Store(format!("Failed to connect to database: {}", e)))?;

        let store = Self { pool, config };
        store.health_check().await?;
        tracing::info!(
            max_connections = store.config.pool.max_connections,
            "Connected to PostgreSQL"
        );
        Ok(store)
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Get a reference to the configuration
    pub fn config(&self) -> &PostgresConfig {
        &self.config
    }

    /// Perform a health check on the database connection
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| SpotmapError::Store(format!("Health check failed: {}", e)))?;
        Ok(())
    }
}
