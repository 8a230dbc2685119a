/**
 * Server Configuration
 *
 * This module loads server configuration from environment variables and
 * initializes the optional PostgreSQL connection.
 *
 * # Resilience
 *
 * Configuration errors are logged but do not prevent server startup. When
 * `DATABASE_URL` is absent or the connection fails, the server falls back
 * to the in-memory store: accounts and sessions then live only as long as
 * the process, which is fine for local development.
 */

use sqlx::PgPool;

use crate::backend::auth::tokens::TokenConfig;

/// Default HTTP port when `SERVER_PORT` is not set
pub const DEFAULT_PORT: u16 = 3000;

/// Server configuration loaded from the environment
#[derive(Clone)]
pub struct ServerConfig {
    /// HTTP listen port (`SERVER_PORT`)
    pub port: u16,
    /// Token signing and lifetime settings
    pub tokens: TokenConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let port = std::env::var("SERVER_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        Self { port, tokens: TokenConfig::from_env() }
    }
}

/// Load and initialize the database connection pool
///
/// Reads `DATABASE_URL`, connects, and runs migrations. Returns `None` on
/// any failure so the caller can fall back to the in-memory store.
pub async fn load_database() -> Option<PgPool> {
    let database_url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            tracing::warn!("DATABASE_URL not set. Falling back to the in-memory store.");
            return None;
        }
    };

    tracing::info!("Connecting to database...");

    let pool = match PgPool::connect(&database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Failed to create database connection pool: {:?}", e);
            tracing::warn!("Falling back to the in-memory store.");
            return None;
        }
    };

    if let Err(e) = sqlx::migrate!("./migrations").run(&pool).await {
        tracing::error!("Database migration failed: {:?}", e);
        tracing::warn!("Falling back to the in-memory store.");
        return None;
    }

    tracing::info!("Database connected and migrations applied");
    Some(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_port_without_env() {
        // SERVER_PORT is unset in the test environment
        let config = ServerConfig::from_env();
        assert_eq!(config.port, DEFAULT_PORT);
    }
}
