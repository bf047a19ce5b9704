//! PostgreSQL pool setup and schema migrations

use std::time::Duration;
use serde::Serialize;
use sqlx::migrate::Migrator;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{debug, info};
use crate::config::DatabaseConfig;
use crate::utils::errors::StudyBuddyError;

pub type DatabasePool = PgPool;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

const IDLE_TIMEOUT: Duration = Duration::from_secs(600);
const MAX_LIFETIME: Duration = Duration::from_secs(1800);

fn pool_options(config: &DatabaseConfig) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
        .idle_timeout(Some(IDLE_TIMEOUT))
        .max_lifetime(Some(MAX_LIFETIME))
}

/// Connect a pool and verify it answers
pub async fn create_pool(config: &DatabaseConfig) -> Result<DatabasePool, StudyBuddyError> {
    let pool = pool_options(config).connect(&config.url).await?;
    health_check(&pool).await?;

    info!(max_connections = config.max_connections, "Database connection pool created");
    Ok(pool)
}

/// Pool that opens connections on first use
pub fn create_lazy_pool(config: &DatabaseConfig) -> Result<DatabasePool, StudyBuddyError> {
    Ok(pool_options(config).connect_lazy(&config.url)?)
}

/// Apply pending migrations from `./migrations`
pub async fn run_migrations(pool: &DatabasePool) -> Result<(), StudyBuddyError> {
    debug!(known = MIGRATOR.iter().count(), "Running database migrations");
    MIGRATOR.run(pool).await?;
    info!("Database migrations completed");
    Ok(())
}

/// Check database health
pub async fn health_check(pool: &DatabasePool) -> Result<(), StudyBuddyError> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Connection counts for health output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolStatus {
    pub size: u32,
    pub idle: usize,
}

pub fn pool_status(pool: &DatabasePool) -> PoolStatus {
    PoolStatus {
        size: pool.size(),
        idle: pool.num_idle(),
    }
}
