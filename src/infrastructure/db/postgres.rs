use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{info, warn};

use crate::settings::AppConfig;

const MAX_CONNECT_ATTEMPTS: u32 = 6;
const FIRST_BACKOFF_SECS: u64 = 2;
const ACQUIRE_TIMEOUT_SECS: u64 = 10;

/// Opens the Postgres pool, retrying with doubling waits while the database
/// is still coming up.
pub async fn create_pool(config: &AppConfig) -> Result<PgPool, sqlx::Error> {
    let options = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .acquire_timeout(Duration::from_secs(ACQUIRE_TIMEOUT_SECS));

    let mut backoff = Duration::from_secs(FIRST_BACKOFF_SECS);
    let mut attempt = 1;

    loop {
        match options.clone().connect(&config.database_url).await {
            Ok(pool) => {
                info!(max_connections = config.database_max_connections, "Database pool ready");
                return Ok(pool);
            }
            Err(e) if attempt < MAX_CONNECT_ATTEMPTS => {
                warn!(
                    attempt,
                    max_attempts = MAX_CONNECT_ATTEMPTS,
                    retry_in = ?backoff,
                    error = %e,
                    "Database not reachable yet"
                );
                tokio::time::sleep(backoff).await;
                backoff *= 2;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Applies the embedded `migrations/` directory.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("Database migrations applied");
    Ok(())
}
