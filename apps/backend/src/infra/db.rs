use std::future::Future;
use std::time::Duration;

use migration::{migrate_system, MigrationCommand};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use tracing::{info, warn};

use crate::config::db::{DbKind, SystemDbSettings};
use crate::error::AppError;

const CONNECT_ATTEMPTS: u32 = 5;
const CONNECT_INTERVAL_MS: u64 = 500;

/// Retry a connection attempt with fixed interval delays; returns the last error.
async fn retry_connection<T, F, Fut>(mut connect_fn: F) -> Result<T, AppError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    let mut attempt = 1;
    loop {
        match connect_fn().await {
            Ok(conn) => {
                if attempt > 1 {
                    info!(attempts = attempt, "connection_retry=success");
                }
                return Ok(conn);
            }
            Err(e) if attempt < CONNECT_ATTEMPTS => {
                warn!(
                    attempt,
                    max_attempts = CONNECT_ATTEMPTS,
                    error = %e,
                    "connection_retry=failed"
                );
                tokio::time::sleep(Duration::from_millis(CONNECT_INTERVAL_MS)).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Connect to the system registry database. Runs no migrations.
pub async fn connect_system_db(settings: &SystemDbSettings) -> Result<DatabaseConnection, AppError> {
    if let SystemDbSettings::SqliteFile { data_dir } = settings {
        tokio::fs::create_dir_all(data_dir).await.map_err(|e| {
            AppError::config(format!(
                "cannot create SQLITE_DATA_DIR {}: {e}",
                data_dir.display()
            ))
        })?;
    }

    let url = settings.url();
    let conn = retry_connection(|| {
        let mut opts = ConnectOptions::new(url.clone());
        opts.max_connections(match settings.kind() {
            DbKind::Postgres => 10,
            DbKind::SqliteFile => 4,
        })
        .min_connections(1)
        .connect_timeout(Duration::from_secs(5))
        .sqlx_logging(false);
        async move {
            Database::connect(opts)
                .await
                .map_err(|e| AppError::DatabaseConnection {
                    detail: format!("system database: {e}"),
                })
        }
    })
    .await?;

    info!(engine = settings.kind().as_str(), "System database connected");
    Ok(conn)
}

/// Connect and bring the registry schema up to date.
pub async fn bootstrap_system_db(
    settings: &SystemDbSettings,
) -> Result<DatabaseConnection, AppError> {
    let conn = connect_system_db(settings).await?;
    migrate_system(&conn, MigrationCommand::Up)
        .await
        .map_err(|e| AppError::db(format!("system migration failed: {e}")))?;
    Ok(conn)
}

/// Pool settings for a freshly switched tenant connection: small, short-lived.
pub fn tenant_connect_options(url: String) -> ConnectOptions {
    let mut opts = ConnectOptions::new(url);
    opts.max_connections(2)
        .min_connections(0)
        .connect_timeout(Duration::from_secs(5))
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(60))
        .sqlx_logging(false);
    opts
}
