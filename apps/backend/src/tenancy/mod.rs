//! Tenant resolution and connection switching.

pub mod binding;
pub mod engine;
pub mod switchboard;

use thiserror::Error;

pub use binding::{ConnectionBinding, ConnectionSpec};
pub use engine::{PostgresEngine, SqliteFileEngine, TenantDatabaseEngine};
pub use switchboard::TenantSwitchboard;

use crate::errors::domain::DomainError;

#[derive(Debug, Error)]
pub enum SwitchError {
    #[error("tenant {0} not found")]
    TenantNotFound(i64),
    #[error("tenant {0} is suspended")]
    TenantSuspended(i64),
    #[error("database connection failed for tenant {tenant_id}: {detail}")]
    DatabaseConnectionFailed { tenant_id: i64, detail: String },
    #[error("tenant registry lookup failed: {0}")]
    Directory(#[from] DomainError),
}
