//! Tenant database provisioning: pipeline, background worker, seed data.

pub mod pipeline;
pub mod seed;
pub mod worker;

use std::fmt;

use thiserror::Error;

pub use pipeline::TenantProvisioner;
pub use worker::{JobStatus, ProvisioningQueue};

/// Pipeline steps, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisioningStep {
    CreateDatabase,
    CreateDatabaseUser,
    SwitchConnection,
    RunSchemaMigration,
    CreateDefaultAdmin,
    SeedDemoData,
}

impl ProvisioningStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreateDatabase => "create_database",
            Self::CreateDatabaseUser => "create_database_user",
            Self::SwitchConnection => "switch_connection",
            Self::RunSchemaMigration => "run_schema_migration",
            Self::CreateDefaultAdmin => "create_default_admin",
            Self::SeedDemoData => "seed_demo_data",
        }
    }
}

impl fmt::Display for ProvisioningStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The only failures a pipeline run surfaces. Connection failures keep their
/// identity; everything else collapses into `Failed` with the original cause.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProvisioningError {
    #[error("database connection failed for tenant {tenant_id}: {detail}")]
    DatabaseConnectionFailed { tenant_id: i64, detail: String },
    #[error("provisioning tenant {tenant_id} failed at {step}: {cause}")]
    Failed {
        tenant_id: i64,
        step: ProvisioningStep,
        cause: String,
    },
}
