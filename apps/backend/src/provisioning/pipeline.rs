use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use migration::{migrate_tenant, MigrationCommand};
use tracing::{error, info, warn};

use super::seed;
use super::{ProvisioningError, ProvisioningStep};
use crate::repos::tenants::Tenant;
use crate::tenancy::{ConnectionBinding, SwitchError, TenantDatabaseEngine, TenantSwitchboard};

/// Creates, initializes, and removes tenant databases.
///
/// Every run owns its own `ConnectionBinding`, so runs for different tenants
/// may execute concurrently. DDL on the system connection is idempotent.
#[derive(Debug, Clone)]
pub struct TenantProvisioner {
    engine: Arc<dyn TenantDatabaseEngine>,
    switchboard: TenantSwitchboard,
    seed_demo: bool,
}

async fn run_step<T, E, F>(tenant_id: i64, step: ProvisioningStep, fut: F) -> Result<T, ProvisioningError>
where
    E: Display,
    F: Future<Output = Result<T, E>>,
{
    info!(step = %step, tenant_id, "Provisioning step started");
    match fut.await {
        Ok(value) => {
            info!(step = %step, tenant_id, "Provisioning step finished");
            Ok(value)
        }
        Err(e) => {
            error!(step = %step, tenant_id, error = %e, "Provisioning step failed");
            Err(ProvisioningError::Failed {
                tenant_id,
                step,
                cause: e.to_string(),
            })
        }
    }
}

/// Connection failures keep their identity; any other switch error is a step failure.
fn connection_failure(tenant_id: i64, e: SwitchError) -> ProvisioningError {
    match e {
        SwitchError::DatabaseConnectionFailed { tenant_id, detail } => {
            ProvisioningError::DatabaseConnectionFailed { tenant_id, detail }
        }
        other => ProvisioningError::Failed {
            tenant_id,
            step: ProvisioningStep::SwitchConnection,
            cause: other.to_string(),
        },
    }
}

impl TenantProvisioner {
    pub fn new(switchboard: TenantSwitchboard, seed_demo: bool) -> Self {
        Self {
            engine: Arc::clone(switchboard.engine()),
            switchboard,
            seed_demo,
        }
    }

    pub fn seeds_demo_data(&self) -> bool {
        self.seed_demo
    }

    /// Run the full pipeline. Stamping `provisioned_at` is the caller's job.
    pub async fn provision(&self, tenant: &Tenant) -> Result<(), ProvisioningError> {
        let started = Instant::now();
        let tenant_id = tenant.id;
        info!(tenant_id, slug = %tenant.slug, "Provisioning tenant");

        run_step(
            tenant_id,
            ProvisioningStep::CreateDatabase,
            self.engine.create_database(&tenant.db_name),
        )
        .await?;

        let spec = self
            .switchboard
            .connection_spec(tenant)
            .map_err(|e| connection_failure(tenant_id, e))?;
        run_step(
            tenant_id,
            ProvisioningStep::CreateDatabaseUser,
            self.engine
                .create_user(&spec.username, &spec.password, &spec.database),
        )
        .await?;

        let mut binding = ConnectionBinding::new();
        let result = self.initialize(tenant, &mut binding).await;
        binding.clear().await;
        result?;

        info!(
            tenant_id,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Tenant provisioned"
        );
        Ok(())
    }

    async fn initialize(
        &self,
        tenant: &Tenant,
        binding: &mut ConnectionBinding,
    ) -> Result<(), ProvisioningError> {
        let tenant_id = tenant.id;
        let step = ProvisioningStep::SwitchConnection;
        info!(step = %step, tenant_id, "Provisioning step started");
        if let Err(e) = self.switchboard.switch(binding, tenant_id).await {
            error!(step = %step, tenant_id, error = %e, "Provisioning step failed");
            return Err(connection_failure(tenant_id, e));
        }
        info!(step = %step, tenant_id, "Provisioning step finished");

        let Some(conn) = binding.connection() else {
            return Err(ProvisioningError::Failed {
                tenant_id,
                step,
                cause: "binding empty after switch".into(),
            });
        };

        run_step(
            tenant_id,
            ProvisioningStep::RunSchemaMigration,
            migrate_tenant(conn, MigrationCommand::Up),
        )
        .await?;

        run_step(
            tenant_id,
            ProvisioningStep::CreateDefaultAdmin,
            seed::create_default_admin(conn, &tenant.slug),
        )
        .await?;

        if self.seed_demo {
            // Optional: a failed demo seed never fails provisioning.
            let step = ProvisioningStep::SeedDemoData;
            match seed::seed_demo_data(conn).await {
                Ok(()) => info!(step = %step, tenant_id, "Provisioning step finished"),
                Err(e) => warn!(step = %step, tenant_id, error = %e, "Demo data seeding skipped"),
            }
        }
        Ok(())
    }

    /// Whether the physical database exists, independent of `provisioned_at`.
    pub async fn is_provisioned(&self, tenant: &Tenant) -> Result<bool, ProvisioningError> {
        self.engine
            .database_exists(&tenant.db_name)
            .await
            .map_err(|e| ProvisioningError::DatabaseConnectionFailed {
                tenant_id: tenant.id,
                detail: e.to_string(),
            })
    }

    /// Best-effort teardown of the database and its user. Never errors.
    pub async fn deprovision(&self, tenant: &Tenant) -> bool {
        let tenant_id = tenant.id;
        let mut ok = true;

        if let Err(e) = self.engine.drop_database(&tenant.db_name).await {
            error!(tenant_id, db_name = %tenant.db_name, error = %e, "Failed to drop tenant database");
            ok = false;
        }
        if let Err(e) = self.engine.drop_user(&tenant.db_user).await {
            error!(tenant_id, db_user = %tenant.db_user, error = %e, "Failed to drop tenant database user");
            ok = false;
        }

        if ok {
            info!(tenant_id, "Tenant deprovisioned");
        }
        ok
    }
}
