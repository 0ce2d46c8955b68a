use std::sync::Arc;
use std::time::Instant;

use sea_orm::{ConnectionTrait, DatabaseConnection, Statement};
use tracing::{info, warn};

use super::binding::{ConnectionBinding, ConnectionSpec};
use super::engine::TenantDatabaseEngine;
use super::SwitchError;
use crate::crypto::TenantCredentialCipher;
use crate::repos::tenants::{self, Tenant};

/// Resolves tenants from the registry and points a `ConnectionBinding` at
/// their database.
#[derive(Debug, Clone)]
pub struct TenantSwitchboard {
    system_db: DatabaseConnection,
    engine: Arc<dyn TenantDatabaseEngine>,
    cipher: TenantCredentialCipher,
}

impl TenantSwitchboard {
    pub fn new(
        system_db: DatabaseConnection,
        engine: Arc<dyn TenantDatabaseEngine>,
        cipher: TenantCredentialCipher,
    ) -> Self {
        Self {
            system_db,
            engine,
            cipher,
        }
    }

    pub fn engine(&self) -> &Arc<dyn TenantDatabaseEngine> {
        &self.engine
    }

    pub fn system_db(&self) -> &DatabaseConnection {
        &self.system_db
    }

    /// Registry lookup; the binding is not touched.
    pub async fn get_tenant(&self, tenant_id: i64) -> Result<Tenant, SwitchError> {
        tenants::find_by_id(&self.system_db, tenant_id)
            .await?
            .ok_or(SwitchError::TenantNotFound(tenant_id))
    }

    /// False on any lookup failure.
    pub async fn is_tenant_active(&self, tenant_id: i64) -> bool {
        match self.get_tenant(tenant_id).await {
            Ok(tenant) => tenant.is_active(),
            Err(e) => {
                warn!(tenant_id, error = %e, "Tenant activity check failed");
                false
            }
        }
    }

    /// Decrypt the stored credentials into a connection spec.
    pub fn connection_spec(&self, tenant: &Tenant) -> Result<ConnectionSpec, SwitchError> {
        let password = self
            .cipher
            .decrypt(&tenant.slug, &tenant.db_pass_sealed)
            .map_err(|e| SwitchError::DatabaseConnectionFailed {
                tenant_id: tenant.id,
                detail: e.to_string(),
            })?;
        Ok(ConnectionSpec {
            driver: self.engine.driver(),
            database: tenant.db_name.clone(),
            username: tenant.db_user.clone(),
            password,
        })
    }

    /// Point `binding` at `tenant_id`'s database.
    ///
    /// Always reconnects, even when the binding already holds this tenant.
    /// A missing or suspended tenant leaves the binding untouched; a failed
    /// connection leaves it empty.
    pub async fn switch(
        &self,
        binding: &mut ConnectionBinding,
        tenant_id: i64,
    ) -> Result<Tenant, SwitchError> {
        let started = Instant::now();
        let tenant = self.get_tenant(tenant_id).await?;
        if !tenant.is_active() {
            return Err(SwitchError::TenantSuspended(tenant_id));
        }

        let spec = self.connection_spec(&tenant)?;
        binding.clear().await;

        let conn = self.engine.connect(&spec).await.map_err(|e| {
            SwitchError::DatabaseConnectionFailed {
                tenant_id,
                detail: e.to_string(),
            }
        })?;

        let probe = Statement::from_string(conn.get_database_backend(), "SELECT 1");
        if let Err(e) = conn.query_one(probe).await {
            if let Err(close_err) = conn.close().await {
                warn!(tenant_id, error = %close_err, "Failed to close rejected tenant connection");
            }
            return Err(SwitchError::DatabaseConnectionFailed {
                tenant_id,
                detail: e.to_string(),
            });
        }

        info!(
            tenant_id,
            database = %spec.database,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Tenant connection switched"
        );
        binding.rebind(tenant_id, spec, conn).await;
        Ok(tenant)
    }
}
