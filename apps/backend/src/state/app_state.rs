use sea_orm::DatabaseConnection;

use super::security_config::SecurityConfig;
use crate::auth::token::TokenCodec;
use crate::config::app::RuntimeEnv;
use crate::crypto::TenantCredentialCipher;
use crate::provisioning::{ProvisioningQueue, TenantProvisioner};
use crate::tenancy::TenantSwitchboard;

/// Shared, read-only application services. Per-request tenant state never
/// lives here; see `tenancy::ConnectionBinding`.
#[derive(Debug, Clone)]
pub struct AppState {
    pub env: RuntimeEnv,
    /// System registry connection.
    pub system_db: DatabaseConnection,
    pub codec: TokenCodec,
    pub cipher: TenantCredentialCipher,
    pub switchboard: TenantSwitchboard,
    pub provisioner: TenantProvisioner,
    pub provisioning: ProvisioningQueue,
}

impl AppState {
    pub fn security(&self) -> &SecurityConfig {
        self.codec.security()
    }

    pub fn exposes_details(&self) -> bool {
        self.env.exposes_details()
    }
}
