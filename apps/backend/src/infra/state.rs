use std::sync::Arc;

use crate::auth::token::TokenCodec;
use crate::config::app::{AppConfig, RuntimeEnv};
use crate::config::db::SystemDbSettings;
use crate::crypto::TenantCredentialCipher;
use crate::error::AppError;
use crate::infra::db::bootstrap_system_db;
use crate::provisioning::{ProvisioningQueue, TenantProvisioner};
use crate::state::app_state::AppState;
use crate::state::security_config::SecurityConfig;
use crate::tenancy::{PostgresEngine, SqliteFileEngine, TenantDatabaseEngine, TenantSwitchboard};

/// Builder for `AppState`, shared by `main`, the CLI, and tests.
pub struct StateBuilder {
    env: RuntimeEnv,
    security_config: SecurityConfig,
    credentials_key: [u8; 32],
    system_db: Option<SystemDbSettings>,
    seed_demo: bool,
    provisioning_concurrency: usize,
}

impl StateBuilder {
    pub fn new() -> Self {
        Self {
            env: RuntimeEnv::Prod,
            security_config: SecurityConfig::default(),
            credentials_key: [0u8; 32],
            system_db: None,
            seed_demo: false,
            provisioning_concurrency: 2,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            env: config.env,
            security_config: SecurityConfig::new(config.jwt_secret.clone(), config.app_url.clone()),
            credentials_key: config.credentials_key,
            system_db: Some(config.system_db.clone()),
            seed_demo: config.seed_demo,
            provisioning_concurrency: config.provisioning_concurrency,
        }
    }

    pub fn with_env(mut self, env: RuntimeEnv) -> Self {
        self.env = env;
        self
    }

    pub fn with_security(mut self, security_config: SecurityConfig) -> Self {
        self.security_config = security_config;
        self
    }

    pub fn with_credentials_key(mut self, key: [u8; 32]) -> Self {
        self.credentials_key = key;
        self
    }

    pub fn with_system_db(mut self, settings: SystemDbSettings) -> Self {
        self.system_db = Some(settings);
        self
    }

    pub fn with_seed_demo(mut self, seed_demo: bool) -> Self {
        self.seed_demo = seed_demo;
        self
    }

    pub fn with_provisioning_concurrency(mut self, n: usize) -> Self {
        self.provisioning_concurrency = n;
        self
    }

    /// Connect and migrate the system database, pick the engine matching it,
    /// and start the provisioning worker. Needs a running tokio runtime.
    pub async fn build(self) -> Result<AppState, AppError> {
        let settings = self
            .system_db
            .ok_or_else(|| AppError::config("system database settings are required"))?;
        let system_db = bootstrap_system_db(&settings).await?;

        let engine: Arc<dyn TenantDatabaseEngine> = match &settings {
            SystemDbSettings::Postgres { server, .. } => {
                Arc::new(PostgresEngine::new(system_db.clone(), server.clone()))
            }
            SystemDbSettings::SqliteFile { data_dir } => {
                Arc::new(SqliteFileEngine::new(data_dir.clone()))
            }
        };

        let cipher = TenantCredentialCipher::new(self.credentials_key);
        let switchboard = TenantSwitchboard::new(system_db.clone(), engine, cipher.clone());
        let provisioner = TenantProvisioner::new(switchboard.clone(), self.seed_demo);
        let (provisioning, _worker) = ProvisioningQueue::start(
            provisioner.clone(),
            system_db.clone(),
            self.provisioning_concurrency,
        );

        Ok(AppState {
            env: self.env,
            system_db,
            codec: TokenCodec::new(self.security_config),
            cipher,
            switchboard,
            provisioner,
            provisioning,
        })
    }
}

impl Default for StateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn build_state() -> StateBuilder {
    StateBuilder::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::db::DbKind;

    #[tokio::test]
    async fn build_requires_system_db() {
        let err = build_state().build().await.unwrap_err();
        assert!(matches!(err, AppError::Config { .. }));
    }

    #[tokio::test]
    async fn build_with_sqlite_picks_file_engine() {
        let dir = tempfile::tempdir().unwrap();
        let state = build_state()
            .with_env(RuntimeEnv::Test)
            .with_system_db(SystemDbSettings::SqliteFile {
                data_dir: dir.path().to_path_buf(),
            })
            .build()
            .await
            .unwrap();

        assert_eq!(state.switchboard.engine().driver(), DbKind::SqliteFile);
        assert!(state.exposes_details());
        assert!(dir.path().join("system.sqlite").exists());
    }
}
