use tempfile::TempDir;
use tenancy_backend::config::app::RuntimeEnv;
use tenancy_backend::config::db::SystemDbSettings;
use tenancy_backend::error::AppError;
use tenancy_backend::infra::state::{build_state, StateBuilder};
use tenancy_backend::state::app_state::AppState;
use tenancy_backend::state::security_config::SecurityConfig;

pub const TEST_JWT_SECRET: &str = "test_secret_key_for_testing_purposes_only";
pub const TEST_ISSUER: &str = "http://localhost:8000";
pub const TEST_CREDENTIALS_KEY: [u8; 32] = [7u8; 32];

/// State backed by SQLite files in a private temp directory. The directory
/// lives as long as the `TestEnv`.
pub struct TestEnv {
    pub state: AppState,
    _dir: TempDir,
}

pub fn test_security() -> SecurityConfig {
    SecurityConfig::new(TEST_JWT_SECRET.as_bytes(), TEST_ISSUER)
}

pub async fn build_test_env() -> Result<TestEnv, AppError> {
    build_test_env_with(|builder| builder).await
}

/// Like `build_test_env`, with a hook to adjust the builder first.
pub async fn build_test_env_with(
    configure: impl FnOnce(StateBuilder) -> StateBuilder,
) -> Result<TestEnv, AppError> {
    let dir = tempfile::tempdir().map_err(|e| AppError::internal(e.to_string()))?;
    let builder = build_state()
        .with_env(RuntimeEnv::Test)
        .with_security(test_security())
        .with_credentials_key(TEST_CREDENTIALS_KEY)
        .with_system_db(SystemDbSettings::SqliteFile {
            data_dir: dir.path().to_path_buf(),
        });
    let state = configure(builder).build().await?;
    Ok(TestEnv { state, _dir: dir })
}
