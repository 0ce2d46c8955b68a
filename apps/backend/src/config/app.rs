use std::env;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use super::db::{must_var, SystemDbSettings};
use crate::error::AppError;

/// Deployment environment; only `Prod` suppresses error diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeEnv {
    Prod,
    Dev,
    Test,
}

impl RuntimeEnv {
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Ok(RuntimeEnv::Prod),
            "dev" | "local" | "development" => Ok(RuntimeEnv::Dev),
            "test" | "testing" => Ok(RuntimeEnv::Test),
            other => Err(AppError::config(format!("Unsupported APP_ENV '{other}'"))),
        }
    }

    pub fn exposes_details(&self) -> bool {
        !matches!(self, RuntimeEnv::Prod)
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: RuntimeEnv,
    /// Token issuer (`iss`).
    pub app_url: String,
    pub jwt_secret: Vec<u8>,
    /// 32-byte master key for tenant credential encryption.
    pub credentials_key: [u8; 32],
    pub host: String,
    pub port: u16,
    pub system_db: SystemDbSettings,
    pub seed_demo: bool,
    pub provisioning_concurrency: usize,
    pub cors_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let env_kind = RuntimeEnv::parse(&env::var("APP_ENV").unwrap_or_else(|_| "prod".into()))?;

        let jwt_secret = must_var("APP_JWT_SECRET")?;
        if jwt_secret.is_empty() {
            return Err(AppError::config("APP_JWT_SECRET must not be empty"));
        }

        let port_raw = env::var("BACKEND_PORT").unwrap_or_else(|_| "8000".to_string());
        let port = port_raw
            .parse()
            .map_err(|_| AppError::config(format!("BACKEND_PORT must be a port number, got '{port_raw}'")))?;

        let concurrency_raw = env::var("PROVISIONING_CONCURRENCY").unwrap_or_else(|_| "2".into());
        let provisioning_concurrency = match concurrency_raw.parse::<usize>() {
            Ok(n) if n > 0 => n,
            _ => {
                return Err(AppError::config(format!(
                    "PROVISIONING_CONCURRENCY must be a positive integer, got '{concurrency_raw}'"
                )))
            }
        };

        Ok(Self {
            env: env_kind,
            app_url: env::var("APP_URL").unwrap_or_else(|_| "http://localhost:8000".to_string()),
            jwt_secret: jwt_secret.into_bytes(),
            credentials_key: parse_credentials_key(&must_var("TENANT_CREDENTIALS_KEY")?)?,
            host: env::var("BACKEND_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port,
            system_db: SystemDbSettings::from_env()?,
            seed_demo: parse_bool(env::var("PROVISION_SEED_DEMO").ok().as_deref()),
            provisioning_concurrency,
            cors_origins: env::var("CORS_ALLOWED_ORIGINS")
                .map(|raw| {
                    raw.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),
        })
    }
}

pub fn parse_credentials_key(raw: &str) -> Result<[u8; 32], AppError> {
    let bytes = STANDARD
        .decode(raw.trim())
        .map_err(|e| AppError::config(format!("TENANT_CREDENTIALS_KEY is not valid base64: {e}")))?;
    bytes.try_into().map_err(|v: Vec<u8>| {
        AppError::config(format!(
            "TENANT_CREDENTIALS_KEY must decode to 32 bytes, got {}",
            v.len()
        ))
    })
}

fn parse_bool(raw: Option<&str>) -> bool {
    matches!(
        raw.map(|s| s.trim().to_ascii_lowercase()).as_deref(),
        Some("1" | "true" | "yes" | "on")
    )
}

#[cfg(test)]
mod tests {
    use std::env;

    use serial_test::serial;

    use super::*;

    const KEY_B64: &str = "MDEyMzQ1Njc4OWFiY2RlZjAxMjM0NTY3ODlhYmNkZWY=";

    fn set_minimal_env(dir: &str) {
        env::set_var("APP_JWT_SECRET", "unit-test-secret");
        env::set_var("TENANT_CREDENTIALS_KEY", KEY_B64);
        env::set_var("SYSTEM_DB_KIND", "sqlite-file");
        env::set_var("SQLITE_DATA_DIR", dir);
    }

    fn clear_env() {
        for key in [
            "APP_ENV",
            "APP_URL",
            "APP_JWT_SECRET",
            "TENANT_CREDENTIALS_KEY",
            "SYSTEM_DB_KIND",
            "SQLITE_DATA_DIR",
            "PROVISION_SEED_DEMO",
            "PROVISIONING_CONCURRENCY",
            "CORS_ALLOWED_ORIGINS",
            "BACKEND_PORT",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();
        set_minimal_env("/tmp/tenancy-config");

        let config = AppConfig::from_env().unwrap();
        assert_eq!(config.env, RuntimeEnv::Prod);
        assert!(!config.env.exposes_details());
        assert_eq!(config.app_url, "http://localhost:8000");
        assert_eq!(config.port, 8000);
        assert_eq!(config.provisioning_concurrency, 2);
        assert!(!config.seed_demo);
        assert_eq!(&config.credentials_key, b"0123456789abcdef0123456789abcdef");
        clear_env();
    }

    #[test]
    #[serial]
    fn test_overrides() {
        clear_env();
        set_minimal_env("/tmp/tenancy-config");
        env::set_var("APP_ENV", "dev");
        env::set_var("PROVISION_SEED_DEMO", "true");
        env::set_var("CORS_ALLOWED_ORIGINS", "http://a.test, http://b.test,");

        let config = AppConfig::from_env().unwrap();
        assert_eq!(config.env, RuntimeEnv::Dev);
        assert!(config.env.exposes_details());
        assert!(config.seed_demo);
        assert_eq!(config.cors_origins, vec!["http://a.test", "http://b.test"]);
        clear_env();
    }

    #[test]
    #[serial]
    fn test_missing_secret_is_config_error() {
        clear_env();
        let err = AppConfig::from_env().unwrap_err();
        assert!(matches!(err, AppError::Config { .. }));
    }

    #[test]
    fn test_credentials_key_length_checked() {
        assert!(parse_credentials_key("c2hvcnQ=").is_err());
        assert!(parse_credentials_key("not base64!").is_err());
        assert!(parse_credentials_key(KEY_B64).is_ok());
    }
}
