#![deny(clippy::wildcard_imports)]
#![cfg_attr(test, allow(clippy::wildcard_imports))]

pub mod adapters;
pub mod auth;
pub mod config;
pub mod crypto;
pub mod entities;
pub mod error;
pub mod errors;
pub mod extractors;
pub mod infra;
pub mod logging;
pub mod middleware;
pub mod provisioning;
pub mod repos;
pub mod routes;
pub mod services;
pub mod state;
pub mod telemetry;
pub mod tenancy;
pub mod trace_ctx;
pub mod validation;

pub use auth::{authenticate, AuthClaims, TokenCodec, TokenError, ValidatedClaims};
pub use config::app::{AppConfig, RuntimeEnv};
pub use config::db::{DbKind, SystemDbSettings};
pub use error::AppError;
pub use errors::ErrorCode;
pub use extractors::{TenantContext, ValidatedJson};
pub use infra::state::{build_state, StateBuilder};
pub use middleware::{cors_middleware, RequestTrace, StructuredLogger, TenantJwt, TraceSpan};
pub use provisioning::{JobStatus, ProvisioningQueue, TenantProvisioner};
pub use state::app_state::AppState;
pub use state::security_config::SecurityConfig;
pub use tenancy::{ConnectionBinding, TenantSwitchboard};

#[cfg(test)]
#[ctor::ctor]
fn init_test_logging() {
    backend_test_support::logging::init();
}
