use backend_test_support::unique_helpers::{unique_identifier, unique_slug};
use tenancy_backend::error::AppError;
use tenancy_backend::provisioning::JobStatus;
use tenancy_backend::repos::tenants::{self, Tenant, TenantCreate};
use tenancy_backend::services::tenants::{create_tenant, CreateTenantRequest};
use tenancy_backend::state::app_state::AppState;

pub fn tenant_request(name: &str, prefix: &str) -> CreateTenantRequest {
    CreateTenantRequest {
        name: Some(name.to_string()),
        slug: Some(unique_slug(prefix)),
        db_name: Some(unique_identifier(&format!("tenant_{prefix}"))),
        db_user: Some(unique_identifier(&format!("{prefix}_user"))),
        db_pass: Some(format!("{prefix}_password")),
    }
}

/// Create through the service layer and wait for the background job.
pub async fn provisioned_tenant(
    state: &AppState,
    name: &str,
    prefix: &str,
) -> Result<Tenant, AppError> {
    let tenant = create_tenant(state, tenant_request(name, prefix)).await?;
    match state.provisioning.wait_for(tenant.id).await {
        Some(JobStatus::Succeeded) => {}
        other => {
            return Err(AppError::internal(format!(
                "provisioning tenant {} ended with {other:?}",
                tenant.id
            )))
        }
    }
    Ok(tenants::require(&state.system_db, tenant.id).await?)
}

/// Registry row only; no job is queued and no database exists.
pub async fn registered_tenant(state: &AppState, prefix: &str) -> Result<Tenant, AppError> {
    let slug = unique_slug(prefix);
    let db_pass_sealed = state
        .cipher
        .encrypt(&slug, "registered_only")
        .map_err(|e| AppError::internal(e.to_string()))?;
    Ok(tenants::create(
        &state.system_db,
        TenantCreate {
            name: format!("{prefix} (unprovisioned)"),
            slug,
            db_name: unique_identifier(&format!("tenant_{prefix}")),
            db_user: unique_identifier(&format!("{prefix}_user")),
            db_pass_sealed,
        },
    )
    .await?)
}

pub fn admin_email(tenant: &Tenant) -> String {
    format!("admin@{}.com", tenant.slug)
}
