//! Admin operations on the tenant registry.

use sea_orm::{ConnectionTrait, Statement};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{info, warn};

use crate::entities::TenantStatus;
use crate::error::AppError;
use crate::errors::domain::{ConflictKind, DomainError};
use crate::provisioning::JobStatus;
use crate::repos::tenants::{self, Tenant, TenantCreate, TenantUpdate};
use crate::state::app_state::AppState;
use crate::validation::{is_identifier, is_slug, FieldErrors, Validate};

const MAX_LEN: usize = 255;
const MIN_DB_PASS_LEN: usize = 8;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateTenantRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub db_name: Option<String>,
    pub db_user: Option<String>,
    pub db_pass: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTenantRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub db_name: Option<String>,
    pub db_user: Option<String>,
    pub db_pass: Option<String>,
    pub status: Option<String>,
}

fn check_name(errors: &mut FieldErrors, name: &str) {
    if name.chars().count() > MAX_LEN {
        errors.add("name", "Tenant name cannot exceed 255 characters");
    }
}

fn check_slug(errors: &mut FieldErrors, slug: &str) {
    if slug.len() > MAX_LEN {
        errors.add("slug", "Tenant slug cannot exceed 255 characters");
    }
    if !is_slug(slug) {
        errors.add("slug", "Slug can only contain lowercase letters, numbers, and hyphens");
    }
}

fn check_identifier(errors: &mut FieldErrors, field: &str, label: &str, value: &str) {
    if value.len() > MAX_LEN {
        errors.add(field, format!("{label} cannot exceed 255 characters"));
    }
    if !is_identifier(value) {
        errors.add(
            field,
            format!("{label} can only contain letters, numbers, and underscores"),
        );
    }
}

fn check_db_pass(errors: &mut FieldErrors, pass: &str) {
    let len = pass.chars().count();
    if len < MIN_DB_PASS_LEN {
        errors.add("db_pass", "Database password must be at least 8 characters");
    } else if len > MAX_LEN {
        errors.add("db_pass", "Database password cannot exceed 255 characters");
    }
}

fn required<'a>(
    errors: &mut FieldErrors,
    field: &str,
    message: &str,
    value: &'a Option<String>,
) -> Option<&'a str> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Some(v),
        _ => {
            errors.add(field, message);
            None
        }
    }
}

impl Validate for CreateTenantRequest {
    fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::default();
        if let Some(name) = required(&mut errors, "name", "Tenant name is required", &self.name) {
            check_name(&mut errors, name);
        }
        if let Some(slug) = required(&mut errors, "slug", "Tenant slug is required", &self.slug) {
            check_slug(&mut errors, slug);
        }
        if let Some(db_name) =
            required(&mut errors, "db_name", "Database name is required", &self.db_name)
        {
            check_identifier(&mut errors, "db_name", "Database name", db_name);
        }
        if let Some(db_user) =
            required(&mut errors, "db_user", "Database user is required", &self.db_user)
        {
            check_identifier(&mut errors, "db_user", "Database user", db_user);
        }
        // Passwords are not trimmed.
        match self.db_pass.as_deref() {
            Some(pass) if !pass.is_empty() => check_db_pass(&mut errors, pass),
            _ => errors.add("db_pass", "Database password is required"),
        }
        errors
    }
}

impl Validate for UpdateTenantRequest {
    fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::default();
        if let Some(name) = &self.name {
            check_name(&mut errors, name.trim());
        }
        if let Some(slug) = &self.slug {
            check_slug(&mut errors, slug.trim());
        }
        if let Some(db_name) = &self.db_name {
            check_identifier(&mut errors, "db_name", "Database name", db_name.trim());
        }
        if let Some(db_user) = &self.db_user {
            check_identifier(&mut errors, "db_user", "Database user", db_user.trim());
        }
        if let Some(pass) = &self.db_pass {
            check_db_pass(&mut errors, pass);
        }
        if let Some(status) = &self.status {
            if parse_status(status).is_none() {
                errors.add("status", "Status must be either active or suspended");
            }
        }
        errors
    }
}

fn parse_status(raw: &str) -> Option<TenantStatus> {
    match raw {
        "active" => Some(TenantStatus::Active),
        "suspended" => Some(TenantStatus::Suspended),
        _ => None,
    }
}

fn duplicate_slug() -> AppError {
    DomainError::conflict(
        ConflictKind::DuplicateSlug,
        "A tenant with this slug already exists",
    )
    .into()
}

fn owned(value: &Option<String>) -> String {
    value.as_deref().map(str::trim).unwrap_or_default().to_string()
}

/// Insert the registry row and queue provisioning. Returns before the
/// tenant database exists.
pub async fn create_tenant(state: &AppState, req: CreateTenantRequest) -> Result<Tenant, AppError> {
    let errors = req.validate();
    if !errors.is_empty() {
        return Err(AppError::validation(errors));
    }

    let slug = owned(&req.slug);
    if tenants::find_by_slug(&state.system_db, &slug).await?.is_some() {
        return Err(duplicate_slug());
    }

    let plain = req.db_pass.unwrap_or_default();
    let db_pass_sealed = state
        .cipher
        .encrypt(&slug, &plain)
        .map_err(|e| AppError::internal(e.to_string()))?;

    let tenant = tenants::create(
        &state.system_db,
        TenantCreate {
            name: owned(&req.name),
            slug,
            db_name: owned(&req.db_name),
            db_user: owned(&req.db_user),
            db_pass_sealed,
        },
    )
    .await?;
    info!(tenant_id = tenant.id, slug = %tenant.slug, "Tenant created");

    state.provisioning.enqueue(tenant.id)?;
    Ok(tenant)
}

pub async fn get_tenant(state: &AppState, tenant_id: i64) -> Result<Tenant, AppError> {
    tenants::find_by_id(&state.system_db, tenant_id)
        .await?
        .ok_or(AppError::TenantNotFound { tenant_id })
}

pub async fn list_tenants(state: &AppState) -> Result<Vec<Tenant>, AppError> {
    Ok(tenants::list(&state.system_db).await?)
}

/// Partial update. A slug change re-seals the stored password, since the
/// encryption key is derived from the slug.
pub async fn update_tenant(
    state: &AppState,
    tenant_id: i64,
    req: UpdateTenantRequest,
) -> Result<Tenant, AppError> {
    let errors = req.validate();
    if !errors.is_empty() {
        return Err(AppError::validation(errors));
    }

    let current = get_tenant(state, tenant_id).await?;
    let new_slug = req.slug.as_deref().map(str::trim).map(String::from);
    let slug_changed = new_slug.as_deref().is_some_and(|s| s != current.slug);

    if slug_changed {
        if let Some(slug) = &new_slug {
            if let Some(other) = tenants::find_by_slug(&state.system_db, slug).await? {
                if other.id != tenant_id {
                    return Err(duplicate_slug());
                }
            }
        }
    }

    let effective_slug = new_slug.clone().unwrap_or_else(|| current.slug.clone());
    let db_pass_sealed = match (&req.db_pass, slug_changed) {
        (Some(plain), _) => Some(state.cipher.encrypt(&effective_slug, plain)),
        (None, true) => Some(
            state
                .cipher
                .reseal(&current.slug, &effective_slug, &current.db_pass_sealed),
        ),
        (None, false) => None,
    }
    .transpose()
    .map_err(|e| AppError::internal(e.to_string()))?;

    let update = TenantUpdate {
        name: req.name.as_deref().map(|s| s.trim().to_string()),
        slug: new_slug,
        db_name: req.db_name.as_deref().map(|s| s.trim().to_string()),
        db_user: req.db_user.as_deref().map(|s| s.trim().to_string()),
        db_pass_sealed,
        status: req.status.as_deref().and_then(parse_status),
    };
    let tenant = tenants::update(&state.system_db, tenant_id, update).await?;
    info!(tenant_id, "Tenant updated");
    Ok(tenant)
}

/// Flip status only. Open connections are unaffected; the next switch sees it.
pub async fn set_status(
    state: &AppState,
    tenant_id: i64,
    status: TenantStatus,
) -> Result<Tenant, AppError> {
    get_tenant(state, tenant_id).await?;
    let tenant = tenants::set_status(&state.system_db, tenant_id, status).await?;
    info!(tenant_id, status = ?status, "Tenant status changed");
    Ok(tenant)
}

/// Removes the registry row. The tenant database is left in place; use the
/// CLI `deprovision` command to drop it.
pub async fn delete_tenant(state: &AppState, tenant_id: i64) -> Result<(), AppError> {
    let tenant = get_tenant(state, tenant_id).await?;
    tenants::delete(&state.system_db, tenant_id).await?;
    warn!(
        tenant_id,
        db_name = %tenant.db_name,
        "Tenant deleted from registry; its database was not dropped"
    );
    Ok(())
}

/// Queue another provisioning run. `false` if one is already pending.
pub async fn requeue_provisioning(state: &AppState, tenant_id: i64) -> Result<bool, AppError> {
    get_tenant(state, tenant_id).await?;
    Ok(state.provisioning.enqueue(tenant_id)?)
}

#[derive(Debug, Clone, Serialize)]
pub struct ProvisioningReport {
    pub tenant_id: i64,
    #[serde(with = "time::serde::rfc3339::option")]
    pub provisioned_at: Option<OffsetDateTime>,
    /// Physical database present, regardless of `provisioned_at`.
    pub database_exists: bool,
    /// `provisioned_at` and the catalog disagree.
    pub drift: bool,
    pub job: Option<JobStatus>,
}

pub async fn provisioning_report(
    state: &AppState,
    tenant_id: i64,
) -> Result<ProvisioningReport, AppError> {
    let tenant = get_tenant(state, tenant_id).await?;
    let database_exists = state.provisioner.is_provisioned(&tenant).await?;
    let drift = tenant.provisioned_at.is_some() != database_exists;
    if drift {
        warn!(
            tenant_id,
            database_exists,
            provisioned = tenant.provisioned_at.is_some(),
            "Provisioning state drift"
        );
    }
    Ok(ProvisioningReport {
        tenant_id,
        provisioned_at: tenant.provisioned_at,
        database_exists,
        drift,
        job: state.provisioning.status(tenant_id),
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct DatabaseStatus {
    /// `connected` or `disconnected`.
    pub status: &'static str,
    pub engine: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Probe the system connection. Never fails; a dead connection is a status.
pub async fn database_status(state: &AppState) -> DatabaseStatus {
    let engine = state.switchboard.engine().driver().as_str();
    let backend = state.system_db.get_database_backend();
    let sql = match backend {
        sea_orm::DatabaseBackend::Sqlite => "SELECT sqlite_version() AS version",
        _ => "SELECT version() AS version",
    };

    match state
        .system_db
        .query_one(Statement::from_string(backend, sql))
        .await
    {
        Ok(row) => DatabaseStatus {
            status: "connected",
            engine,
            version: row.and_then(|r| r.try_get::<String>("", "version").ok()),
            error: None,
        },
        Err(e) => {
            warn!(error = %e, "System database status check failed");
            DatabaseStatus {
                status: "disconnected",
                engine,
                version: None,
                error: Some(e.to_string()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acme() -> CreateTenantRequest {
        CreateTenantRequest {
            name: Some("Acme".into()),
            slug: Some("acme".into()),
            db_name: Some("tenant_acme".into()),
            db_user: Some("acme_user".into()),
            db_pass: Some("password123".into()),
        }
    }

    #[test]
    fn valid_create_request_passes() {
        assert!(acme().validate().is_empty());
    }

    #[test]
    fn missing_fields_are_required() {
        let errors = CreateTenantRequest::default().validate();
        for field in ["name", "slug", "db_name", "db_user", "db_pass"] {
            assert!(errors.get(field).is_some(), "{field}");
        }
        assert_eq!(
            errors.get("slug").unwrap()[0],
            "Tenant slug is required"
        );
    }

    #[test]
    fn format_rules() {
        let req = CreateTenantRequest {
            slug: Some("Acme_Corp".into()),
            db_name: Some("tenant-acme".into()),
            db_user: Some("acme user".into()),
            db_pass: Some("short".into()),
            ..acme()
        };
        let errors = req.validate();
        assert_eq!(
            errors.get("slug").unwrap(),
            ["Slug can only contain lowercase letters, numbers, and hyphens"]
        );
        assert!(errors.get("db_name").is_some());
        assert!(errors.get("db_user").is_some());
        assert_eq!(
            errors.get("db_pass").unwrap(),
            ["Database password must be at least 8 characters"]
        );
    }

    #[test]
    fn update_rules_only_apply_to_present_fields() {
        assert!(UpdateTenantRequest::default().validate().is_empty());

        let req = UpdateTenantRequest {
            status: Some("deleted".into()),
            ..UpdateTenantRequest::default()
        };
        assert_eq!(
            req.validate().get("status").unwrap(),
            ["Status must be either active or suspended"]
        );
    }
}
