//! Tenant registry (system database), generic over `ConnectionTrait`.

use sea_orm::ConnectionTrait;
use serde::Serialize;
use time::OffsetDateTime;

use crate::adapters::tenants_sea as tenants_adapter;
use crate::entities::TenantStatus;
use crate::errors::domain::{DomainError, NotFoundKind};

pub use tenants_adapter::{TenantCreate, TenantUpdate};

/// Registry record. `db_pass_sealed` is ciphertext; see `crypto::credentials`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tenant {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub db_name: String,
    pub db_user: String,
    #[serde(skip_serializing)]
    pub db_pass_sealed: String,
    pub status: TenantStatus,
    #[serde(with = "time::serde::rfc3339::option")]
    pub provisioned_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Tenant {
    pub fn is_active(&self) -> bool {
        self.status == TenantStatus::Active
    }
}

pub async fn find_by_id<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    id: i64,
) -> Result<Option<Tenant>, DomainError> {
    let tenant = tenants_adapter::find_by_id(conn, id).await?;
    Ok(tenant.map(Tenant::from))
}

/// Like `find_by_id`, but absence is an error.
pub async fn require<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    id: i64,
) -> Result<Tenant, DomainError> {
    find_by_id(conn, id)
        .await?
        .ok_or_else(|| DomainError::not_found(NotFoundKind::Tenant, format!("Tenant {id} not found")))
}

pub async fn find_by_slug<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    slug: &str,
) -> Result<Option<Tenant>, DomainError> {
    let tenant = tenants_adapter::find_by_slug(conn, slug).await?;
    Ok(tenant.map(Tenant::from))
}

pub async fn list<C: ConnectionTrait + Send + Sync>(conn: &C) -> Result<Vec<Tenant>, DomainError> {
    let tenants = tenants_adapter::list(conn).await?;
    Ok(tenants.into_iter().map(Tenant::from).collect())
}

pub async fn create<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    dto: TenantCreate,
) -> Result<Tenant, DomainError> {
    let tenant = tenants_adapter::create(conn, dto).await?;
    Ok(Tenant::from(tenant))
}

pub async fn update<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    id: i64,
    dto: TenantUpdate,
) -> Result<Tenant, DomainError> {
    let tenant = tenants_adapter::update(conn, id, dto).await?;
    Ok(Tenant::from(tenant))
}

pub async fn set_status<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    id: i64,
    status: TenantStatus,
) -> Result<Tenant, DomainError> {
    update(conn, id, TenantUpdate::status(status)).await
}

pub async fn mark_provisioned<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    id: i64,
    at: OffsetDateTime,
) -> Result<Tenant, DomainError> {
    let tenant = tenants_adapter::set_provisioned_at(conn, id, at).await?;
    Ok(Tenant::from(tenant))
}

/// Removes the registry row only; the physical database is left alone.
pub async fn delete<C: ConnectionTrait + Send + Sync>(conn: &C, id: i64) -> Result<(), DomainError> {
    match tenants_adapter::delete(conn, id).await? {
        0 => Err(DomainError::not_found(
            NotFoundKind::Tenant,
            format!("Tenant {id} not found"),
        )),
        _ => Ok(()),
    }
}

impl From<crate::entities::tenants::Model> for Tenant {
    fn from(model: crate::entities::tenants::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            slug: model.slug,
            db_name: model.db_name,
            db_user: model.db_user,
            db_pass_sealed: model.db_pass,
            status: model.status,
            provisioned_at: model.provisioned_at,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
