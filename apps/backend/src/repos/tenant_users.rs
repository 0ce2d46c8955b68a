//! Users inside one tenant database. Callers pass the tenant connection
//! obtained from a switched `ConnectionBinding`; nothing here reaches the
//! system database.

use sea_orm::ConnectionTrait;
use serde::Serialize;
use time::OffsetDateTime;

use crate::adapters::tenant_users_sea as users_adapter;
use crate::entities::UserRole;
use crate::errors::domain::DomainError;

pub use users_adapter::TenantUserCreate;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TenantUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: UserRole,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

pub async fn find_by_email<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    email: &str,
) -> Result<Option<TenantUser>, DomainError> {
    let user = users_adapter::find_by_email(conn, email).await?;
    Ok(user.map(TenantUser::from))
}

pub async fn find_by_id<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    id: i64,
) -> Result<Option<TenantUser>, DomainError> {
    let user = users_adapter::find_by_id(conn, id).await?;
    Ok(user.map(TenantUser::from))
}

pub async fn create<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    dto: TenantUserCreate,
) -> Result<TenantUser, DomainError> {
    let user = users_adapter::create(conn, dto).await?;
    Ok(TenantUser::from(user))
}

pub async fn ensure_by_email<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    dto: TenantUserCreate,
) -> Result<(TenantUser, bool), DomainError> {
    let (user, inserted) = users_adapter::ensure_by_email(conn, dto).await?;
    Ok((TenantUser::from(user), inserted))
}

pub async fn count<C: ConnectionTrait + Send + Sync>(conn: &C) -> Result<u64, DomainError> {
    Ok(users_adapter::count(conn).await?)
}

impl From<crate::entities::users::Model> for TenantUser {
    fn from(model: crate::entities::users::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            password_hash: model.password,
            role: model.role,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
