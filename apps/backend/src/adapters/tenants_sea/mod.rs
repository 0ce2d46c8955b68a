//! SeaORM adapter for the tenant registry.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, NotSet,
    QueryFilter, QueryOrder, Set,
};
use time::OffsetDateTime;

use crate::entities::{tenants, TenantStatus};

pub mod dto;

pub use dto::{TenantCreate, TenantUpdate};

// Adapter functions return DbErr; the repos layer maps to DomainError.

pub async fn find_by_id<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    id: i64,
) -> Result<Option<tenants::Model>, sea_orm::DbErr> {
    tenants::Entity::find_by_id(id).one(conn).await
}

pub async fn find_by_slug<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    slug: &str,
) -> Result<Option<tenants::Model>, sea_orm::DbErr> {
    tenants::Entity::find()
        .filter(tenants::Column::Slug.eq(slug))
        .one(conn)
        .await
}

pub async fn list<C: ConnectionTrait + Send + Sync>(
    conn: &C,
) -> Result<Vec<tenants::Model>, sea_orm::DbErr> {
    tenants::Entity::find()
        .order_by_asc(tenants::Column::Id)
        .all(conn)
        .await
}

pub async fn create<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    dto: TenantCreate,
) -> Result<tenants::Model, sea_orm::DbErr> {
    let now = OffsetDateTime::now_utc();
    let active = tenants::ActiveModel {
        id: NotSet,
        name: Set(dto.name),
        slug: Set(dto.slug),
        db_name: Set(dto.db_name),
        db_user: Set(dto.db_user),
        db_pass: Set(dto.db_pass_sealed),
        status: Set(TenantStatus::Active),
        provisioned_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    };

    active.insert(conn).await
}

pub async fn update<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    id: i64,
    dto: TenantUpdate,
) -> Result<tenants::Model, sea_orm::DbErr> {
    let existing = tenants::Entity::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| sea_orm::DbErr::RecordNotFound(format!("TENANT_NOT_FOUND:{id}")))?;

    let mut active = existing.into_active_model();
    if let Some(name) = dto.name {
        active.name = Set(name);
    }
    if let Some(slug) = dto.slug {
        active.slug = Set(slug);
    }
    if let Some(db_name) = dto.db_name {
        active.db_name = Set(db_name);
    }
    if let Some(db_user) = dto.db_user {
        active.db_user = Set(db_user);
    }
    if let Some(sealed) = dto.db_pass_sealed {
        active.db_pass = Set(sealed);
    }
    if let Some(status) = dto.status {
        active.status = Set(status);
    }
    active.updated_at = Set(OffsetDateTime::now_utc());

    active.update(conn).await
}

pub async fn set_provisioned_at<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    id: i64,
    at: OffsetDateTime,
) -> Result<tenants::Model, sea_orm::DbErr> {
    let active = tenants::ActiveModel {
        id: Set(id),
        provisioned_at: Set(Some(at)),
        updated_at: Set(at),
        ..Default::default()
    };
    active.update(conn).await
}

pub async fn delete<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    id: i64,
) -> Result<u64, sea_orm::DbErr> {
    let result = tenants::Entity::delete_by_id(id).exec(conn).await?;
    Ok(result.rows_affected)
}
