//! SeaORM adapter for users inside a tenant database.

use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, NotSet, PaginatorTrait,
    QueryFilter, Set,
};
use time::OffsetDateTime;

use crate::entities::{users, UserRole};

#[derive(Debug, Clone)]
pub struct TenantUserCreate {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
}

pub async fn find_by_email<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    email: &str,
) -> Result<Option<users::Model>, sea_orm::DbErr> {
    users::Entity::find()
        .filter(users::Column::Email.eq(email))
        .one(conn)
        .await
}

pub async fn find_by_id<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    id: i64,
) -> Result<Option<users::Model>, sea_orm::DbErr> {
    users::Entity::find_by_id(id).one(conn).await
}

pub async fn create<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    dto: TenantUserCreate,
) -> Result<users::Model, sea_orm::DbErr> {
    let now = OffsetDateTime::now_utc();
    users::ActiveModel {
        id: NotSet,
        name: Set(dto.name),
        email: Set(dto.email),
        password: Set(dto.password_hash),
        role: Set(dto.role),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(conn)
    .await
}

/// Insert unless the email already exists; returns the stored row and
/// whether this call inserted it.
pub async fn ensure_by_email<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    dto: TenantUserCreate,
) -> Result<(users::Model, bool), sea_orm::DbErr> {
    let now = OffsetDateTime::now_utc();
    let email = dto.email.clone();
    let active = users::ActiveModel {
        id: NotSet,
        name: Set(dto.name),
        email: Set(dto.email),
        password: Set(dto.password_hash),
        role: Set(dto.role),
        created_at: Set(now),
        updated_at: Set(now),
    };

    let rows = users::Entity::insert(active)
        .on_conflict(
            OnConflict::column(users::Column::Email)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(conn)
        .await?;

    let user = find_by_email(conn, &email)
        .await?
        .ok_or_else(|| sea_orm::DbErr::RecordNotFound("users.email not found".to_string()))?;

    Ok((user, rows == 1))
}

pub async fn count<C: ConnectionTrait + Send + Sync>(conn: &C) -> Result<u64, sea_orm::DbErr> {
    users::Entity::find().count(conn).await
}
