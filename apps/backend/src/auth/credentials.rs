//! Email/password lookup inside an already-switched tenant database.

use sea_orm::ConnectionTrait;

use super::password::verify_password;
use crate::error::AppError;
use crate::repos::tenant_users::{self, TenantUser};

/// The user for `email` when `password` matches; `None` on any mismatch.
/// Unknown email and wrong password are indistinguishable to the caller.
pub async fn lookup_by_credentials<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    email: &str,
    password: &str,
) -> Result<Option<TenantUser>, AppError> {
    let Some(user) = tenant_users::find_by_email(conn, email).await? else {
        return Ok(None);
    };
    Ok(verify_password(password, &user.password_hash).then_some(user))
}
