//! DTOs for tenants_sea adapter.

use crate::entities::TenantStatus;

/// New registry row. `db_pass_sealed` is already encrypted.
#[derive(Debug, Clone)]
pub struct TenantCreate {
    pub name: String,
    pub slug: String,
    pub db_name: String,
    pub db_user: String,
    pub db_pass_sealed: String,
}

/// Partial update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct TenantUpdate {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub db_name: Option<String>,
    pub db_user: Option<String>,
    pub db_pass_sealed: Option<String>,
    pub status: Option<TenantStatus>,
}

impl TenantUpdate {
    pub fn status(status: TenantStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}
