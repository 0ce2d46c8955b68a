use std::future::{ready, Ready};

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpMessage, HttpRequest};
use sea_orm::DatabaseConnection;

use crate::auth::token::ValidatedClaims;
use crate::error::AppError;
use crate::repos::tenants::Tenant;

/// Resolved identity for a tenant-scoped request, published by `TenantJwt`.
///
/// `db` is this request's own connection to `tenant`'s database.
#[derive(Debug, Clone)]
pub struct TenantContext {
    pub claims: ValidatedClaims,
    pub tenant: Tenant,
    pub db: DatabaseConnection,
}

impl FromRequest for TenantContext {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        // Missing means the route is not behind `TenantJwt`.
        ready(
            req.extensions()
                .get::<TenantContext>()
                .cloned()
                .ok_or(AppError::JwtMissing),
        )
    }
}
