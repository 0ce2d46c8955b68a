//! `/tenant`: credential login and the authenticated identity endpoints.

use std::time::SystemTime;

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::json;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::auth::credentials::lookup_by_credentials;
use crate::error::AppError;
use crate::errors::ErrorCode;
use crate::extractors::{TenantContext, ValidatedJson};
use crate::logging::security;
use crate::middleware::TenantJwt;
use crate::repos::tenant_users::{self, TenantUser};
use crate::state::app_state::AppState;
use crate::tenancy::ConnectionBinding;
use crate::validation::{is_email, FieldErrors, Validate};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub tenant_id: Option<i64>,
    pub email: Option<String>,
    pub password: Option<String>,
}

impl Validate for LoginRequest {
    fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::default();
        match self.tenant_id {
            None => errors.add("tenant_id", "The tenant id field is required."),
            Some(id) if id < 1 => errors.add("tenant_id", "The tenant id must be a positive integer."),
            Some(_) => {}
        }
        match self.email.as_deref().map(str::trim) {
            None | Some("") => errors.add("email", "The email field is required."),
            Some(email) if !is_email(email) => {
                errors.add("email", "The email must be a valid email address.")
            }
            Some(_) => {}
        }
        if self.password.as_deref().unwrap_or("").is_empty() {
            errors.add("password", "The password field is required.");
        }
        errors
    }
}

#[derive(Debug, Serialize)]
struct LoginResponse {
    success: bool,
    access_token: String,
    token_type: &'static str,
    expires_in: u64,
    user: TenantUser,
    timestamp: String,
}

async fn login(
    state: web::Data<AppState>,
    body: ValidatedJson<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    let req = body.into_inner();
    let tenant_id = req.tenant_id.unwrap_or_default();
    let email = req.email.as_deref().unwrap_or_default().trim();
    let password = req.password.as_deref().unwrap_or_default();

    // Login has no token yet, so it switches its own binding.
    let mut binding = ConnectionBinding::new();
    if let Err(e) = state.switchboard.switch(&mut binding, tenant_id).await {
        let err = AppError::from(e);
        if matches!(err, AppError::TenantNotFound { .. } | AppError::TenantSuspended { .. }) {
            security::tenant_access_denied(tenant_id, err.code().as_str());
        }
        return Err(err);
    }
    let conn = binding
        .connection()
        .ok_or_else(|| AppError::internal("tenant binding empty after switch"))?;

    let user = lookup_by_credentials(conn, email, password).await;
    binding.clear().await;
    let Some(user) = user? else {
        security::login_failed(tenant_id, email);
        return Err(AppError::InvalidCredentials);
    };

    let token = state.codec.issue_access_token(
        user.id,
        tenant_id,
        Some(user.role.as_str()),
        SystemTime::now(),
    )?;

    Ok(HttpResponse::Ok().json(LoginResponse {
        success: true,
        access_token: token,
        token_type: "bearer",
        expires_in: state.security().access_token_ttl.as_secs(),
        user,
        timestamp: OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_default(),
    }))
}

async fn me(ctx: TenantContext) -> Result<HttpResponse, AppError> {
    let user = tenant_users::find_by_id(&ctx.db, ctx.claims.user_id())
        .await?
        .ok_or_else(|| AppError::not_found(ErrorCode::NotFound, "User not found"))?;

    Ok(HttpResponse::Ok().json(json!({
        "user": user,
        "tenant": {
            "id": ctx.tenant.id,
            "name": ctx.tenant.name,
            "slug": ctx.tenant.slug,
        },
    })))
}

/// Tokens are stateless; there is nothing to revoke.
async fn logout(_ctx: TenantContext) -> HttpResponse {
    HttpResponse::Ok().json(json!({ "message": "Successfully logged out" }))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/login", web::post().to(login))
        .service(
            web::resource("/me")
                .wrap(TenantJwt)
                .route(web::get().to(me)),
        )
        .service(
            web::resource("/logout")
                .wrap(TenantJwt)
                .route(web::post().to(logout)),
        );
}
