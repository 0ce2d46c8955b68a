use actix_web::error::ResponseError;
use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::auth::token::TokenError;
use crate::errors::domain::{ConflictKind, DomainError, InfraErrorKind, NotFoundKind};
use crate::errors::ErrorCode;
use crate::infra::db_errors::map_db_err;
use crate::provisioning::ProvisioningError;
use crate::tenancy::SwitchError;
use crate::trace_ctx;
use crate::validation::FieldErrors;

/// Uniform JSON error envelope returned for every failed request.
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub success: bool,
    pub message: String,
    pub error: String,
    pub status_code: u16,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    pub request_id: String,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("JWT token missing")]
    JwtMissing,
    #[error("JWT token malformed")]
    JwtMalformed { diagnostic: String },
    #[error("JWT token invalid")]
    JwtInvalid { diagnostic: Option<String> },
    #[error("JWT token expired")]
    JwtExpired,
    #[error("JWT signature invalid")]
    JwtSignatureInvalid,
    #[error("JWT claim missing: {claim}")]
    JwtMissingClaim { claim: &'static str },
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Tenant not found: {tenant_id}")]
    TenantNotFound { tenant_id: i64 },
    #[error("Tenant suspended: {tenant_id}")]
    TenantSuspended { tenant_id: i64 },
    #[error("Database connection failed: {detail}")]
    DatabaseConnection { detail: String },
    #[error("Provisioning failed: {detail}")]
    Provisioning { detail: String },
    #[error("Validation failed")]
    Validation { errors: FieldErrors },
    #[error("Unprocessable: {detail}")]
    Unprocessable { code: ErrorCode, detail: String },
    #[error("Bad request: {detail}")]
    BadRequest { code: ErrorCode, detail: String },
    #[error("Not found: {detail}")]
    NotFound { code: ErrorCode, detail: String },
    #[error("Database error: {detail}")]
    Db { detail: String },
    #[error("Configuration error: {detail}")]
    Config { detail: String },
    #[error("Internal error: {detail}")]
    Internal { detail: String },
}

impl AppError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::JwtMissing => ErrorCode::JwtMissing,
            AppError::JwtMalformed { .. } => ErrorCode::JwtMalformed,
            AppError::JwtInvalid { .. } => ErrorCode::JwtInvalid,
            AppError::JwtExpired => ErrorCode::JwtExpired,
            AppError::JwtSignatureInvalid => ErrorCode::JwtSignatureInvalid,
            AppError::JwtMissingClaim { .. } => ErrorCode::JwtMissingClaim,
            AppError::InvalidCredentials => ErrorCode::InvalidCredentials,
            AppError::TenantNotFound { .. } => ErrorCode::TenantNotFound,
            AppError::TenantSuspended { .. } => ErrorCode::TenantSuspended,
            AppError::DatabaseConnection { .. } => ErrorCode::DatabaseConnectionError,
            AppError::Provisioning { .. } => ErrorCode::ProvisioningError,
            AppError::Validation { .. } => ErrorCode::ValidationFailed,
            AppError::Unprocessable { code, .. } => *code,
            AppError::BadRequest { code, .. } => *code,
            AppError::NotFound { code, .. } => *code,
            AppError::Db { .. } => ErrorCode::DbError,
            AppError::Config { .. } => ErrorCode::ConfigError,
            AppError::Internal { .. } => ErrorCode::Internal,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::JwtMissing
            | AppError::JwtMalformed { .. }
            | AppError::JwtInvalid { .. }
            | AppError::JwtExpired
            | AppError::JwtSignatureInvalid
            | AppError::JwtMissingClaim { .. }
            | AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::TenantNotFound { .. } | AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::TenantSuspended { .. } => StatusCode::FORBIDDEN,
            AppError::Validation { .. } | AppError::Unprocessable { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::DatabaseConnection { .. }
            | AppError::Provisioning { .. }
            | AppError::Db { .. }
            | AppError::Config { .. }
            | AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message. Never includes driver or decode internals.
    pub fn message(&self) -> String {
        match self {
            AppError::JwtMissing => "Authentication token not provided".to_string(),
            AppError::JwtMalformed { .. } => "Authentication token is malformed".to_string(),
            AppError::JwtInvalid { .. } => "Authentication token is invalid".to_string(),
            AppError::JwtExpired => "Authentication token has expired".to_string(),
            AppError::JwtSignatureInvalid => {
                "Authentication token signature is invalid".to_string()
            }
            AppError::JwtMissingClaim { claim } => {
                format!("Authentication token is missing required claim: {claim}")
            }
            AppError::InvalidCredentials => "Invalid credentials".to_string(),
            AppError::TenantNotFound { .. } => "Tenant not found".to_string(),
            AppError::TenantSuspended { .. } => "Tenant account is suspended".to_string(),
            AppError::DatabaseConnection { .. } => {
                "Failed to connect to tenant database".to_string()
            }
            AppError::Provisioning { .. } => "Tenant provisioning failed".to_string(),
            AppError::Validation { .. } => "The given data was invalid".to_string(),
            AppError::Unprocessable { detail, .. }
            | AppError::BadRequest { detail, .. }
            | AppError::NotFound { detail, .. } => detail.clone(),
            AppError::Db { .. } | AppError::Config { .. } | AppError::Internal { .. } => {
                "Internal server error".to_string()
            }
        }
    }

    /// Diagnostic text kept out of production responses.
    pub fn diagnostic(&self) -> Option<String> {
        match self {
            AppError::JwtMalformed { diagnostic } => Some(diagnostic.clone()),
            AppError::JwtInvalid { diagnostic } => diagnostic.clone(),
            AppError::TenantNotFound { tenant_id } | AppError::TenantSuspended { tenant_id } => {
                Some(format!("tenant_id={tenant_id}"))
            }
            AppError::DatabaseConnection { detail }
            | AppError::Provisioning { detail }
            | AppError::Db { detail }
            | AppError::Config { detail }
            | AppError::Internal { detail } => Some(detail.clone()),
            _ => None,
        }
    }

    /// Envelope `details`: field errors always, diagnostics only when exposed.
    pub fn details(&self, expose: bool) -> Option<Value> {
        if let AppError::Validation { errors } = self {
            return serde_json::to_value(errors).ok();
        }
        if expose {
            self.diagnostic().map(Value::String)
        } else {
            None
        }
    }

    pub fn to_envelope(&self, request_id: String, expose: bool) -> ErrorEnvelope {
        let timestamp = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_else(|_| OffsetDateTime::now_utc().unix_timestamp().to_string());
        ErrorEnvelope {
            success: false,
            message: self.message(),
            error: self.code().as_str().to_string(),
            status_code: self.status().as_u16(),
            timestamp,
            details: self.details(expose),
            request_id,
        }
    }

    pub fn jwt_invalid(diagnostic: impl Into<String>) -> Self {
        Self::JwtInvalid {
            diagnostic: Some(diagnostic.into()),
        }
    }

    pub fn validation(errors: FieldErrors) -> Self {
        Self::Validation { errors }
    }

    pub fn bad_request(code: ErrorCode, detail: impl Into<String>) -> Self {
        Self::BadRequest {
            code,
            detail: detail.into(),
        }
    }

    pub fn not_found(code: ErrorCode, detail: impl Into<String>) -> Self {
        Self::NotFound {
            code,
            detail: detail.into(),
        }
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self::Internal {
            detail: detail.into(),
        }
    }

    pub fn config(detail: impl Into<String>) -> Self {
        Self::Config {
            detail: detail.into(),
        }
    }

    pub fn db(detail: impl Into<String>) -> Self {
        Self::Db {
            detail: detail.into(),
        }
    }
}

impl From<TokenError> for AppError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Expired => AppError::JwtExpired,
            TokenError::SignatureInvalid => AppError::JwtSignatureInvalid,
            TokenError::Malformed(diagnostic) => AppError::JwtMalformed { diagnostic },
            TokenError::ClaimMissing(claim) => AppError::JwtMissingClaim { claim },
            TokenError::Encode(detail) => AppError::Internal { detail },
        }
    }
}

impl From<SwitchError> for AppError {
    fn from(e: SwitchError) -> Self {
        match e {
            SwitchError::TenantNotFound(tenant_id) => AppError::TenantNotFound { tenant_id },
            SwitchError::TenantSuspended(tenant_id) => AppError::TenantSuspended { tenant_id },
            err @ SwitchError::DatabaseConnectionFailed { .. } => AppError::DatabaseConnection {
                detail: err.to_string(),
            },
            SwitchError::Directory(de) => de.into(),
        }
    }
}

impl From<ProvisioningError> for AppError {
    fn from(e: ProvisioningError) -> Self {
        match e {
            err @ ProvisioningError::DatabaseConnectionFailed { .. } => {
                AppError::DatabaseConnection {
                    detail: err.to_string(),
                }
            }
            err => AppError::Provisioning {
                detail: err.to_string(),
            },
        }
    }
}

impl From<DomainError> for AppError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::Validation(detail) => AppError::bad_request(ErrorCode::BadRequest, detail),
            DomainError::Conflict(ConflictKind::DuplicateSlug, detail) => AppError::Unprocessable {
                code: ErrorCode::DuplicateSlug,
                detail,
            },
            DomainError::Conflict(_, detail) => AppError::Unprocessable {
                code: ErrorCode::ValidationFailed,
                detail,
            },
            DomainError::NotFound(NotFoundKind::Tenant, detail) => {
                AppError::not_found(ErrorCode::TenantNotFound, detail)
            }
            DomainError::NotFound(_, detail) => AppError::not_found(ErrorCode::NotFound, detail),
            DomainError::Infra(InfraErrorKind::DbUnavailable, detail) => {
                AppError::DatabaseConnection { detail }
            }
            DomainError::Infra(_, detail) => AppError::Db { detail },
        }
    }
}

impl From<sea_orm::DbErr> for AppError {
    fn from(e: sea_orm::DbErr) -> Self {
        map_db_err(e).into()
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        self.status()
    }

    fn error_response(&self) -> HttpResponse {
        let request_id = trace_ctx::trace_id();
        let envelope = self.to_envelope(request_id.clone(), trace_ctx::expose_details());

        HttpResponse::build(self.status())
            .content_type("application/json")
            .insert_header(("x-request-id", request_id))
            .json(envelope)
    }
}
