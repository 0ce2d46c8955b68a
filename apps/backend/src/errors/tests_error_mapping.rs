// Error mapping from component failures to the HTTP boundary, without HTTP or database.
use crate::auth::token::TokenError;
use crate::errors::domain::{ConflictKind, DomainError, InfraErrorKind, NotFoundKind};
use crate::provisioning::{ProvisioningError, ProvisioningStep};
use crate::tenancy::SwitchError;
use crate::validation::FieldErrors;
use crate::{AppError, ErrorCode};

#[test]
fn maps_token_errors_to_401() {
    let cases = [
        (TokenError::Expired, ErrorCode::JwtExpired),
        (TokenError::SignatureInvalid, ErrorCode::JwtSignatureInvalid),
        (TokenError::Malformed("bad".into()), ErrorCode::JwtMalformed),
        (TokenError::ClaimMissing("tenant_id"), ErrorCode::JwtMissingClaim),
    ];
    for (err, code) in cases {
        let app: AppError = err.into();
        assert_eq!(app.code(), code);
        assert_eq!(app.status().as_u16(), 401);
    }
}

#[test]
fn maps_switch_errors() {
    let app: AppError = SwitchError::TenantNotFound(99999).into();
    assert_eq!(app.code(), ErrorCode::TenantNotFound);
    assert_eq!(app.status().as_u16(), 404);

    let app: AppError = SwitchError::TenantSuspended(3).into();
    assert_eq!(app.code(), ErrorCode::TenantSuspended);
    assert_eq!(app.status().as_u16(), 403);

    let app: AppError = SwitchError::DatabaseConnectionFailed {
        tenant_id: 3,
        detail: "refused".into(),
    }
    .into();
    assert_eq!(app.code(), ErrorCode::DatabaseConnectionError);
    assert_eq!(app.status().as_u16(), 500);
}

#[test]
fn provisioning_preserves_connection_failure() {
    let app: AppError = ProvisioningError::DatabaseConnectionFailed {
        tenant_id: 1,
        detail: "refused".into(),
    }
    .into();
    assert_eq!(app.code(), ErrorCode::DatabaseConnectionError);

    let app: AppError = ProvisioningError::Failed {
        tenant_id: 1,
        step: ProvisioningStep::RunSchemaMigration,
        cause: "syntax error".into(),
    }
    .into();
    assert_eq!(app.code(), ErrorCode::ProvisioningError);
    assert_eq!(app.status().as_u16(), 500);
}

#[test]
fn maps_domain_errors() {
    let app: AppError =
        DomainError::conflict(ConflictKind::DuplicateSlug, "slug taken").into();
    assert_eq!(app.code(), ErrorCode::DuplicateSlug);
    assert_eq!(app.status().as_u16(), 422);

    let app: AppError = DomainError::not_found(NotFoundKind::Tenant, "no tenant").into();
    assert_eq!(app.code(), ErrorCode::TenantNotFound);
    assert_eq!(app.status().as_u16(), 404);

    let app: AppError = DomainError::infra(InfraErrorKind::Timeout, "slow").into();
    assert_eq!(app.code(), ErrorCode::DbError);
    assert_eq!(app.status().as_u16(), 500);
}

#[test]
fn envelope_suppresses_diagnostics_unless_exposed() {
    let app = AppError::jwt_invalid("boom: internal detail");

    let hidden = app.to_envelope("req-1".into(), false);
    assert!(!hidden.success);
    assert_eq!(hidden.error, "JWT_INVALID");
    assert_eq!(hidden.status_code, 401);
    assert_eq!(hidden.request_id, "req-1");
    assert!(hidden.details.is_none());
    assert!(!hidden.message.contains("boom"));

    let shown = app.to_envelope("req-1".into(), true);
    assert_eq!(
        shown.details,
        Some(serde_json::Value::String("boom: internal detail".into()))
    );
}

#[test]
fn internal_errors_never_leak_detail_in_message() {
    let app = AppError::internal("secret connection string");
    let env = app.to_envelope("req-2".into(), false);
    assert_eq!(env.message, "Internal server error");
    assert!(env.details.is_none());
}

#[test]
fn validation_details_always_present() {
    let mut errors = FieldErrors::default();
    errors.add("slug", "The slug format is invalid.");
    let app = AppError::validation(errors);

    let env = app.to_envelope("req-3".into(), false);
    assert_eq!(env.status_code, 422);
    assert_eq!(env.error, "VALIDATION_FAILED");
    let details = env.details.expect("field errors");
    assert_eq!(details["slug"][0], "The slug format is invalid.");
}
