//! Per-request authentication: bearer token -> validated claims -> switched
//! tenant connection.

use std::time::SystemTime;

use actix_web::http::header::HeaderValue;
use tracing::debug;

use crate::error::AppError;
use crate::extractors::tenant_context::TenantContext;
use crate::logging::security;
use crate::state::app_state::AppState;
use crate::tenancy::{ConnectionBinding, SwitchError};

/// `Bearer <token>` from an Authorization header. Any other shape counts as
/// no token at all.
pub fn bearer_token(header: Option<&HeaderValue>) -> Option<&str> {
    let value = header?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() && !token.contains(' '))
        .then_some(token)
}

/// Run the guard: extract, decode, validate, resolve tenant, switch.
///
/// Every call builds a fresh `ConnectionBinding`; the resulting connection is
/// owned by the returned context and by nothing else.
pub async fn authenticate(
    state: &AppState,
    header: Option<&HeaderValue>,
) -> Result<TenantContext, AppError> {
    let result = run(state, header).await;
    if let Err(e) = &result {
        match e {
            AppError::TenantNotFound { tenant_id } => {
                security::tenant_access_denied(*tenant_id, "not_found")
            }
            AppError::TenantSuspended { tenant_id } => {
                security::tenant_access_denied(*tenant_id, "suspended")
            }
            AppError::DatabaseConnection { .. } => {}
            other => security::token_rejected(other.code().as_str()),
        }
    }
    result
}

async fn run(state: &AppState, header: Option<&HeaderValue>) -> Result<TenantContext, AppError> {
    let token = bearer_token(header).ok_or(AppError::JwtMissing)?;

    let now = SystemTime::now();
    let claims = state.codec.decode(token)?;
    let claims = state.codec.validate_claims(claims, now)?;

    let mut binding = ConnectionBinding::new();
    let tenant = state
        .switchboard
        .switch(&mut binding, claims.tenant_id())
        .await
        .map_err(|e| match e {
            SwitchError::Directory(inner) => AppError::jwt_invalid(inner.to_string()),
            other => AppError::from(other),
        })?;

    let db = binding
        .into_connection()
        .ok_or_else(|| AppError::jwt_invalid("tenant binding empty after switch"))?;

    debug!(
        user_id = claims.user_id(),
        tenant_id = tenant.id,
        "Request authenticated"
    );
    Ok(TenantContext { claims, tenant, db })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_token_shapes() {
        let ok = HeaderValue::from_static("Bearer abc.def.ghi");
        assert_eq!(bearer_token(Some(&ok)), Some("abc.def.ghi"));

        let lower = HeaderValue::from_static("bearer abc");
        assert_eq!(bearer_token(Some(&lower)), Some("abc"));

        for raw in ["Basic abc", "Bearer", "Bearer ", "Bearer a b", "abc"] {
            let value = HeaderValue::from_static(raw);
            assert_eq!(bearer_token(Some(&value)), None, "{raw}");
        }
        assert_eq!(bearer_token(None), None);
    }
}
