use tracing::warn;

use crate::logging::pii::Redacted;
use crate::trace_ctx;

/// Credential login rejected (unknown email and bad password are not distinguished).
pub fn login_failed(tenant_id: i64, email: &str) {
    let trace_id = trace_ctx::trace_id();

    warn!(
        event = "SECURITY_LOGIN_FAILED",
        %trace_id,
        tenant_id,
        email = %Redacted(email),
        "Authentication failure"
    );
}

/// Bearer token rejected by the guard.
pub fn token_rejected(code: &str) {
    let trace_id = trace_ctx::trace_id();

    warn!(
        event = "SECURITY_TOKEN_REJECTED",
        %trace_id,
        code,
        "Bearer token rejected"
    );
}

/// Request for a tenant that exists but may not be served.
pub fn tenant_access_denied(tenant_id: i64, reason: &str) {
    let trace_id = trace_ctx::trace_id();

    warn!(
        event = "SECURITY_TENANT_DENIED",
        %trace_id,
        tenant_id,
        reason,
        "Tenant access denied"
    );
}
