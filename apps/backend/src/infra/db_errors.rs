//! SeaORM -> DomainError translation.
//!
//! Adapters return `DbErr`; repos convert here, and handlers map
//! `DomainError` to `AppError` through `From`.

use tracing::{error, warn};

use crate::errors::domain::{ConflictKind, DomainError, InfraErrorKind, NotFoundKind};
use crate::logging::pii::Redacted;
use crate::trace_ctx;

fn mentions_sqlstate(msg: &str, code: &str) -> bool {
    msg.contains(code) || msg.contains(&format!("SQLSTATE({code})"))
}

/// `table.column` from SQLite's "UNIQUE constraint failed: table.column".
fn sqlite_unique_target(error_msg: &str) -> Option<&str> {
    const MARKER: &str = "UNIQUE constraint failed: ";
    let start = error_msg.find(MARKER)? + MARKER.len();
    error_msg[start..].split_whitespace().next()
}

/// Constraint or column that identifies which unique rule was violated.
fn unique_conflict(error_msg: &str) -> Option<(ConflictKind, &'static str)> {
    let target = sqlite_unique_target(error_msg).unwrap_or(error_msg);
    if target.contains("tenants.slug") || error_msg.contains("idx_tenants_slug_unique") {
        return Some((ConflictKind::DuplicateSlug, "The slug has already been taken."));
    }
    if target.contains("users.email") || error_msg.contains("idx_users_email_unique") {
        return Some((ConflictKind::UniqueEmail, "The email has already been taken."));
    }
    None
}

/// Translate a `DbErr` into a `DomainError` with sanitized, PII-safe detail.
pub fn map_db_err(e: sea_orm::DbErr) -> DomainError {
    let error_msg = e.to_string();
    let trace_id = trace_ctx::trace_id();

    match &e {
        sea_orm::DbErr::RecordNotFound(msg) if msg.starts_with("TENANT_NOT_FOUND:") => {
            let id = msg.trim_start_matches("TENANT_NOT_FOUND:");
            return DomainError::not_found(NotFoundKind::Tenant, format!("Tenant {id} not found"));
        }
        sea_orm::DbErr::RecordNotFound(_) | sea_orm::DbErr::RecordNotUpdated => {
            return DomainError::not_found(NotFoundKind::Record, "Record not found");
        }
        sea_orm::DbErr::ConnectionAcquire(_) | sea_orm::DbErr::Conn(_) => {
            warn!(trace_id = %trace_id, raw_error = %Redacted(&error_msg), "Database unavailable");
            return DomainError::infra(InfraErrorKind::DbUnavailable, "Database unavailable");
        }
        _ => {}
    }

    if mentions_sqlstate(&error_msg, "23505")
        || error_msg.contains("duplicate key value violates unique constraint")
        || error_msg.contains("UNIQUE constraint failed")
    {
        warn!(trace_id = %trace_id, raw_error = %Redacted(&error_msg), "Unique constraint violation");
        if let Some((kind, detail)) = unique_conflict(&error_msg) {
            return DomainError::conflict(kind, detail);
        }
        return DomainError::conflict(
            ConflictKind::Unclassified,
            "Unique constraint violation",
        );
    }

    if mentions_sqlstate(&error_msg, "23503") || error_msg.contains("FOREIGN KEY constraint failed")
    {
        warn!(trace_id = %trace_id, raw_error = %Redacted(&error_msg), "Foreign key constraint violation");
        return DomainError::validation("Foreign key constraint violation");
    }

    if error_msg.contains("timeout") || error_msg.contains("pool timed out") {
        warn!(trace_id = %trace_id, raw_error = %Redacted(&error_msg), "Database timeout");
        return DomainError::infra(InfraErrorKind::Timeout, "Database timeout");
    }

    error!(trace_id = %trace_id, raw_error = %Redacted(&error_msg), "Unhandled database error");
    DomainError::infra(
        InfraErrorKind::Other("DbErr".into()),
        "Database operation failed",
    )
}

impl From<sea_orm::DbErr> for DomainError {
    fn from(e: sea_orm::DbErr) -> Self {
        map_db_err(e)
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::{DbErr, RuntimeErr};

    use super::*;

    fn exec_err(msg: &str) -> DbErr {
        DbErr::Exec(RuntimeErr::Internal(msg.to_string()))
    }

    #[test]
    fn sqlite_duplicate_slug() {
        let err = map_db_err(exec_err(
            "error returned from database: (code: 2067) UNIQUE constraint failed: tenants.slug",
        ));
        assert!(matches!(err, DomainError::Conflict(ConflictKind::DuplicateSlug, _)));
    }

    #[test]
    fn postgres_duplicate_slug() {
        let err = map_db_err(exec_err(
            "duplicate key value violates unique constraint \"idx_tenants_slug_unique\"",
        ));
        assert!(matches!(err, DomainError::Conflict(ConflictKind::DuplicateSlug, _)));
    }

    #[test]
    fn duplicate_email() {
        let err = map_db_err(exec_err("UNIQUE constraint failed: users.email"));
        assert!(matches!(err, DomainError::Conflict(ConflictKind::UniqueEmail, _)));
    }

    #[test]
    fn tenant_not_found_marker() {
        let err = map_db_err(DbErr::RecordNotFound("TENANT_NOT_FOUND:42".into()));
        assert_eq!(
            err,
            DomainError::not_found(NotFoundKind::Tenant, "Tenant 42 not found")
        );
    }

    #[test]
    fn plain_missing_record_and_unnamed_unique() {
        let err = map_db_err(DbErr::RecordNotFound("contacts".into()));
        assert!(matches!(err, DomainError::NotFound(NotFoundKind::Record, _)));

        let err = map_db_err(exec_err("UNIQUE constraint failed: deals.title"));
        assert!(matches!(err, DomainError::Conflict(ConflictKind::Unclassified, _)));
    }

    #[test]
    fn unknown_errors_are_infra() {
        let err = map_db_err(exec_err("something odd"));
        assert!(matches!(err, DomainError::Infra(InfraErrorKind::Other(_), _)));
    }
}
