//! Error codes for the tenancy backend API.
//!
//! Add new codes here; never pass ad-hoc strings as error codes.
//! All codes are SCREAMING_SNAKE_CASE and map 1:1 to the `error` field
//! of the JSON error envelope.

use core::fmt;

/// Centralized error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Token / authentication
    /// No bearer token on the request
    JwtMissing,
    /// Token could not be parsed
    JwtMalformed,
    /// Token rejected for an unenumerated reason
    JwtInvalid,
    /// Token `exp` is in the past
    JwtExpired,
    /// MAC did not verify
    JwtSignatureInvalid,
    /// `sub` or `tenant_id` absent
    JwtMissingClaim,
    /// Email/password did not match a tenant user
    InvalidCredentials,

    // Tenancy
    TenantNotFound,
    TenantSuspended,
    DatabaseConnectionError,
    ProvisioningError,

    // Request validation
    ValidationFailed,
    DuplicateSlug,
    BadRequest,

    // Generic
    NotFound,
    DbError,
    ConfigError,
    Internal,
}

impl ErrorCode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::JwtMissing => "JWT_MISSING",
            Self::JwtMalformed => "JWT_MALFORMED",
            Self::JwtInvalid => "JWT_INVALID",
            Self::JwtExpired => "JWT_EXPIRED",
            Self::JwtSignatureInvalid => "JWT_SIGNATURE_INVALID",
            Self::JwtMissingClaim => "JWT_MISSING_CLAIM",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",

            Self::TenantNotFound => "TENANT_NOT_FOUND",
            Self::TenantSuspended => "TENANT_SUSPENDED",
            Self::DatabaseConnectionError => "DATABASE_CONNECTION_ERROR",
            Self::ProvisioningError => "PROVISIONING_ERROR",

            Self::ValidationFailed => "VALIDATION_FAILED",
            Self::DuplicateSlug => "DUPLICATE_SLUG",
            Self::BadRequest => "BAD_REQUEST",

            Self::NotFound => "NOT_FOUND",
            Self::DbError => "DB_ERROR",
            Self::ConfigError => "CONFIG_ERROR",
            Self::Internal => "INTERNAL",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_codes() {
        assert_eq!(ErrorCode::JwtMissing.as_str(), "JWT_MISSING");
        assert_eq!(ErrorCode::JwtMalformed.as_str(), "JWT_MALFORMED");
        assert_eq!(ErrorCode::JwtInvalid.as_str(), "JWT_INVALID");
        assert_eq!(ErrorCode::JwtExpired.as_str(), "JWT_EXPIRED");
        assert_eq!(
            ErrorCode::JwtSignatureInvalid.as_str(),
            "JWT_SIGNATURE_INVALID"
        );
        assert_eq!(ErrorCode::JwtMissingClaim.as_str(), "JWT_MISSING_CLAIM");
    }

    #[test]
    fn test_tenancy_codes() {
        assert_eq!(ErrorCode::TenantNotFound.as_str(), "TENANT_NOT_FOUND");
        assert_eq!(ErrorCode::TenantSuspended.as_str(), "TENANT_SUSPENDED");
        assert_eq!(
            ErrorCode::DatabaseConnectionError.as_str(),
            "DATABASE_CONNECTION_ERROR"
        );
        assert_eq!(ErrorCode::ProvisioningError.as_str(), "PROVISIONING_ERROR");
        assert_eq!(ErrorCode::DuplicateSlug.as_str(), "DUPLICATE_SLUG");
    }

    #[test]
    fn test_display_matches_as_str() {
        assert_eq!(ErrorCode::ValidationFailed.to_string(), "VALIDATION_FAILED");
        assert_eq!(format!("{}", ErrorCode::Internal), "INTERNAL");
    }
}
