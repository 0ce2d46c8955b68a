//! Repository-level error type shared by the registry and tenant-user repos.
//!
//! Knows nothing about HTTP; `From<DomainError> for AppError` picks the
//! status and code.

use thiserror::Error;

/// Operational failures of the backing store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InfraErrorKind {
    Timeout,
    DbUnavailable,
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotFoundKind {
    Tenant,
    Record,
}

/// Which unique rule a write collided with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictKind {
    DuplicateSlug,
    UniqueEmail,
    Unclassified,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomainError {
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("{0:?} conflict: {1}")]
    Conflict(ConflictKind, String),
    #[error("{0:?} not found: {1}")]
    NotFound(NotFoundKind, String),
    #[error("storage failure ({0:?}): {1}")]
    Infra(InfraErrorKind, String),
}

impl DomainError {
    pub fn validation(detail: impl Into<String>) -> Self {
        Self::Validation(detail.into())
    }

    pub fn conflict(kind: ConflictKind, detail: impl Into<String>) -> Self {
        Self::Conflict(kind, detail.into())
    }

    pub fn not_found(kind: NotFoundKind, detail: impl Into<String>) -> Self {
        Self::NotFound(kind, detail.into())
    }

    pub fn infra(kind: InfraErrorKind, detail: impl Into<String>) -> Self {
        Self::Infra(kind, detail.into())
    }
}
