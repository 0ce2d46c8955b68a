//! Backend test support utilities
//!
//! Shared by the backend's unit and integration tests: logging bootstrap,
//! error envelope assertions, and unique test identifiers.

pub mod error_envelope;
pub mod logging;
pub mod unique_helpers;
