//! Unique test data, so tests sharing a database never collide.

use ulid::Ulid;

fn suffix() -> String {
    Ulid::new().to_string().to_ascii_lowercase()
}

/// `{prefix}-{ulid}`
///
/// ```
/// use backend_test_support::unique_helpers::unique_str;
///
/// let a = unique_str("user");
/// assert_ne!(a, unique_str("user"));
/// assert!(a.starts_with("user-"));
/// ```
pub fn unique_str(prefix: &str) -> String {
    format!("{prefix}-{}", Ulid::new())
}

/// `{prefix}-{ulid}@example.test`
pub fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@example.test", suffix())
}

/// Lowercase slug, valid for the tenant registry.
///
/// ```
/// use backend_test_support::unique_helpers::unique_slug;
///
/// let slug = unique_slug("acme");
/// assert!(slug.starts_with("acme-"));
/// assert!(slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
/// ```
pub fn unique_slug(prefix: &str) -> String {
    format!("{prefix}-{}", suffix())
}

/// Database or user identifier: letters, digits, and underscores only.
pub fn unique_identifier(prefix: &str) -> String {
    format!("{prefix}_{}", suffix())
}
