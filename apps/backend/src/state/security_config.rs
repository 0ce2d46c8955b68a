use std::time::Duration;

use jsonwebtoken::Algorithm;

/// Access tokens live for four hours; `expires_in` on login reports the same.
pub const ACCESS_TOKEN_TTL: Duration = Duration::from_secs(4 * 60 * 60);

/// Token signing settings shared by issue and verify paths.
#[derive(Debug, Clone)]
pub struct SecurityConfig {
    pub jwt_secret: Vec<u8>,
    /// Pinned to HS256; tokens signed with anything else are rejected.
    pub algorithm: Algorithm,
    /// Value stamped into `iss`.
    pub issuer: String,
    pub access_token_ttl: Duration,
}

impl SecurityConfig {
    pub fn new(jwt_secret: impl Into<Vec<u8>>, issuer: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            algorithm: Algorithm::HS256,
            issuer: issuer.into(),
            access_token_ttl: ACCESS_TOKEN_TTL,
        }
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self::new(b"default_secret_for_tests_only".to_vec(), "http://localhost:8000")
    }
}
