//! Signed access tokens: issue, decode, and claim validation.
//!
//! Decoding and claim validation are separate steps: `decode` checks the
//! MAC and structure through `jsonwebtoken` and then `exp` (if present), while
//! `validate_claims` enforces the presence of `sub`/`tenant_id` and re-checks
//! `exp` itself. Both gates run on every request.

use std::collections::BTreeMap;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::state::security_config::SecurityConfig;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,
    #[error("token signature is invalid")]
    SignatureInvalid,
    #[error("token is malformed: {0}")]
    Malformed(String),
    #[error("required claim `{0}` is missing")]
    ClaimMissing(&'static str),
    #[error("failed to encode token: {0}")]
    Encode(String),
}

/// Identifier claim; tokens in the wild carry ids as numbers or numeric strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClaimId {
    Int(i64),
    Str(String),
}

impl ClaimId {
    /// Positive integer value, if the claim holds one.
    pub fn as_id(&self) -> Option<i64> {
        let n = match self {
            ClaimId::Int(n) => *n,
            ClaimId::Str(s) => s.trim().parse::<i64>().ok()?,
        };
        (n > 0).then_some(n)
    }
}

impl From<i64> for ClaimId {
    fn from(n: i64) -> Self {
        ClaimId::Int(n)
    }
}

/// Decoded token payload. Every field is optional at this stage;
/// `TokenCodec::validate_claims` decides what is acceptable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthClaims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<ClaimId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<ClaimId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    /// Any additional caller-supplied claims, carried through untouched.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl AuthClaims {
    /// `sub` as a positive integer, if it is one.
    pub fn user_id(&self) -> Option<i64> {
        self.sub.as_ref().and_then(ClaimId::as_id)
    }

    pub fn tenant_id(&self) -> Option<i64> {
        self.tenant_id.as_ref().and_then(ClaimId::as_id)
    }

    pub fn role(&self) -> Option<&str> {
        self.role.as_deref()
    }
}

/// Claims that passed `validate_claims`; identifiers are guaranteed present.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedClaims {
    user_id: i64,
    tenant_id: i64,
    claims: AuthClaims,
}

impl ValidatedClaims {
    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    pub fn tenant_id(&self) -> i64 {
        self.tenant_id
    }

    pub fn role(&self) -> Option<&str> {
        self.claims.role.as_deref()
    }

    pub fn claims(&self) -> &AuthClaims {
        &self.claims
    }
}

#[derive(Clone)]
pub struct TokenCodec {
    security: SecurityConfig,
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &self.security.algorithm)
            .field("issuer", &self.security.issuer)
            .finish_non_exhaustive()
    }
}

fn unix_seconds(now: SystemTime) -> Result<i64, TokenError> {
    now.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .map_err(|_| TokenError::Encode("system clock before unix epoch".into()))
}

impl TokenCodec {
    pub fn new(security: SecurityConfig) -> Self {
        let encoding = EncodingKey::from_secret(&security.jwt_secret);
        let decoding = DecodingKey::from_secret(&security.jwt_secret);
        Self {
            security,
            encoding,
            decoding,
        }
    }

    pub fn security(&self) -> &SecurityConfig {
        &self.security
    }

    /// Sign `claims`, filling `iat` and `iss` when the caller left them unset.
    /// Caller-supplied claims are not validated here.
    pub fn issue(&self, mut claims: AuthClaims, now: SystemTime) -> Result<String, TokenError> {
        if claims.iat.is_none() {
            claims.iat = Some(unix_seconds(now)?);
        }
        if claims.iss.is_none() {
            claims.iss = Some(self.security.issuer.clone());
        }

        encode(&Header::new(self.security.algorithm), &claims, &self.encoding)
            .map_err(|e| TokenError::Encode(e.to_string()))
    }

    /// Mint the login token: `sub`, `tenant_id`, `role`, and a fixed 4h expiry.
    pub fn issue_access_token(
        &self,
        user_id: i64,
        tenant_id: i64,
        role: Option<&str>,
        now: SystemTime,
    ) -> Result<String, TokenError> {
        let iat = unix_seconds(now)?;
        let claims = AuthClaims {
            sub: Some(ClaimId::Str(user_id.to_string())),
            tenant_id: Some(ClaimId::Int(tenant_id)),
            role: role.map(String::from),
            iat: Some(iat),
            exp: Some(iat + self.security.access_token_ttl.as_secs() as i64),
            ..AuthClaims::default()
        };
        self.issue(claims, now)
    }

    /// Verify the MAC and structure. `exp` is checked only when present, as a
    /// signed value: any `exp` before now (negative included) is `Expired`.
    pub fn decode(&self, token: &str) -> Result<AuthClaims, TokenError> {
        let mut validation = Validation::new(self.security.algorithm);
        validation.required_spec_claims.clear();
        validation.leeway = 0;
        validation.validate_exp = false;
        validation.validate_aud = false;

        let claims = decode::<AuthClaims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidSignature => TokenError::SignatureInvalid,
                _ => TokenError::Malformed(e.to_string()),
            })?;

        if let Some(exp) = claims.exp {
            if exp < unix_seconds(SystemTime::now())? {
                return Err(TokenError::Expired);
            }
        }
        Ok(claims)
    }

    /// Require positive integer `sub` and `tenant_id`; reject `exp < now`.
    pub fn validate_claims(
        &self,
        claims: AuthClaims,
        now: SystemTime,
    ) -> Result<ValidatedClaims, TokenError> {
        let user_id = claims.user_id().ok_or(TokenError::ClaimMissing("sub"))?;
        let tenant_id = claims
            .tenant_id()
            .ok_or(TokenError::ClaimMissing("tenant_id"))?;

        if let Some(exp) = claims.exp {
            if exp < unix_seconds(now)? {
                return Err(TokenError::Expired);
            }
        }

        Ok(ValidatedClaims {
            user_id,
            tenant_id,
            claims,
        })
    }
}
