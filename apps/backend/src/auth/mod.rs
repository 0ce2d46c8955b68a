pub mod credentials;
pub mod guard;
pub mod password;
pub mod token;

pub use guard::authenticate;
pub use token::{AuthClaims, TokenCodec, TokenError, ValidatedClaims};

#[cfg(test)]
mod tests_props_claims;
