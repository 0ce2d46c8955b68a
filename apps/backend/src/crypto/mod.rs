pub mod credentials;

pub use credentials::{CredentialError, TenantCredentialCipher};
