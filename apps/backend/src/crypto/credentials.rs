//! Encryption at rest for tenant database passwords.
//!
//! AES-256-GCM with an HKDF-SHA256 key derived per tenant slug from the
//! process master key. Stored form is base64(`nonce || ciphertext || tag`).

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use hkdf::Hkdf;
use rand::RngCore;
use sha2::Sha256;
use thiserror::Error;

const KEY_LENGTH: usize = 32;
const NONCE_LENGTH: usize = 12;
const TAG_LENGTH: usize = 16;
const HKDF_INFO: &[u8] = b"tenancy-db-credentials-v1";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CredentialError {
    #[error("credential encryption failed: {0}")]
    Encrypt(String),
    #[error("credential decryption failed: {0}")]
    Decrypt(String),
}

#[derive(Clone)]
pub struct TenantCredentialCipher {
    master_key: [u8; KEY_LENGTH],
}

impl std::fmt::Debug for TenantCredentialCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TenantCredentialCipher").finish_non_exhaustive()
    }
}

impl TenantCredentialCipher {
    pub fn new(master_key: [u8; KEY_LENGTH]) -> Self {
        Self { master_key }
    }

    fn cipher_for(&self, slug: &str) -> Result<Aes256Gcm, String> {
        let hkdf = Hkdf::<Sha256>::new(Some(slug.as_bytes()), &self.master_key);
        let mut key = [0u8; KEY_LENGTH];
        hkdf.expand(HKDF_INFO, &mut key)
            .map_err(|e| format!("key derivation: {e}"))?;
        Aes256Gcm::new_from_slice(&key).map_err(|e| format!("cipher init: {e}"))
    }

    pub fn encrypt(&self, slug: &str, plaintext: &str) -> Result<String, CredentialError> {
        let cipher = self.cipher_for(slug).map_err(CredentialError::Encrypt)?;

        let mut nonce_bytes = [0u8; NONCE_LENGTH];
        rand::rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|e| CredentialError::Encrypt(e.to_string()))?;

        let mut out = Vec::with_capacity(NONCE_LENGTH + ciphertext.len());
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&ciphertext);
        Ok(STANDARD.encode(out))
    }

    pub fn decrypt(&self, slug: &str, stored: &str) -> Result<String, CredentialError> {
        let raw = STANDARD
            .decode(stored)
            .map_err(|e| CredentialError::Decrypt(format!("not base64: {e}")))?;
        if raw.len() < NONCE_LENGTH + TAG_LENGTH {
            return Err(CredentialError::Decrypt("ciphertext too short".into()));
        }

        let cipher = self.cipher_for(slug).map_err(CredentialError::Decrypt)?;
        let (nonce_bytes, encrypted) = raw.split_at(NONCE_LENGTH);
        let plaintext = cipher
            .decrypt(Nonce::from_slice(nonce_bytes), encrypted)
            .map_err(|e| CredentialError::Decrypt(e.to_string()))?;

        String::from_utf8(plaintext)
            .map_err(|e| CredentialError::Decrypt(format!("not utf-8: {e}")))
    }

    /// Re-encrypt under a new slug (slug renames change the derived key).
    pub fn reseal(&self, old_slug: &str, new_slug: &str, stored: &str) -> Result<String, CredentialError> {
        let plaintext = self.decrypt(old_slug, stored)?;
        self.encrypt(new_slug, &plaintext)
    }
}
