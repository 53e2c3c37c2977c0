//! SMTP password resolution. Browsers may send the password encrypted with the
//! server's public key; it is decrypted once, when a send is requested, and
//! only the plaintext ever reaches a send session.

use base64::{engine::general_purpose::STANDARD, Engine};
use rsa::{pkcs8::DecodePrivateKey, Oaep, RsaPrivateKey};
use sha2::Sha256;

use crate::app::config::SmtpKeyConfig;

/// Errors raised while turning a request's password fields into plaintext.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("Password encryption key mismatch.")]
    KeyMismatch,
    #[error("Invalid encrypted password payload.")]
    MalformedPayload,
    #[error("Unable to decrypt SMTP password.")]
    Decrypt,
    #[error("No SMTP decryption key is configured.")]
    Unavailable,
    #[error("Invalid SMTP private key: {0}")]
    InvalidKey(String),
}

/// Decrypts password payloads produced with the active public key.
pub trait PasswordDecryptor: Send + Sync {
    fn key_id(&self) -> &str;

    fn public_key_pem(&self) -> &str;

    /// Blank payloads decrypt to `None`. A `key_id` other than the active one
    /// fails with `KeyMismatch` before any decoding.
    fn decrypt(&self, payload: &str, key_id: Option<&str>) -> Result<Option<String>, CredentialError>;
}

/// RSA-OAEP (SHA-256) decryptor over a PKCS#8 private key.
pub struct RsaPasswordDecryptor {
    key_id: String,
    public_key_pem: String,
    private_key: Option<RsaPrivateKey>,
}

impl RsaPasswordDecryptor {
    /// Build from config. An empty private key yields a decryptor that
    /// rejects every encrypted payload.
    pub fn from_config(config: &SmtpKeyConfig) -> Result<Self, CredentialError> {
        let private_key = if config.private_key_pem.trim().is_empty() {
            None
        } else {
            Some(
                RsaPrivateKey::from_pkcs8_pem(&config.private_key_pem)
                    .map_err(|e| CredentialError::InvalidKey(e.to_string()))?,
            )
        };

        Ok(Self {
            key_id: config.key_id.clone(),
            public_key_pem: config.public_key_pem.clone(),
            private_key,
        })
    }
}

impl PasswordDecryptor for RsaPasswordDecryptor {
    fn key_id(&self) -> &str {
        &self.key_id
    }

    fn public_key_pem(&self) -> &str {
        &self.public_key_pem
    }

    fn decrypt(&self, payload: &str, key_id: Option<&str>) -> Result<Option<String>, CredentialError> {
        if payload.trim().is_empty() {
            return Ok(None);
        }

        if key_id != Some(self.key_id.as_str()) {
            return Err(CredentialError::KeyMismatch);
        }

        let private_key = self.private_key.as_ref().ok_or(CredentialError::Unavailable)?;

        let cipher = STANDARD
            .decode(payload.trim())
            .map_err(|_| CredentialError::MalformedPayload)?;
        let plain = private_key
            .decrypt(Oaep::new::<Sha256>(), &cipher)
            .map_err(|_| CredentialError::Decrypt)?;
        let plaintext = String::from_utf8(plain).map_err(|_| CredentialError::MalformedPayload)?;

        Ok(Some(plaintext))
    }
}

/// Pick the SMTP password: plaintext if present, else the decrypted payload.
/// Blank values count as absent.
pub fn resolve_password(
    decryptor: &dyn PasswordDecryptor,
    plaintext: Option<&str>,
    encrypted: Option<&str>,
    key_id: Option<&str>,
) -> Result<Option<String>, CredentialError> {
    if let Some(p) = plaintext.filter(|p| !p.trim().is_empty()) {
        return Ok(Some(p.to_string()));
    }

    let resolved = match encrypted.filter(|e| !e.trim().is_empty()) {
        Some(payload) => decryptor.decrypt(payload, key_id)?,
        None => None,
    };

    Ok(resolved.filter(|p| !p.trim().is_empty()))
}
