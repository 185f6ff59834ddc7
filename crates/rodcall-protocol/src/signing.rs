//! HMAC-SHA256 signing of protocol payloads.
//!
//! Payloads are signed over their RFC 8785 canonical JSON form, so a payload
//! that survives a JSON round trip through a client keeps its signature.
//! Signatures are base64-encoded on the wire.

use base64::Engine;
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Errors from signing operations
#[derive(Debug, Error)]
pub enum SigningError {
    #[error("JCS canonicalization error: {0}")]
    Jcs(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// Result type for signing operations
pub type SigningResult<T> = Result<T, SigningError>;

/// Shared secret used to sign call chains and session credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(Vec<u8>);

impl Secret {
    /// Create a secret from raw key bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Decode a base64-encoded secret.
    pub fn from_base64(encoded: &str) -> SigningResult<Self> {
        let bytes = base64::engine::general_purpose::STANDARD.decode(encoded.trim())?;
        if bytes.is_empty() {
            return Err(SigningError::InvalidKey("secret must not be empty".to_string()));
        }
        Ok(Self(bytes))
    }

    /// Encode the secret as base64 for storage.
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.0)
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Short SHA-256 fingerprint, safe to log.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.0);
        hex::encode(&hasher.finalize()[..8])
    }

    fn mac(&self) -> SigningResult<HmacSha256> {
        HmacSha256::new_from_slice(&self.0).map_err(|e| SigningError::InvalidKey(e.to_string()))
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret({})", self.fingerprint())
    }
}

impl From<&str> for Secret {
    fn from(secret: &str) -> Self {
        Self::new(secret.as_bytes())
    }
}

/// Canonical bytes a signature covers.
pub fn canonical_bytes<T: Serialize>(payload: &T) -> SigningResult<Vec<u8>> {
    serde_json_canonicalizer::to_vec(payload).map_err(|e| SigningError::Jcs(e.to_string()))
}

/// Sign a payload, returning a base64 HMAC-SHA256 tag.
pub fn sign<T: Serialize>(payload: &T, secret: &Secret) -> SigningResult<String> {
    let bytes = canonical_bytes(payload)?;
    let mut mac = secret.mac()?;
    mac.update(&bytes);
    Ok(base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes()))
}

/// Verify a base64 HMAC-SHA256 tag over a payload.
///
/// A signature that is not valid base64 does not verify. The tag comparison
/// is constant-time.
pub fn verify<T: Serialize>(
    payload: &T,
    signature: &str,
    secret: &Secret,
) -> SigningResult<bool> {
    let Ok(tag) = base64::engine::general_purpose::STANDARD.decode(signature) else {
        return Ok(false);
    };
    let bytes = canonical_bytes(payload)?;
    let mut mac = secret.mac()?;
    mac.update(&bytes);
    Ok(mac.verify_slice(&tag).is_ok())
}
