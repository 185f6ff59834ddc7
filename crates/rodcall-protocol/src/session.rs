//! Client-held session credentials.
//!
//! The server never stores sessions. Application session data is serialized
//! to JSON, base64-encoded, stamped with an expiry and signed; the client
//! sends the credential back with every call.

use base64::Engine;
use chrono::{DateTime, SubsecRound, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::signing::{self, Secret, SigningResult};

/// Errors decoding the session payload
#[derive(Debug, Error)]
pub enum SessionDecodeError {
    #[error("base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Signed, expiring session credential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionData {
    /// Base64 of the JSON-encoded application session.
    pub data: String,
    /// Instant after which the credential counts as absent.
    pub valid_until: DateTime<Utc>,
    /// Base64 HMAC over `{data, validUntil}`.
    pub signature: String,
}

/// The part of a credential the signature covers.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignedFields<'a> {
    data: &'a str,
    valid_until: &'a DateTime<Utc>,
}

impl SessionData {
    /// Encode an application session and sign it.
    ///
    /// `valid_until` is truncated to millisecond precision so the signed form
    /// is stable across serializers.
    pub fn create_and_sign<S: Serialize>(
        session: &S,
        valid_until: DateTime<Utc>,
        secret: &Secret,
    ) -> SigningResult<Self> {
        let json = signing::canonical_bytes(session)?;
        let data = base64::engine::general_purpose::STANDARD.encode(json);
        let valid_until = valid_until.trunc_subsecs(3);
        let signature = signing::sign(
            &SignedFields {
                data: &data,
                valid_until: &valid_until,
            },
            secret,
        )?;
        Ok(Self {
            data,
            valid_until,
            signature,
        })
    }

    /// Check the signature against the shared secret.
    pub fn verify_signature(&self, secret: &Secret) -> SigningResult<bool> {
        signing::verify(
            &SignedFields {
                data: &self.data,
                valid_until: &self.valid_until,
            },
            &self.signature,
            secret,
        )
    }

    /// Whether the credential has expired at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.valid_until
    }

    /// Decode the application session payload.
    pub fn decode<S: DeserializeOwned>(&self) -> Result<S, SessionDecodeError> {
        let bytes = base64::engine::general_purpose::STANDARD.decode(&self.data)?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Login {
        user: String,
    }

    fn secret() -> Secret {
        Secret::from("session-secret")
    }

    fn alice() -> Login {
        Login {
            user: "alice".to_string(),
        }
    }

    #[test]
    fn test_create_verify_decode() {
        let until = Utc::now() + Duration::minutes(5);
        let session = SessionData::create_and_sign(&alice(), until, &secret()).unwrap();

        assert!(session.verify_signature(&secret()).unwrap());
        assert!(!session.is_expired(Utc::now()));
        assert_eq!(session.decode::<Login>().unwrap(), alice());
    }

    #[test]
    fn test_tampered_data_fails() {
        let until = Utc::now() + Duration::minutes(5);
        let mut session = SessionData::create_and_sign(&alice(), until, &secret()).unwrap();
        session.data = base64::engine::general_purpose::STANDARD.encode(br#"{"user":"root"}"#);
        assert!(!session.verify_signature(&secret()).unwrap());
    }

    #[test]
    fn test_extended_expiry_fails() {
        let until = Utc::now() + Duration::minutes(5);
        let mut session = SessionData::create_and_sign(&alice(), until, &secret()).unwrap();
        session.valid_until = session.valid_until + Duration::days(365);
        assert!(!session.verify_signature(&secret()).unwrap());
    }

    #[test]
    fn test_expired_credential_still_verifies() {
        let until = Utc::now() - Duration::seconds(1);
        let session = SessionData::create_and_sign(&alice(), until, &secret()).unwrap();
        assert!(session.verify_signature(&secret()).unwrap());
        assert!(session.is_expired(Utc::now()));
    }

    #[test]
    fn test_signature_survives_json_round_trip() {
        let until = Utc::now() + Duration::minutes(5);
        let session = SessionData::create_and_sign(&alice(), until, &secret()).unwrap();
        let text = serde_json::to_string(&session).unwrap();
        assert!(text.contains("validUntil"));
        let parsed: SessionData = serde_json::from_str(&text).unwrap();
        assert!(parsed.verify_signature(&secret()).unwrap());
    }
}
