//! Signed resume tokens.
//!
//! A resume token lets a verified user come back to an in-progress nomination without server
//! side session state. The format is `base64url(json claims) "." base64url(hmac-sha256)`.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use jiff::{SignedDuration, Timestamp};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;
use uuid::Uuid;
use zeroize::Zeroizing;

use crate::domain::{
    identity::{AwardSlug, Email},
    nominations::records::{Nomination, NominationUuid},
};

type HmacSha256 = Hmac<Sha256>;

/// Shortest signing key accepted.
pub const MIN_KEY_BYTES: usize = 32;

#[derive(Debug, Error)]
pub enum ResumeTokenError {
    #[error("resume token key must be at least {MIN_KEY_BYTES} bytes")]
    KeyTooShort,

    #[error("resume token lifetime must be positive and representable")]
    InvalidTtl,

    #[error("resume token is malformed")]
    Malformed,

    #[error("resume token signature does not match")]
    BadSignature,

    #[error("resume token has expired")]
    Expired,

    #[error("failed to encode resume token claims")]
    Encoding(#[from] serde_json::Error),
}

/// Verified contents of a resume token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeClaims {
    pub nomination: NominationUuid,
    pub award: AwardSlug,
    pub email: Email,
    pub expires_at: Timestamp,
}

#[derive(Debug, Serialize, Deserialize)]
struct Payload {
    nomination: Uuid,
    award: String,
    email: String,
    expires_at: i64,
}

pub struct ResumeTokenSigner {
    key: Zeroizing<Vec<u8>>,
    ttl: SignedDuration,
}

impl std::fmt::Debug for ResumeTokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResumeTokenSigner")
            .field("key", &"<redacted>")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl ResumeTokenSigner {
    /// # Errors
    ///
    /// Returns an error when `key` is shorter than [`MIN_KEY_BYTES`] or `ttl` is not positive.
    pub fn new(key: &[u8], ttl: SignedDuration) -> Result<Self, ResumeTokenError> {
        if key.len() < MIN_KEY_BYTES {
            return Err(ResumeTokenError::KeyTooShort);
        }

        if ttl <= SignedDuration::ZERO {
            return Err(ResumeTokenError::InvalidTtl);
        }

        Ok(Self {
            key: Zeroizing::new(key.to_vec()),
            ttl,
        })
    }

    fn mac(&self) -> Result<HmacSha256, ResumeTokenError> {
        HmacSha256::new_from_slice(&self.key).map_err(|_| ResumeTokenError::KeyTooShort)
    }

    /// Sign a token for `nomination`, valid until `now + ttl`.
    ///
    /// # Errors
    ///
    /// Returns an error if the expiry overflows or the claims cannot be encoded.
    pub fn issue(&self, nomination: &Nomination, now: Timestamp) -> Result<String, ResumeTokenError> {
        let expires_at = now
            .checked_add(self.ttl)
            .map_err(|_| ResumeTokenError::InvalidTtl)?;

        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&Payload {
            nomination: nomination.uuid.into_uuid(),
            award: nomination.award.as_str().to_string(),
            email: nomination.email.as_str().to_string(),
            expires_at: expires_at.as_second(),
        })?);

        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());

        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(format!("{payload}.{signature}"))
    }

    /// Check the signature and expiry of `token`.
    ///
    /// # Errors
    ///
    /// Returns [`ResumeTokenError::Malformed`], [`ResumeTokenError::BadSignature`] or
    /// [`ResumeTokenError::Expired`].
    pub fn verify(&self, token: &str, now: Timestamp) -> Result<ResumeClaims, ResumeTokenError> {
        let (payload, signature) = token
            .trim()
            .split_once('.')
            .ok_or(ResumeTokenError::Malformed)?;

        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| ResumeTokenError::Malformed)?;

        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| ResumeTokenError::BadSignature)?;

        let decoded = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| ResumeTokenError::Malformed)?;

        let payload: Payload =
            serde_json::from_slice(&decoded).map_err(|_| ResumeTokenError::Malformed)?;

        let expires_at =
            Timestamp::from_second(payload.expires_at).map_err(|_| ResumeTokenError::Malformed)?;

        if expires_at < now {
            return Err(ResumeTokenError::Expired);
        }

        Ok(ResumeClaims {
            nomination: NominationUuid::from_uuid(payload.nomination),
            award: AwardSlug::parse(&payload.award).map_err(|_| ResumeTokenError::Malformed)?,
            email: Email::parse(&payload.email).map_err(|_| ResumeTokenError::Malformed)?,
            expires_at,
        })
    }
}
