//! Credential Data

use jiff::{SignedDuration, Timestamp};

use crate::domain::{
    credentials::{
        errors::CredentialsServiceError,
        records::{CredentialRecord, CredentialUuid, UsedReason},
        secret::{CredentialKind, CredentialSecret, SecretHash},
    },
    identity::{AwardSlug, Email},
};

/// Request origin metadata stored alongside a credential.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientInfo {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

/// Credential issuance request. Award and email are validated by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialRequest {
    pub award: String,
    pub email: String,
    pub kind: CredentialKind,

    /// Lifetime override; the service policy TTL applies when `None`.
    pub ttl: Option<SignedDuration>,

    pub client: ClientInfo,
}

impl CredentialRequest {
    /// One-time code request with the default lifetime.
    #[must_use]
    pub fn code(award: &str, email: &str) -> Self {
        Self {
            award: award.to_string(),
            email: email.to_string(),
            kind: CredentialKind::Code,
            ttl: None,
            client: ClientInfo::default(),
        }
    }

    #[must_use]
    pub fn with_kind(mut self, kind: CredentialKind) -> Self {
        self.kind = kind;
        self
    }

    #[must_use]
    pub fn with_ttl(mut self, ttl: SignedDuration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    #[must_use]
    pub fn with_client(mut self, client: ClientInfo) -> Self {
        self.client = client;
        self
    }
}

/// Row payload for the insert statement.
#[derive(Debug, Clone)]
pub(crate) struct NewCredential {
    pub uuid: CredentialUuid,
    pub award: AwardSlug,
    pub email: Email,
    pub kind: CredentialKind,
    pub secret_hash: SecretHash,
    pub client: ClientInfo,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
}

/// Issuance result carrying the one-time plaintext secret.
#[derive(Debug, Clone)]
pub struct IssuedCredential {
    pub secret: CredentialSecret,
    pub record: CredentialRecord,

    /// Number of previously outstanding credentials invalidated by this issuance.
    pub superseded: u64,
}

/// Identity proven by a successful redemption; the explicit replacement for session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    pub credential: CredentialUuid,
    pub award: AwardSlug,
    pub email: Email,
    pub kind: CredentialKind,
    pub redeemed_at: Timestamp,
}

/// Caller-facing verification result. Failure is deliberately undifferentiated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    Valid(VerifiedIdentity),
    Invalid,
}

impl VerificationOutcome {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    /// Convert into the error taxonomy used by callers that treat failure as an error.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialsServiceError::InvalidOrExpiredCredential`] for `Invalid`.
    pub fn require_valid(self) -> Result<VerifiedIdentity, CredentialsServiceError> {
        match self {
            Self::Valid(identity) => Ok(identity),
            Self::Invalid => Err(CredentialsServiceError::InvalidOrExpiredCredential),
        }
    }
}

/// Internal-only reason a verification failed. Logged, never returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum VerificationFailure {
    EmptySecret,
    UnknownIdentity,
    WrongSecret,
    Expired,
    AlreadyUsed(UsedReason),
    AttemptsExhausted,
}

/// Issuance and redemption limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CredentialPolicy {
    /// Default credential lifetime.
    pub ttl: SignedDuration,

    /// Minimum spacing between issuances for one identity pair.
    pub cooldown: SignedDuration,

    /// Failed attempts after which the outstanding credential stops being redeemable.
    pub max_attempts: u32,
}

impl Default for CredentialPolicy {
    fn default() -> Self {
        Self {
            ttl: SignedDuration::from_mins(30),
            cooldown: SignedDuration::from_secs(60),
            max_attempts: 5,
        }
    }
}
