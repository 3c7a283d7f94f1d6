//! Credential Records

use std::{fmt, str::FromStr};

use jiff::Timestamp;

use crate::{
    domain::{
        credentials::secret::CredentialKind,
        identity::{AwardSlug, Email},
    },
    uuids::TypedUuid,
};

/// Credential UUID
pub type CredentialUuid = TypedUuid<CredentialRecord>;

/// Why a credential stopped being redeemable before expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsedReason {
    /// Successfully verified.
    Redeemed,

    /// Replaced by a newer credential for the same identity pair.
    Superseded,
}

impl UsedReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Redeemed => "redeemed",
            Self::Superseded => "superseded",
        }
    }
}

impl fmt::Display for UsedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UsedReason {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "redeemed" => Ok(Self::Redeemed),
            "superseded" => Ok(Self::Superseded),
            other => Err(format!("unknown used reason `{other}`")),
        }
    }
}

/// Credential Record
///
/// Carries no secret hash; only the repository compares hashes.
#[derive(Debug, Clone)]
pub struct CredentialRecord {
    pub uuid: CredentialUuid,
    pub award: AwardSlug,
    pub email: Email,
    pub kind: CredentialKind,
    pub ip: Option<String>,
    pub user_agent: Option<String>,

    /// Failed verification attempts counted against this credential.
    pub attempts: u32,

    pub created_at: Timestamp,
    pub expires_at: Timestamp,
    pub used_at: Option<Timestamp>,
    pub used_reason: Option<UsedReason>,
}

impl CredentialRecord {
    /// Unused and not yet expired at `now`.
    #[must_use]
    pub fn is_live(&self, now: Timestamp) -> bool {
        self.used_at.is_none() && self.expires_at >= now
    }
}
