//! Credential secret generation and hashing.

use std::{fmt, str::FromStr};

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{Rng, RngCore, rngs::OsRng};
use sha2::{Digest, Sha256};
use thiserror::Error;
use zeroize::Zeroize;

/// Number of digits in a one-time code.
pub const CODE_DIGITS: usize = 6;

/// Number of random bytes behind a magic-link token.
pub const MAGIC_LINK_TOKEN_BYTES: usize = 32;

const CODE_SPACE: u32 = 1_000_000;

/// How a credential reaches the user: a code they type, or a link they click.
///
/// Both kinds share storage, supersession and redemption; only the secret shape and the rendered
/// message differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialKind {
    Code,
    MagicLink,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown credential kind `{0}`")]
pub struct UnknownCredentialKind(pub String);

impl CredentialKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::MagicLink => "magic_link",
        }
    }

    /// Generate a fresh plaintext secret of this kind from the OS RNG.
    #[must_use]
    pub fn generate_secret(self) -> CredentialSecret {
        match self {
            Self::Code => {
                let code = OsRng.gen_range(0..CODE_SPACE);

                CredentialSecret::new(format!("{code:06}"))
            }
            Self::MagicLink => {
                let mut bytes = [0_u8; MAGIC_LINK_TOKEN_BYTES];

                OsRng.fill_bytes(&mut bytes);

                let secret = CredentialSecret::new(URL_SAFE_NO_PAD.encode(bytes));

                bytes.zeroize();

                secret
            }
        }
    }
}

impl fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CredentialKind {
    type Err = UnknownCredentialKind;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "code" => Ok(Self::Code),
            "magic_link" => Ok(Self::MagicLink),
            other => Err(UnknownCredentialKind(other.to_string())),
        }
    }
}

/// Plaintext credential secret. Handed to the caller exactly once for delivery, never stored.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialSecret(String);

impl CredentialSecret {
    #[must_use]
    pub fn new(secret: String) -> Self {
        Self(secret)
    }

    /// Normalize user input: all whitespace is removed, so `"042 917"` matches `"042917"`.
    #[must_use]
    pub fn from_submission(raw: &str) -> Self {
        Self(raw.chars().filter(|c| !c.is_whitespace()).collect())
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn hash(&self) -> SecretHash {
        SecretHash(format!("{:x}", Sha256::digest(self.0.as_bytes())))
    }
}

impl fmt::Debug for CredentialSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CredentialSecret(**redacted**)")
    }
}

impl Drop for CredentialSecret {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// Lower-case hex SHA-256 digest of a secret, the only form that is persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretHash(String);

impl SecretHash {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}
