//! Identity Pair
//!
//! Both credentials and nominations are scoped to an `(award slug, email)` pair. The types here
//! guarantee that a value which reached the storage layer is already validated and normalized.

use std::fmt;

use thiserror::Error;

const MAX_AWARD_SLUG_CHARS: usize = 191;
const MAX_EMAIL_CHARS: usize = 254;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("award slug is required")]
    EmptyAwardSlug,

    #[error("award slug contains unsupported characters")]
    InvalidAwardSlug,

    #[error("email address is required")]
    EmptyEmail,

    #[error("email address is malformed")]
    InvalidEmail,
}

/// Award identifier, e.g. `best-team-2025`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AwardSlug(String);

impl AwardSlug {
    /// Validate an award slug. Surrounding whitespace is ignored.
    ///
    /// # Errors
    ///
    /// Returns an error when the slug is empty, too long, or contains anything other than ASCII
    /// letters, digits, `-` and `_`.
    pub fn parse(raw: &str) -> Result<Self, IdentityError> {
        let slug = raw.trim();

        if slug.is_empty() {
            return Err(IdentityError::EmptyAwardSlug);
        }

        let valid = slug.chars().count() <= MAX_AWARD_SLUG_CHARS
            && slug
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

        if !valid {
            return Err(IdentityError::InvalidAwardSlug);
        }

        Ok(Self(slug.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AwardSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalized (trimmed, lower-case) email address.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Email(String);

impl Email {
    /// Normalize and validate an email address.
    ///
    /// # Errors
    ///
    /// Returns an error when the address is empty or not shaped like `local@domain`.
    pub fn parse(raw: &str) -> Result<Self, IdentityError> {
        let email = raw.trim().to_lowercase();

        if email.is_empty() {
            return Err(IdentityError::EmptyEmail);
        }

        let Some((local, domain)) = email.rsplit_once('@') else {
            return Err(IdentityError::InvalidEmail);
        };

        let valid = !local.is_empty()
            && !domain.is_empty()
            && !domain.starts_with('.')
            && !domain.ends_with('.')
            && email.chars().count() <= MAX_EMAIL_CHARS
            && !email.chars().any(char::is_whitespace);

        if !valid {
            return Err(IdentityError::InvalidEmail);
        }

        Ok(Self(email))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Address safe to show in logs and notices: `alice@x.com` becomes `a****@x.com`.
    #[must_use]
    pub fn masked(&self) -> String {
        let Some((local, domain)) = self.0.rsplit_once('@') else {
            return "***".to_string();
        };

        let mut chars = local.chars();
        let first = chars.next().unwrap_or('*');
        let hidden = chars.count().max(1);

        format!("{first}{}@{domain}", "*".repeat(hidden))
    }
}

// Only the masked form is ever printed through `Debug`, so identities can sit in spans safely.
impl fmt::Debug for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Email({})", self.masked())
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The `(award, email)` tuple scoping credentials and nominations.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityPair {
    pub award: AwardSlug,
    pub email: Email,
}

impl IdentityPair {
    /// Validate both halves of an identity pair.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure, award first.
    pub fn parse(award: &str, email: &str) -> Result<Self, IdentityError> {
        Ok(Self {
            award: AwardSlug::parse(award)?,
            email: Email::parse(email)?,
        })
    }
}
