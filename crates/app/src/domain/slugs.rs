//! Random URL-safe slugs.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{RngCore, rngs::OsRng};

use crate::domain::identity::AwardSlug;

/// Random bytes behind a slug suffix; 6 bytes encode to 8 characters.
pub const SLUG_SUFFIX_BYTES: usize = 6;

/// Short random suffix: base64url without padding, lower-cased.
#[must_use]
pub fn random_suffix() -> String {
    let mut bytes = [0_u8; SLUG_SUFFIX_BYTES];

    OsRng.fill_bytes(&mut bytes);

    URL_SAFE_NO_PAD.encode(bytes).to_lowercase()
}

/// Candidate nomination slug `{award}-{suffix}`.
///
/// Uniqueness is not checked here; the `nominations_slug_key` constraint decides, and callers
/// retry with a new candidate on conflict.
#[must_use]
pub fn nomination_slug(award: &AwardSlug) -> String {
    format!("{award}-{}", random_suffix())
}
