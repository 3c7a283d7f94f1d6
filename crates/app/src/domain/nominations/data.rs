//! Nomination Data

use jiff::Timestamp;

use crate::domain::{
    identity::{AwardSlug, Email},
    nominations::records::{Nomination, NominationUuid, StepProgress},
};

/// Result of [`find_or_create`](super::NominationsService::find_or_create).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FindOrCreateOutcome {
    /// An in-progress nomination already existed and is returned untouched.
    Resumed(Nomination),

    Created(Nomination),

    /// The identity already completed a nomination for an award that allows only one.
    AlreadySubmitted,
}

impl FindOrCreateOutcome {
    /// The nomination to continue, if any.
    #[must_use]
    pub fn nomination(&self) -> Option<&Nomination> {
        match self {
            Self::Resumed(nomination) | Self::Created(nomination) => Some(nomination),
            Self::AlreadySubmitted => None,
        }
    }

    #[must_use]
    pub fn into_nomination(self) -> Option<Nomination> {
        match self {
            Self::Resumed(nomination) | Self::Created(nomination) => Some(nomination),
            Self::AlreadySubmitted => None,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct NewNomination {
    pub uuid: NominationUuid,
    pub slug: String,
    pub award: AwardSlug,
    pub email: Email,
    pub progress: StepProgress,
    pub created_at: Timestamp,
}
