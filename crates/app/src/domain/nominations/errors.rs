//! Nominations service errors.

use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

use crate::domain::{
    awards::AwardsProviderError, identity::IdentityError, nominations::records::StepError,
};

/// Unique constraint on the public nomination slug.
pub(crate) const SLUG_CONSTRAINT: &str = "nominations_slug_key";

#[derive(Debug, Error)]
pub enum NominationsServiceError {
    #[error("invalid argument")]
    InvalidArgument(#[from] IdentityError),

    #[error("invalid step")]
    InvalidStep(#[from] StepError),

    #[error("nomination not found")]
    NotFound,

    #[error("award not found")]
    AwardNotFound,

    #[error("could not allocate a unique nomination slug")]
    SlugCollision,

    #[error("storage error")]
    Storage(#[source] Error),
}

pub(crate) fn is_slug_collision(error: &Error) -> bool {
    let database_error = error.as_database_error();

    matches!(
        database_error.map(DatabaseError::kind),
        Some(ErrorKind::UniqueViolation)
    ) && database_error.and_then(DatabaseError::constraint) == Some(SLUG_CONSTRAINT)
}

impl From<Error> for NominationsServiceError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        if is_slug_collision(&error) {
            return Self::SlugCollision;
        }

        Self::Storage(error)
    }
}

impl From<AwardsProviderError> for NominationsServiceError {
    fn from(error: AwardsProviderError) -> Self {
        match error {
            AwardsProviderError::NotFound => Self::AwardNotFound,
            AwardsProviderError::Storage(error) => Self::Storage(error),
        }
    }
}
