//! Credentials service errors.

use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

use crate::domain::identity::IdentityError;

/// Partial unique index allowing one outstanding credential per identity pair.
pub(crate) const ONE_OUTSTANDING_CONSTRAINT: &str = "nomination_credentials_one_outstanding";

#[derive(Debug, Error)]
pub enum CredentialsServiceError {
    #[error("invalid argument")]
    InvalidArgument(#[from] IdentityError),

    #[error("credential lifetime must be positive and representable")]
    InvalidTtl,

    #[error("a credential was requested too recently")]
    RateLimited,

    #[error("credential is invalid or has expired")]
    InvalidOrExpiredCredential,

    #[error("storage error")]
    Storage(#[source] Error),
}

impl From<Error> for CredentialsServiceError {
    fn from(error: Error) -> Self {
        let database_error = error.as_database_error();

        // A concurrent issuance inserted first; treat it like any other issuance in the window.
        if matches!(
            database_error.map(DatabaseError::kind),
            Some(ErrorKind::UniqueViolation)
        ) && database_error.and_then(DatabaseError::constraint) == Some(ONE_OUTSTANDING_CONSTRAINT)
        {
            return Self::RateLimited;
        }

        Self::Storage(error)
    }
}
