//! Awards provider errors.

use sqlx::Error;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AwardsProviderError {
    #[error("award not found")]
    NotFound,

    #[error("storage error")]
    Storage(#[source] Error),
}

impl From<Error> for AwardsProviderError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        Self::Storage(error)
    }
}
