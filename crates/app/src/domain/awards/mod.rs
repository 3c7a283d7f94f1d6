//! Award Metadata

pub mod errors;
pub mod provider;

pub use errors::AwardsProviderError;
pub use provider::*;
