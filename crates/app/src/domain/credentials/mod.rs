//! Verification Credentials

pub mod data;
pub mod delivery;
pub mod errors;
pub mod records;
mod repository;
pub mod secret;
pub mod service;

pub use delivery::{CredentialDelivery, DeliveryError, DeliveryReceipt};
pub use errors::CredentialsServiceError;
pub use service::*;
