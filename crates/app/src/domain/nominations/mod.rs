//! Nominations
//!
//! One resumable submission per `(award, email)` pair, advanced step by step.

pub mod data;
pub mod errors;
pub mod records;
mod repository;
pub mod service;

pub use errors::NominationsServiceError;
pub use records::compute_next_step;
pub use service::*;
