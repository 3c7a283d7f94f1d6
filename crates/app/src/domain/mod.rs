//! Nomination Domain Concerns

pub mod awards;
pub mod credentials;
pub mod identity;
pub mod nominations;
pub mod slugs;
