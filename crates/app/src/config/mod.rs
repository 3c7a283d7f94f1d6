//! Runtime configuration.
//!
//! Each group is a clap `Args` struct with environment fallbacks so commands can flatten only the
//! settings they need.

use thiserror::Error;

use crate::auth::ResumeTokenError;

pub mod credentials;
pub mod db;
pub mod logging;
pub mod mail;
pub mod resume;

pub use credentials::CredentialPolicyConfig;
pub use db::DatabaseConfig;
pub use logging::{LogFormat, LoggingConfig};
pub use mail::MailConfig;
pub use resume::ResumeConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("{0} must be greater than zero")]
    NotPositive(&'static str),

    #[error("invalid resume token settings")]
    ResumeToken(#[from] ResumeTokenError),
}
