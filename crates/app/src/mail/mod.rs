//! Outbound email.

use async_trait::async_trait;
use mockall::automock;
use thiserror::Error;

mod mailgun;

pub use mailgun::{MailgunConfig, MailgunMailer};

/// A rendered message ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: Option<String>,
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("mail provider rejected the message: {0}")]
    Rejected(String),
}

#[automock]
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Hand a message to the provider.
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError>;
}
