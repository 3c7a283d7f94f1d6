//! Credential delivery: issue a secret and mail it to the requester.

use std::sync::Arc;

use jiff::Timestamp;
use reqwest::Url;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::{
    domain::credentials::{
        CredentialsService, CredentialsServiceError,
        data::{ClientInfo, CredentialRequest, IssuedCredential},
        records::CredentialUuid,
        secret::CredentialKind,
    },
    mail::{MailError, Mailer, OutgoingEmail},
};

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error(transparent)]
    Credentials(#[from] CredentialsServiceError),

    #[error("failed to send credential email")]
    Mail(#[from] MailError),

    #[error("public base URL cannot be used as a link base")]
    InvalidBaseUrl,
}

/// What the caller may show after a successful delivery. Never carries the secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReceipt {
    pub credential: CredentialUuid,
    pub kind: CredentialKind,
    pub masked_email: String,
    pub expires_at: Timestamp,
}

#[derive(Clone)]
pub struct CredentialDelivery {
    credentials: Arc<dyn CredentialsService>,
    mailer: Arc<dyn Mailer>,
    public_base_url: Url,
}

impl CredentialDelivery {
    #[must_use]
    pub fn new(
        credentials: Arc<dyn CredentialsService>,
        mailer: Arc<dyn Mailer>,
        public_base_url: Url,
    ) -> Self {
        Self {
            credentials,
            mailer,
            public_base_url,
        }
    }

    /// Issue a credential of `kind` and mail it.
    ///
    /// A mail failure leaves the issued credential outstanding; the requester can ask again
    /// once the cooldown has passed.
    ///
    /// # Errors
    ///
    /// Returns issuance errors unchanged, or [`DeliveryError::Mail`] when sending fails.
    #[instrument(skip_all, fields(award = %award, kind = %kind))]
    pub async fn deliver(
        &self,
        award: &str,
        email: &str,
        kind: CredentialKind,
        client: ClientInfo,
    ) -> Result<DeliveryReceipt, DeliveryError> {
        let issued = self
            .credentials
            .issue(
                CredentialRequest::code(award, email)
                    .with_kind(kind)
                    .with_client(client),
            )
            .await?;

        let message = self.render(&issued)?;

        if let Err(error) = self.mailer.send(&message).await {
            warn!(
                credential = %issued.record.uuid,
                email = %issued.record.email.masked(),
                error = %error,
                "credential email was not sent"
            );

            return Err(error.into());
        }

        info!(
            credential = %issued.record.uuid,
            email = %issued.record.email.masked(),
            "credential email sent"
        );

        Ok(DeliveryReceipt {
            credential: issued.record.uuid,
            kind: issued.record.kind,
            masked_email: issued.record.email.masked(),
            expires_at: issued.record.expires_at,
        })
    }

    fn render(&self, issued: &IssuedCredential) -> Result<OutgoingEmail, DeliveryError> {
        let record = &issued.record;

        let minutes = record
            .expires_at
            .duration_since(record.created_at)
            .as_mins();

        let (subject, text, html) = match record.kind {
            CredentialKind::Code => {
                let code = issued.secret.expose();

                (
                    "Your verification code".to_string(),
                    format!(
                        "Your verification code is: {code}\n\nIt expires in {minutes} minutes."
                    ),
                    format!(
                        "<p>Your verification code is: <strong>{code}</strong></p>\
                         <p>It expires in {minutes} minutes.</p>"
                    ),
                )
            }
            CredentialKind::MagicLink => {
                let link = self.magic_link(issued)?;

                (
                    "Continue your nomination".to_string(),
                    format!(
                        "Follow this link to continue your nomination:\n{link}\n\n\
                         It expires in {minutes} minutes."
                    ),
                    format!(
                        "<p><a href=\"{link}\">Continue your nomination</a></p>\
                         <p>This link expires in {minutes} minutes.</p>"
                    ),
                )
            }
        };

        Ok(OutgoingEmail {
            to: record.email.as_str().to_string(),
            subject,
            html,
            text: Some(text),
        })
    }

    fn magic_link(&self, issued: &IssuedCredential) -> Result<Url, DeliveryError> {
        let mut link = self.public_base_url.clone();

        link.path_segments_mut()
            .map_err(|()| DeliveryError::InvalidBaseUrl)?
            .pop_if_empty()
            .extend([
                "app",
                "nomination",
                issued.record.award.as_str(),
                "verify",
            ]);

        link.query_pairs_mut()
            .append_pair("email", issued.record.email.as_str())
            .append_pair("token", issued.secret.expose());

        Ok(link)
    }
}
