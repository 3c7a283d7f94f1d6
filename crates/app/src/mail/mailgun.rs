//! Mailgun HTTP API client.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::mail::{MailError, Mailer, OutgoingEmail};

/// Connection and sender settings for a Mailgun domain.
#[derive(Debug, Clone)]
pub struct MailgunConfig {
    /// API base, e.g. `"https://api.mailgun.net"` or the EU endpoint.
    pub endpoint: String,

    /// Sending domain registered with Mailgun.
    pub domain: String,

    pub api_key: String,

    pub from_email: String,
    pub from_name: Option<String>,
    pub reply_to: Option<String>,
}

impl MailgunConfig {
    fn from_header(&self) -> String {
        match &self.from_name {
            Some(name) => format!("{name} <{}>", self.from_email),
            None => self.from_email.clone(),
        }
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/v3/{}/messages",
            self.endpoint.trim_end_matches('/'),
            self.domain
        )
    }
}

#[derive(Debug, Clone)]
pub struct MailgunMailer {
    config: MailgunConfig,
    http: Client,
}

impl MailgunMailer {
    #[must_use]
    pub fn new(config: MailgunConfig) -> Self {
        Self {
            config,
            http: Client::new(),
        }
    }

    fn form(&self, email: &OutgoingEmail) -> Vec<(&'static str, String)> {
        let mut form = vec![
            ("from", self.config.from_header()),
            ("to", email.to.clone()),
            ("subject", email.subject.clone()),
            ("html", email.html.clone()),
        ];

        if let Some(text) = &email.text {
            form.push(("text", text.clone()));
        }

        if let Some(reply_to) = &self.config.reply_to {
            form.push(("h:Reply-To", reply_to.clone()));
        }

        form
    }
}

#[async_trait]
impl Mailer for MailgunMailer {
    #[instrument(skip_all, fields(domain = %self.config.domain))]
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        let response = self
            .http
            .post(self.config.messages_url())
            .basic_auth("api", Some(&self.config.api_key))
            .form(&self.form(email))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();

            return Err(MailError::Rejected(format!(
                "send request failed with status {status}: {text}"
            )));
        }

        let parsed: SendResponse = response.json().await?;

        debug!(message_id = %parsed.id, "mailgun accepted message");

        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> MailgunConfig {
        MailgunConfig {
            endpoint: "https://api.eu.mailgun.net/".to_string(),
            domain: "mg.example.org".to_string(),
            api_key: "key-test".to_string(),
            from_email: "awards@example.org".to_string(),
            from_name: Some("Example Awards".to_string()),
            reply_to: None,
        }
    }

    fn message() -> OutgoingEmail {
        OutgoingEmail {
            to: "a@x.com".to_string(),
            subject: "Your verification code".to_string(),
            html: "<p>123456</p>".to_string(),
            text: None,
        }
    }

    #[test]
    fn messages_url_joins_endpoint_and_domain() {
        assert_eq!(
            config().messages_url(),
            "https://api.eu.mailgun.net/v3/mg.example.org/messages"
        );
    }

    #[test]
    fn from_header_includes_display_name() {
        assert_eq!(config().from_header(), "Example Awards <awards@example.org>");

        let bare = MailgunConfig {
            from_name: None,
            ..config()
        };

        assert_eq!(bare.from_header(), "awards@example.org");
    }

    #[test]
    fn form_carries_optional_fields_only_when_set() {
        let mailer = MailgunMailer::new(config());
        let form = mailer.form(&message());

        assert!(form.iter().all(|(key, _)| *key != "text" && *key != "h:Reply-To"));

        let mailer = MailgunMailer::new(MailgunConfig {
            reply_to: Some("help@example.org".to_string()),
            ..config()
        });

        let form = mailer.form(&OutgoingEmail {
            text: Some("123456".to_string()),
            ..message()
        });

        assert!(form.contains(&("text", "123456".to_string())));
        assert!(form.contains(&("h:Reply-To", "help@example.org".to_string())));
    }
}
