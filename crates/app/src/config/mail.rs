//! Mail Config

use clap::Args;
use reqwest::Url;

use crate::{config::ConfigError, mail::MailgunConfig};

/// Outbound mail settings. Only commands that send mail require them.
#[derive(Debug, Clone, Args)]
pub struct MailConfig {
    /// Mailgun sending domain
    #[arg(long, env = "MAILGUN_DOMAIN")]
    pub mailgun_domain: Option<String>,

    /// Mailgun API key
    #[arg(long, env = "MAILGUN_API_KEY", hide_env_values = true)]
    pub mailgun_api_key: Option<String>,

    /// Mailgun API base URL
    #[arg(long, env = "MAILGUN_ENDPOINT", default_value = "https://api.mailgun.net")]
    pub mailgun_endpoint: String,

    /// Sender address
    #[arg(long, env = "MAIL_FROM_EMAIL")]
    pub mail_from_email: Option<String>,

    /// Sender display name
    #[arg(long, env = "MAIL_FROM_NAME")]
    pub mail_from_name: Option<String>,

    /// Reply-To address
    #[arg(long, env = "MAIL_REPLY_TO")]
    pub mail_reply_to: Option<String>,

    /// Public site root used to build magic links
    #[arg(long, env = "PUBLIC_BASE_URL")]
    pub public_base_url: Option<Url>,
}

impl MailConfig {
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] naming the first unset required variable.
    pub fn mailgun(&self) -> Result<MailgunConfig, ConfigError> {
        Ok(MailgunConfig {
            endpoint: self.mailgun_endpoint.clone(),
            domain: required(self.mailgun_domain.as_ref(), "MAILGUN_DOMAIN")?,
            api_key: required(self.mailgun_api_key.as_ref(), "MAILGUN_API_KEY")?,
            from_email: required(self.mail_from_email.as_ref(), "MAIL_FROM_EMAIL")?,
            from_name: self.mail_from_name.clone(),
            reply_to: self.mail_reply_to.clone(),
        })
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] when `PUBLIC_BASE_URL` is unset.
    pub fn public_base_url(&self) -> Result<Url, ConfigError> {
        self.public_base_url
            .clone()
            .ok_or(ConfigError::Missing("PUBLIC_BASE_URL"))
    }
}

fn required(value: Option<&String>, name: &'static str) -> Result<String, ConfigError> {
    value
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .ok_or(ConfigError::Missing(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty() -> MailConfig {
        MailConfig {
            mailgun_domain: None,
            mailgun_api_key: None,
            mailgun_endpoint: "https://api.mailgun.net".to_string(),
            mail_from_email: None,
            mail_from_name: None,
            mail_reply_to: None,
            public_base_url: None,
        }
    }

    #[test]
    fn missing_settings_are_named() {
        assert!(matches!(
            empty().mailgun(),
            Err(ConfigError::Missing("MAILGUN_DOMAIN"))
        ));

        let blank_key = MailConfig {
            mailgun_domain: Some("mg.example.org".to_string()),
            mailgun_api_key: Some("  ".to_string()),
            ..empty()
        };

        assert!(matches!(
            blank_key.mailgun(),
            Err(ConfigError::Missing("MAILGUN_API_KEY"))
        ));

        assert!(matches!(
            empty().public_base_url(),
            Err(ConfigError::Missing("PUBLIC_BASE_URL"))
        ));
    }

    #[test]
    fn complete_settings_build_mailgun_config() -> Result<(), ConfigError> {
        let config = MailConfig {
            mailgun_domain: Some("mg.example.org".to_string()),
            mailgun_api_key: Some("key-test".to_string()),
            mail_from_email: Some("awards@example.org".to_string()),
            mail_reply_to: Some("help@example.org".to_string()),
            ..empty()
        }
        .mailgun()?;

        assert_eq!(config.domain, "mg.example.org");
        assert_eq!(config.reply_to.as_deref(), Some("help@example.org"));

        Ok(())
    }
}
