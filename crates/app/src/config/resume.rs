//! Resume Token Config

use clap::Args;
use jiff::SignedDuration;

use crate::{auth::ResumeTokenSigner, config::ConfigError};

/// Resume token signing settings.
#[derive(Debug, Clone, Args)]
pub struct ResumeConfig {
    /// HMAC key for resume tokens, at least 32 bytes
    #[arg(long, env = "RESUME_TOKEN_SECRET", hide_env_values = true)]
    pub resume_token_secret: Option<String>,

    /// Minutes a resume token stays valid
    #[arg(long, env = "RESUME_TOKEN_TTL_MINUTES", default_value_t = 120)]
    pub resume_token_ttl_minutes: u32,
}

impl ResumeConfig {
    /// # Errors
    ///
    /// Returns an error when the secret is missing or too short, or the lifetime is zero.
    pub fn signer(&self) -> Result<ResumeTokenSigner, ConfigError> {
        let secret = self
            .resume_token_secret
            .as_deref()
            .ok_or(ConfigError::Missing("RESUME_TOKEN_SECRET"))?;

        if self.resume_token_ttl_minutes == 0 {
            return Err(ConfigError::NotPositive("RESUME_TOKEN_TTL_MINUTES"));
        }

        let ttl = SignedDuration::from_mins(i64::from(self.resume_token_ttl_minutes));

        Ok(ResumeTokenSigner::new(secret.as_bytes(), ttl)?)
    }
}
