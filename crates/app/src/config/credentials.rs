//! Credential Policy Config

use clap::Args;
use jiff::SignedDuration;

use crate::{config::ConfigError, domain::credentials::data::CredentialPolicy};

/// Issuance and redemption limits.
#[derive(Debug, Clone, Args)]
pub struct CredentialPolicyConfig {
    /// Minutes a newly issued credential stays redeemable
    #[arg(long, env = "CREDENTIAL_TTL_MINUTES", default_value_t = 30)]
    pub credential_ttl_minutes: u32,

    /// Seconds that must pass between two issuances for one award and email
    #[arg(long, env = "CREDENTIAL_COOLDOWN_SECONDS", default_value_t = 60)]
    pub credential_cooldown_seconds: u32,

    /// Failed attempts after which the outstanding credential is locked
    #[arg(long, env = "CREDENTIAL_MAX_ATTEMPTS", default_value_t = 5)]
    pub credential_max_attempts: u32,
}

impl CredentialPolicyConfig {
    /// # Errors
    ///
    /// Returns an error when the lifetime or the attempt limit is zero.
    pub fn policy(&self) -> Result<CredentialPolicy, ConfigError> {
        if self.credential_ttl_minutes == 0 {
            return Err(ConfigError::NotPositive("CREDENTIAL_TTL_MINUTES"));
        }

        if self.credential_max_attempts == 0 {
            return Err(ConfigError::NotPositive("CREDENTIAL_MAX_ATTEMPTS"));
        }

        Ok(CredentialPolicy {
            ttl: SignedDuration::from_mins(i64::from(self.credential_ttl_minutes)),
            cooldown: SignedDuration::from_secs(i64::from(self.credential_cooldown_seconds)),
            max_attempts: self.credential_max_attempts,
        })
    }
}
