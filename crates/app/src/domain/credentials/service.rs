//! Credentials service.

use std::sync::Arc;

use async_trait::async_trait;
use jiff::{SignedDuration, Timestamp};
use mockall::automock;
use sqlx::{Postgres, Transaction};
use tracing::{debug, info, instrument, warn};

use crate::{
    clock::Clock,
    database::Db,
    domain::{
        credentials::{
            data::{
                CredentialPolicy, CredentialRequest, IssuedCredential, NewCredential,
                VerificationFailure, VerificationOutcome, VerifiedIdentity,
            },
            errors::CredentialsServiceError,
            records::CredentialUuid,
            repository::PgCredentialsRepository,
            secret::{CredentialSecret, SecretHash},
        },
        identity::IdentityPair,
    },
};

#[derive(Debug, Clone)]
pub struct PgCredentialsService {
    db: Db,
    repository: PgCredentialsRepository,
    clock: Arc<dyn Clock>,
    policy: CredentialPolicy,
}

impl PgCredentialsService {
    #[must_use]
    pub fn new(db: Db, clock: Arc<dyn Clock>, policy: CredentialPolicy) -> Self {
        Self {
            db,
            repository: PgCredentialsRepository::new(),
            clock,
            policy,
        }
    }

    #[must_use]
    pub fn policy(&self) -> &CredentialPolicy {
        &self.policy
    }

    /// Work out why a redemption failed, for internal logs only.
    async fn diagnose_failure(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        identity: &IdentityPair,
        secret_hash: &SecretHash,
        now: Timestamp,
    ) -> Result<VerificationFailure, sqlx::Error> {
        let Some(matched) = self
            .repository
            .find_by_secret_hash(tx, identity, secret_hash)
            .await?
        else {
            let outstanding = self.repository.find_outstanding(tx, identity).await?;

            return Ok(if outstanding.is_some() {
                VerificationFailure::WrongSecret
            } else {
                VerificationFailure::UnknownIdentity
            });
        };

        Ok(match matched.used_reason {
            Some(reason) => VerificationFailure::AlreadyUsed(reason),
            None if !matched.is_live(now) => VerificationFailure::Expired,
            None => VerificationFailure::AttemptsExhausted,
        })
    }
}

#[async_trait]
impl CredentialsService for PgCredentialsService {
    #[instrument(skip_all, fields(award = %request.award, kind = %request.kind))]
    async fn issue(
        &self,
        request: CredentialRequest,
    ) -> Result<IssuedCredential, CredentialsServiceError> {
        let identity = IdentityPair::parse(&request.award, &request.email)?;
        let ttl = request.ttl.unwrap_or(self.policy.ttl);

        if ttl <= SignedDuration::ZERO {
            return Err(CredentialsServiceError::InvalidTtl);
        }

        let now = self.clock.now();

        let expires_at = now
            .checked_add(ttl)
            .map_err(|_| CredentialsServiceError::InvalidTtl)?;

        let window_start = now
            .checked_sub(self.policy.cooldown)
            .map_err(|_| CredentialsServiceError::InvalidTtl)?;

        let mut tx = self.db.begin().await?;

        // Advisory: two racing requests may both pass this check. The one-outstanding index
        // still rejects the second insert.
        if self
            .repository
            .issued_since(&mut tx, &identity, window_start)
            .await?
        {
            debug!(email = %identity.email.masked(), "credential issuance rate limited");

            return Err(CredentialsServiceError::RateLimited);
        }

        let superseded = self
            .repository
            .supersede_outstanding(&mut tx, &identity, now)
            .await?;

        let secret = request.kind.generate_secret();

        let record = self
            .repository
            .create_credential(
                &mut tx,
                NewCredential {
                    uuid: CredentialUuid::new(),
                    award: identity.award,
                    email: identity.email,
                    kind: request.kind,
                    secret_hash: secret.hash(),
                    client: request.client,
                    created_at: now,
                    expires_at,
                },
            )
            .await?;

        tx.commit().await?;

        info!(
            credential = %record.uuid,
            email = %record.email.masked(),
            superseded,
            expires_at = %record.expires_at,
            "issued verification credential"
        );

        Ok(IssuedCredential {
            secret,
            record,
            superseded,
        })
    }

    #[instrument(skip_all, fields(award = %award))]
    async fn verify(
        &self,
        award: &str,
        email: &str,
        submitted_secret: &str,
    ) -> Result<VerificationOutcome, CredentialsServiceError> {
        let identity = IdentityPair::parse(award, email)?;
        let secret = CredentialSecret::from_submission(submitted_secret);

        if secret.is_empty() {
            warn!(
                email = %identity.email.masked(),
                reason = ?VerificationFailure::EmptySecret,
                "credential verification failed"
            );

            return Ok(VerificationOutcome::Invalid);
        }

        let secret_hash = secret.hash();
        let now = self.clock.now();

        let mut tx = self.db.begin().await?;

        let redeemed = self
            .repository
            .redeem(
                &mut tx,
                &identity,
                &secret_hash,
                now,
                self.policy.max_attempts,
            )
            .await?;

        if let Some(record) = redeemed {
            tx.commit().await?;

            info!(
                credential = %record.uuid,
                email = %record.email.masked(),
                "credential redeemed"
            );

            return Ok(VerificationOutcome::Valid(VerifiedIdentity {
                credential: record.uuid,
                award: record.award,
                email: record.email,
                kind: record.kind,
                redeemed_at: now,
            }));
        }

        let failure = self
            .diagnose_failure(&mut tx, &identity, &secret_hash, now)
            .await?;

        let counted = self
            .repository
            .record_failed_attempt(&mut tx, &identity, now)
            .await?;

        tx.commit().await?;

        warn!(
            email = %identity.email.masked(),
            reason = ?failure,
            counted_against_outstanding = counted > 0,
            "credential verification failed"
        );

        Ok(VerificationOutcome::Invalid)
    }

    #[instrument(skip(self))]
    async fn purge_stale(&self, older_than: SignedDuration) -> Result<u64, CredentialsServiceError> {
        let cutoff = self
            .clock
            .now()
            .checked_sub(older_than)
            .map_err(|_| CredentialsServiceError::InvalidTtl)?;

        let mut tx = self.db.begin().await?;

        let purged = self.repository.purge_before(&mut tx, cutoff).await?;

        tx.commit().await?;

        info!(purged, cutoff = %cutoff, "purged stale credentials");

        Ok(purged)
    }
}

#[automock]
#[async_trait]
pub trait CredentialsService: Send + Sync {
    /// Issue a credential, superseding any outstanding one for the same identity pair.
    ///
    /// The plaintext secret is returned once and never persisted.
    async fn issue(
        &self,
        request: CredentialRequest,
    ) -> Result<IssuedCredential, CredentialsServiceError>;

    /// Redeem a submitted secret. Every failure collapses to [`VerificationOutcome::Invalid`].
    async fn verify(
        &self,
        award: &str,
        email: &str,
        submitted_secret: &str,
    ) -> Result<VerificationOutcome, CredentialsServiceError>;

    /// Delete credentials that expired or were used more than `older_than` ago.
    async fn purge_stale(&self, older_than: SignedDuration) -> Result<u64, CredentialsServiceError>;
}
