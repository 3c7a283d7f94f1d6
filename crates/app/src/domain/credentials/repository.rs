//! Credentials Repository

use jiff::Timestamp;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as, query_scalar};

use crate::{
    database::decode_column,
    domain::{
        credentials::{
            data::NewCredential,
            records::{CredentialRecord, CredentialUuid, UsedReason},
            secret::{CredentialKind, SecretHash},
        },
        identity::{AwardSlug, Email, IdentityPair},
    },
};

const CREDENTIAL_ISSUED_SINCE_SQL: &str = include_str!("sql/credential_issued_since.sql");
const SUPERSEDE_OUTSTANDING_SQL: &str = include_str!("sql/supersede_outstanding_credentials.sql");
const CREATE_CREDENTIAL_SQL: &str = include_str!("sql/create_credential.sql");
const REDEEM_CREDENTIAL_SQL: &str = include_str!("sql/redeem_credential.sql");
const RECORD_FAILED_ATTEMPT_SQL: &str = include_str!("sql/record_failed_attempt.sql");
const FIND_BY_SECRET_HASH_SQL: &str = include_str!("sql/find_credential_by_secret_hash.sql");
const FIND_OUTSTANDING_SQL: &str = include_str!("sql/find_outstanding_credential.sql");
const PURGE_STALE_SQL: &str = include_str!("sql/purge_stale_credentials.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgCredentialsRepository;

impl PgCredentialsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn issued_since(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        identity: &IdentityPair,
        since: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        query_scalar::<Postgres, bool>(CREDENTIAL_ISSUED_SINCE_SQL)
            .bind(identity.award.as_str())
            .bind(identity.email.as_str())
            .bind(SqlxTimestamp::from(since))
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn supersede_outstanding(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        identity: &IdentityPair,
        now: Timestamp,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(SUPERSEDE_OUTSTANDING_SQL)
            .bind(identity.award.as_str())
            .bind(identity.email.as_str())
            .bind(SqlxTimestamp::from(now))
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    pub(crate) async fn create_credential(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        credential: NewCredential,
    ) -> Result<CredentialRecord, sqlx::Error> {
        query_as::<Postgres, CredentialRecord>(CREATE_CREDENTIAL_SQL)
            .bind(credential.uuid)
            .bind(credential.award.as_str())
            .bind(credential.email.as_str())
            .bind(credential.kind.as_str())
            .bind(credential.secret_hash.as_str())
            .bind(credential.client.ip)
            .bind(credential.client.user_agent)
            .bind(SqlxTimestamp::from(credential.created_at))
            .bind(SqlxTimestamp::from(credential.expires_at))
            .fetch_one(&mut **tx)
            .await
    }

    /// Mark the matching live credential redeemed in a single conditional write.
    ///
    /// Concurrent callers racing on the same secret serialize on the row lock; the loser
    /// re-evaluates `used_at IS NULL` and gets no row back.
    pub(crate) async fn redeem(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        identity: &IdentityPair,
        secret_hash: &SecretHash,
        now: Timestamp,
        max_attempts: u32,
    ) -> Result<Option<CredentialRecord>, sqlx::Error> {
        query_as::<Postgres, CredentialRecord>(REDEEM_CREDENTIAL_SQL)
            .bind(identity.award.as_str())
            .bind(identity.email.as_str())
            .bind(secret_hash.as_str())
            .bind(SqlxTimestamp::from(now))
            .bind(i32::try_from(max_attempts).unwrap_or(i32::MAX))
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn record_failed_attempt(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        identity: &IdentityPair,
        now: Timestamp,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(RECORD_FAILED_ATTEMPT_SQL)
            .bind(identity.award.as_str())
            .bind(identity.email.as_str())
            .bind(SqlxTimestamp::from(now))
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    pub(crate) async fn find_by_secret_hash(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        identity: &IdentityPair,
        secret_hash: &SecretHash,
    ) -> Result<Option<CredentialRecord>, sqlx::Error> {
        query_as::<Postgres, CredentialRecord>(FIND_BY_SECRET_HASH_SQL)
            .bind(identity.award.as_str())
            .bind(identity.email.as_str())
            .bind(secret_hash.as_str())
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn find_outstanding(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        identity: &IdentityPair,
    ) -> Result<Option<CredentialRecord>, sqlx::Error> {
        query_as::<Postgres, CredentialRecord>(FIND_OUTSTANDING_SQL)
            .bind(identity.award.as_str())
            .bind(identity.email.as_str())
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn purge_before(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cutoff: Timestamp,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(PURGE_STALE_SQL)
            .bind(SqlxTimestamp::from(cutoff))
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}

impl<'r> FromRow<'r, PgRow> for CredentialRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let award: String = row.try_get("award_slug")?;
        let email: String = row.try_get("email")?;
        let kind: String = row.try_get("kind")?;
        let attempts: i32 = row.try_get("attempts")?;

        let used_reason = row
            .try_get::<Option<String>, _>("used_reason")?
            .map(|reason| decode_column("used_reason", reason.parse::<UsedReason>()))
            .transpose()?;

        Ok(Self {
            uuid: row.try_get::<CredentialUuid, _>("uuid")?,
            award: decode_column("award_slug", AwardSlug::parse(&award))?,
            email: decode_column("email", Email::parse(&email))?,
            kind: decode_column("kind", kind.parse::<CredentialKind>())?,
            ip: row.try_get("ip")?,
            user_agent: row.try_get("user_agent")?,
            attempts: decode_column("attempts", u32::try_from(attempts))?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            expires_at: row.try_get::<SqlxTimestamp, _>("expires_at")?.to_jiff(),
            used_at: row
                .try_get::<Option<SqlxTimestamp>, _>("used_at")?
                .map(SqlxTimestamp::to_jiff),
            used_reason,
        })
    }
}
