//! Nominations Repository

use jiff::Timestamp;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query_as, query_scalar};

use crate::{
    database::decode_column,
    domain::{
        identity::{AwardSlug, Email, IdentityPair},
        nominations::{
            data::NewNomination,
            records::{Nomination, NominationStatus, NominationUuid, Step, StepProgress},
        },
    },
};

const FIND_IN_PROGRESS_SQL: &str = include_str!("sql/find_in_progress_nomination.sql");
const COMPLETED_EXISTS_SQL: &str = include_str!("sql/completed_nomination_exists.sql");
const CREATE_NOMINATION_SQL: &str = include_str!("sql/create_nomination.sql");
const LOCK_NOMINATION_SQL: &str = include_str!("sql/lock_nomination.sql");
const UPDATE_PROGRESS_SQL: &str = include_str!("sql/update_nomination_progress.sql");
const GET_NOMINATION_SQL: &str = include_str!("sql/get_nomination.sql");
const FIND_BY_SLUG_SQL: &str = include_str!("sql/find_nomination_by_slug.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgNominationsRepository;

impl PgNominationsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn find_in_progress(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        identity: &IdentityPair,
    ) -> Result<Option<Nomination>, sqlx::Error> {
        query_as::<Postgres, Nomination>(FIND_IN_PROGRESS_SQL)
            .bind(identity.award.as_str())
            .bind(identity.email.as_str())
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn completed_exists(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        identity: &IdentityPair,
    ) -> Result<bool, sqlx::Error> {
        query_scalar::<Postgres, bool>(COMPLETED_EXISTS_SQL)
            .bind(identity.award.as_str())
            .bind(identity.email.as_str())
            .fetch_one(&mut **tx)
            .await
    }

    /// Insert an in-progress nomination. Returns `None` when another in-progress row for the
    /// same identity won the race.
    pub(crate) async fn create_nomination(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        nomination: &NewNomination,
    ) -> Result<Option<Nomination>, sqlx::Error> {
        query_as::<Postgres, Nomination>(CREATE_NOMINATION_SQL)
            .bind(nomination.uuid)
            .bind(nomination.slug.as_str())
            .bind(nomination.award.as_str())
            .bind(nomination.email.as_str())
            .bind(nomination.progress.next_step().as_str())
            .bind(nomination.progress.documents_done)
            .bind(nomination.progress.needs_documents)
            .bind(SqlxTimestamp::from(nomination.created_at))
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn lock_nomination(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        nomination: NominationUuid,
    ) -> Result<Nomination, sqlx::Error> {
        query_as::<Postgres, Nomination>(LOCK_NOMINATION_SQL)
            .bind(nomination)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn update_progress(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        nomination: NominationUuid,
        progress: &StepProgress,
        current_step: Step,
        now: Timestamp,
    ) -> Result<Nomination, sqlx::Error> {
        query_as::<Postgres, Nomination>(UPDATE_PROGRESS_SQL)
            .bind(nomination)
            .bind(progress.nominator_done)
            .bind(progress.nominee_done)
            .bind(progress.questionnaire_done)
            .bind(progress.documents_done)
            .bind(current_step.as_str())
            .bind(SqlxTimestamp::from(now))
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn get_nomination(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        nomination: NominationUuid,
    ) -> Result<Nomination, sqlx::Error> {
        query_as::<Postgres, Nomination>(GET_NOMINATION_SQL)
            .bind(nomination)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn find_by_slug(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        slug: &str,
    ) -> Result<Nomination, sqlx::Error> {
        query_as::<Postgres, Nomination>(FIND_BY_SLUG_SQL)
            .bind(slug)
            .fetch_one(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for Nomination {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let award: String = row.try_get("award_slug")?;
        let email: String = row.try_get("email")?;
        let status: String = row.try_get("status")?;
        let current_step: String = row.try_get("current_step")?;

        Ok(Self {
            uuid: row.try_get::<NominationUuid, _>("uuid")?,
            slug: row.try_get("nomination_slug")?,
            award: decode_column("award_slug", AwardSlug::parse(&award))?,
            email: decode_column("email", Email::parse(&email))?,
            status: decode_column("status", status.parse::<NominationStatus>())?,
            current_step: decode_column("current_step", current_step.parse::<Step>())?,
            progress: StepProgress {
                nominator_done: row.try_get("nominator_done")?,
                nominee_done: row.try_get("nominee_done")?,
                questionnaire_done: row.try_get("questionnaire_done")?,
                documents_done: row.try_get("documents_done")?,
                needs_documents: row.try_get("needs_documents")?,
            },
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
            completed_at: row
                .try_get::<Option<SqlxTimestamp>, _>("completed_at")?
                .map(SqlxTimestamp::to_jiff),
        })
    }
}
