//! Award settings lookup. Awards are administered elsewhere; this side only reads them.

use async_trait::async_trait;
use mockall::automock;
use sqlx::{FromRow, Postgres, Row, postgres::PgRow, query_as};
use tracing::instrument;

use crate::{
    database::{Db, decode_column},
    domain::{awards::errors::AwardsProviderError, identity::AwardSlug},
};

const GET_AWARD_SETTINGS_SQL: &str = include_str!("sql/get_award_settings.sql");

/// The per-award switches the nomination workflow depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AwardSettings {
    pub slug: AwardSlug,
    pub name: String,
    pub needs_documents: bool,
    pub allow_multiple_submissions: bool,
}

impl<'r> FromRow<'r, PgRow> for AwardSettings {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let slug: String = row.try_get("slug")?;

        Ok(Self {
            slug: decode_column("slug", AwardSlug::parse(&slug))?,
            name: row.try_get("name")?,
            needs_documents: row.try_get("needs_documents")?,
            allow_multiple_submissions: row.try_get("allow_multiple_submissions")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct PgAwardsProvider {
    db: Db,
}

impl PgAwardsProvider {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AwardsProvider for PgAwardsProvider {
    #[instrument(skip(self), fields(award = %award))]
    async fn award_settings(&self, award: &AwardSlug) -> Result<AwardSettings, AwardsProviderError> {
        let settings = query_as::<Postgres, AwardSettings>(GET_AWARD_SETTINGS_SQL)
            .bind(award.as_str())
            .fetch_one(self.db.pool())
            .await?;

        Ok(settings)
    }
}

#[automock]
#[async_trait]
pub trait AwardsProvider: Send + Sync {
    /// Look up the settings for one award.
    async fn award_settings(&self, award: &AwardSlug) -> Result<AwardSettings, AwardsProviderError>;
}
