//! App Context

use std::sync::Arc;

use thiserror::Error;

use crate::{
    clock::{Clock, SystemClock},
    config::{ConfigError, CredentialPolicyConfig, DatabaseConfig},
    database::{self, Db},
    domain::{
        awards::{AwardsProvider, PgAwardsProvider},
        credentials::{CredentialsService, PgCredentialsService, data::CredentialPolicy},
        nominations::{NominationsService, PgNominationsService},
    },
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to connect to database")]
    Database(#[source] sqlx::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Clone)]
pub struct AppContext {
    pub db: Db,
    pub clock: Arc<dyn Clock>,
    pub awards: Arc<dyn AwardsProvider>,
    pub credentials: Arc<dyn CredentialsService>,
    pub nominations: Arc<dyn NominationsService>,
}

impl AppContext {
    /// Wire the services against an existing pool.
    #[must_use]
    pub fn new(
        db: Db,
        clock: Arc<dyn Clock>,
        policy: CredentialPolicy,
    ) -> Self {
        let awards: Arc<dyn AwardsProvider> = Arc::new(PgAwardsProvider::new(db.clone()));

        Self {
            credentials: Arc::new(PgCredentialsService::new(db.clone(), clock.clone(), policy)),
            nominations: Arc::new(PgNominationsService::new(
                db.clone(),
                awards.clone(),
                clock.clone(),
            )),
            awards,
            clock,
            db,
        }
    }

    /// Build application context from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when the policy settings are invalid or the database is unreachable.
    pub async fn from_config(
        database: &DatabaseConfig,
        policy: &CredentialPolicyConfig,
    ) -> Result<Self, AppInitError> {
        let policy = policy.policy()?;

        let pool = database::connect(&database.database_url)
            .await
            .map_err(AppInitError::Database)?;

        Ok(Self::new(Db::new(pool), Arc::new(SystemClock), policy))
    }
}
