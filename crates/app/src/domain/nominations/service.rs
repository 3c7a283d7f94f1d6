//! Nominations service.

use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use sqlx::Connection;
use tracing::{debug, info, instrument, warn};

use crate::{
    clock::Clock,
    database::Db,
    domain::{
        awards::AwardsProvider,
        identity::{AwardSlug, IdentityPair},
        nominations::{
            data::{FindOrCreateOutcome, NewNomination},
            errors::{NominationsServiceError, is_slug_collision},
            records::{Nomination, NominationUuid, Step, StepProgress},
            repository::PgNominationsRepository,
        },
        slugs::nomination_slug,
    },
};

/// Slug allocation attempts before giving up with [`NominationsServiceError::SlugCollision`].
pub const MAX_SLUG_ATTEMPTS: usize = 3;

/// Produces a candidate public slug for a new nomination of the given award.
pub type SlugGenerator = Arc<dyn Fn(&AwardSlug) -> String + Send + Sync>;

#[derive(Clone)]
pub struct PgNominationsService {
    db: Db,
    repository: PgNominationsRepository,
    awards: Arc<dyn AwardsProvider>,
    clock: Arc<dyn Clock>,
    slugs: SlugGenerator,
}

impl PgNominationsService {
    #[must_use]
    pub fn new(db: Db, awards: Arc<dyn AwardsProvider>, clock: Arc<dyn Clock>) -> Self {
        Self {
            db,
            repository: PgNominationsRepository::new(),
            awards,
            clock,
            slugs: Arc::new(nomination_slug),
        }
    }

    #[must_use]
    pub fn with_slug_generator(mut self, slugs: SlugGenerator) -> Self {
        self.slugs = slugs;
        self
    }

    async fn in_progress(
        &self,
        identity: &IdentityPair,
    ) -> Result<Option<Nomination>, NominationsServiceError> {
        let mut tx = self.db.begin().await?;

        let existing = self.repository.find_in_progress(&mut tx, identity).await?;

        tx.commit().await?;

        Ok(existing)
    }

    /// Resume or create. `needs_documents` of `None` takes the award's own setting.
    ///
    /// Holds no transaction while the award provider runs.
    async fn find_or_start(
        &self,
        identity: IdentityPair,
        needs_documents: Option<bool>,
    ) -> Result<FindOrCreateOutcome, NominationsServiceError> {
        if let Some(existing) = self.in_progress(&identity).await? {
            debug!(nomination = %existing.uuid, "resumed in-progress nomination");

            return Ok(FindOrCreateOutcome::Resumed(existing));
        }

        let settings = self.awards.award_settings(&identity.award).await?;
        let needs_documents = needs_documents.unwrap_or(settings.needs_documents);

        let mut tx = self.db.begin().await?;

        if !settings.allow_multiple_submissions
            && self.repository.completed_exists(&mut tx, &identity).await?
        {
            tx.commit().await?;

            info!(
                email = %identity.email.masked(),
                "nomination already submitted for single-submission award"
            );

            return Ok(FindOrCreateOutcome::AlreadySubmitted);
        }

        let now = self.clock.now();

        for attempt in 1..=MAX_SLUG_ATTEMPTS {
            let candidate = NewNomination {
                uuid: NominationUuid::new(),
                slug: (self.slugs)(&identity.award),
                award: identity.award.clone(),
                email: identity.email.clone(),
                progress: StepProgress::new(needs_documents),
                created_at: now,
            };

            // A failed statement aborts the enclosing transaction, so each attempt gets a
            // savepoint it can roll back to.
            let mut savepoint = Connection::begin(&mut *tx).await?;

            let inserted = match self
                .repository
                .create_nomination(&mut savepoint, &candidate)
                .await
            {
                Ok(inserted) => inserted,
                Err(error) if is_slug_collision(&error) => {
                    savepoint.rollback().await?;

                    warn!(attempt, slug = %candidate.slug, "nomination slug collision");

                    continue;
                }
                Err(error) => return Err(error.into()),
            };

            savepoint.commit().await?;

            if let Some(created) = inserted {
                tx.commit().await?;

                info!(
                    nomination = %created.uuid,
                    slug = %created.slug,
                    email = %created.email.masked(),
                    "created nomination"
                );

                return Ok(FindOrCreateOutcome::Created(created));
            }

            // Lost the race to a concurrent creator; its row is committed and visible now.
            if let Some(winner) = self.repository.find_in_progress(&mut tx, &identity).await? {
                tx.commit().await?;

                debug!(nomination = %winner.uuid, "resumed concurrently created nomination");

                return Ok(FindOrCreateOutcome::Resumed(winner));
            }
        }

        Err(NominationsServiceError::SlugCollision)
    }
}

#[async_trait]
impl NominationsService for PgNominationsService {
    #[instrument(skip_all, fields(award = %award))]
    async fn find_or_create(
        &self,
        award: &str,
        email: &str,
        needs_documents: bool,
    ) -> Result<FindOrCreateOutcome, NominationsServiceError> {
        let identity = IdentityPair::parse(award, email)?;

        self.find_or_start(identity, Some(needs_documents)).await
    }

    #[instrument(skip_all, fields(award = %award))]
    async fn start(
        &self,
        award: &str,
        email: &str,
    ) -> Result<FindOrCreateOutcome, NominationsServiceError> {
        let identity = IdentityPair::parse(award, email)?;

        self.find_or_start(identity, None).await
    }

    #[instrument(skip_all, fields(nomination = %nomination, step = %step))]
    async fn mark_step_complete(
        &self,
        nomination: NominationUuid,
        step: Step,
    ) -> Result<Nomination, NominationsServiceError> {
        let mut tx = self.db.begin().await?;

        let current = self.repository.lock_nomination(&mut tx, nomination).await?;

        let mut progress = current.progress;
        progress.complete(step)?;

        let next = progress.next_step();

        let updated = self
            .repository
            .update_progress(&mut tx, nomination, &progress, next, self.clock.now())
            .await?;

        tx.commit().await?;

        if updated.is_completed() && !current.is_completed() {
            info!(slug = %updated.slug, "nomination completed");
        } else {
            debug!(next_step = %next, "nomination step completed");
        }

        Ok(updated)
    }

    async fn get_nomination(
        &self,
        nomination: NominationUuid,
    ) -> Result<Nomination, NominationsServiceError> {
        let mut tx = self.db.begin().await?;

        let found = self.repository.get_nomination(&mut tx, nomination).await?;

        tx.commit().await?;

        Ok(found)
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Nomination, NominationsServiceError> {
        let mut tx = self.db.begin().await?;

        let found = self.repository.find_by_slug(&mut tx, slug.trim()).await?;

        tx.commit().await?;

        Ok(found)
    }
}

#[automock]
#[async_trait]
pub trait NominationsService: Send + Sync {
    /// Return the identity's in-progress nomination, or start a new one.
    ///
    /// When the award allows a single submission and one is already completed, nothing is
    /// created and [`FindOrCreateOutcome::AlreadySubmitted`] is returned.
    async fn find_or_create(
        &self,
        award: &str,
        email: &str,
        needs_documents: bool,
    ) -> Result<FindOrCreateOutcome, NominationsServiceError>;

    /// [`find_or_create`](Self::find_or_create) with `needs_documents` read from the award.
    async fn start(
        &self,
        award: &str,
        email: &str,
    ) -> Result<FindOrCreateOutcome, NominationsServiceError>;

    /// Record `step` as done and advance the cached current step.
    async fn mark_step_complete(
        &self,
        nomination: NominationUuid,
        step: Step,
    ) -> Result<Nomination, NominationsServiceError>;

    async fn get_nomination(
        &self,
        nomination: NominationUuid,
    ) -> Result<Nomination, NominationsServiceError>;

    async fn find_by_slug(&self, slug: &str) -> Result<Nomination, NominationsServiceError>;
}

#[cfg(test)]
mod tests {
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };

    use jiff::SignedDuration;
    use sqlx::postgres::PgPoolOptions;
    use testresult::TestResult;

    use crate::{
        domain::{
            awards::{AwardSettings, MockAwardsProvider, PgAwardsProvider},
            credentials::{CredentialsService, data::CredentialRequest},
            nominations::{
                compute_next_step,
                records::{NominationStatus, StepError},
            },
        },
        test::{TestContext, helpers::create_award},
    };

    use super::*;

    const AWARD: &str = "best-team-2025";
    const EMAIL: &str = "a@x.com";

    async fn created(ctx: &TestContext, needs_documents: bool) -> TestResult<Nomination> {
        match ctx
            .nominations
            .find_or_create(AWARD, EMAIL, needs_documents)
            .await?
        {
            FindOrCreateOutcome::Created(nomination) => Ok(nomination),
            other => Err(format!("expected Created, got {other:?}").into()),
        }
    }

    #[tokio::test]
    async fn new_nomination_starts_at_nominator() -> TestResult {
        let ctx = TestContext::new().await;

        create_award(&ctx, AWARD, true, false).await?;

        let nomination = created(&ctx, true).await?;

        assert_eq!(nomination.status, NominationStatus::InProgress);
        assert_eq!(nomination.current_step, Step::Nominator);
        assert!(nomination.slug.starts_with("best-team-2025-"));
        assert_eq!(nomination.progress, StepProgress::new(true));
        assert_eq!(nomination.completed_at, None);

        Ok(())
    }

    #[tokio::test]
    async fn existing_in_progress_nomination_is_resumed_unchanged() -> TestResult {
        let ctx = TestContext::new().await;

        create_award(&ctx, AWARD, true, false).await?;

        let first = created(&ctx, true).await?;

        ctx.clock.advance(SignedDuration::from_mins(5));

        let outcome = ctx
            .nominations
            .find_or_create(AWARD, " A@X.com", false)
            .await?;

        assert_eq!(outcome, FindOrCreateOutcome::Resumed(first));

        Ok(())
    }

    #[tokio::test]
    async fn concurrent_creators_share_one_nomination() -> TestResult {
        let ctx = TestContext::new().await;

        create_award(&ctx, AWARD, false, false).await?;

        let creators: Vec<_> = (0..6)
            .map(|_| {
                let service = ctx.nominations.clone();

                tokio::spawn(async move { service.find_or_create(AWARD, EMAIL, false).await })
            })
            .collect();

        let mut uuids = Vec::new();

        for creator in creators {
            let outcome = creator.await??;

            let nomination = outcome
                .into_nomination()
                .ok_or("expected a nomination to continue")?;

            uuids.push(nomination.uuid);
        }

        uuids.dedup();

        assert_eq!(uuids.len(), 1, "all callers must see the same nomination");

        let in_progress: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM nominations WHERE status = 'in_progress'",
        )
        .fetch_one(ctx.db.pool())
        .await?;

        assert_eq!(in_progress, 1);

        Ok(())
    }

    #[tokio::test]
    async fn steps_advance_in_order_with_documents() -> TestResult {
        let ctx = TestContext::new().await;

        create_award(&ctx, AWARD, true, false).await?;

        let nomination = created(&ctx, true).await?;

        let expected = [
            (Step::Nominator, Step::Nominee),
            (Step::Nominee, Step::Questionnaire),
            (Step::Questionnaire, Step::Documents),
            (Step::Documents, Step::Success),
        ];

        for (completed, next) in expected {
            let updated = ctx
                .nominations
                .mark_step_complete(nomination.uuid, completed)
                .await?;

            assert_eq!(updated.current_step, next, "after completing {completed}");
        }

        let finished = ctx.nominations.get_nomination(nomination.uuid).await?;

        assert_eq!(finished.status, NominationStatus::Completed);
        assert_eq!(finished.completed_at, Some(ctx.clock.now()));

        Ok(())
    }

    #[tokio::test]
    async fn questionnaire_completes_when_documents_are_not_needed() -> TestResult {
        let ctx = TestContext::new().await;

        create_award(&ctx, AWARD, false, false).await?;

        let nomination = created(&ctx, false).await?;

        for step in [Step::Nominator, Step::Nominee] {
            ctx.nominations
                .mark_step_complete(nomination.uuid, step)
                .await?;
        }

        let finished = ctx
            .nominations
            .mark_step_complete(nomination.uuid, Step::Questionnaire)
            .await?;

        assert_eq!(finished.current_step, Step::Success);
        assert!(finished.is_completed());

        Ok(())
    }

    #[tokio::test]
    async fn out_of_order_completion_keeps_earliest_gap() -> TestResult {
        let ctx = TestContext::new().await;

        create_award(&ctx, AWARD, true, false).await?;

        let nomination = created(&ctx, true).await?;

        let updated = ctx
            .nominations
            .mark_step_complete(nomination.uuid, Step::Questionnaire)
            .await?;

        assert_eq!(updated.current_step, Step::Nominator);
        assert!(updated.progress.questionnaire_done);

        Ok(())
    }

    #[tokio::test]
    async fn completion_is_not_regressed_by_repeat_calls() -> TestResult {
        let ctx = TestContext::new().await;

        create_award(&ctx, AWARD, false, false).await?;

        let nomination = created(&ctx, false).await?;

        for step in [Step::Nominator, Step::Nominee, Step::Questionnaire] {
            ctx.nominations
                .mark_step_complete(nomination.uuid, step)
                .await?;
        }

        let completed_at = ctx.clock.now();

        ctx.clock.advance(SignedDuration::from_hours(1));

        let repeated = ctx
            .nominations
            .mark_step_complete(nomination.uuid, Step::Nominee)
            .await?;

        assert_eq!(repeated.status, NominationStatus::Completed);
        assert_eq!(repeated.completed_at, Some(completed_at));
        assert!(repeated.progress.nominee_done);

        Ok(())
    }

    #[tokio::test]
    async fn success_is_not_a_completable_step() -> TestResult {
        let ctx = TestContext::new().await;

        create_award(&ctx, AWARD, true, false).await?;

        let nomination = created(&ctx, true).await?;

        let result = ctx
            .nominations
            .mark_step_complete(nomination.uuid, Step::Success)
            .await;

        assert!(
            matches!(
                result,
                Err(NominationsServiceError::InvalidStep(StepError::NotCompletable(
                    Step::Success
                )))
            ),
            "expected InvalidStep, got {result:?}"
        );

        let unchanged = ctx.nominations.get_nomination(nomination.uuid).await?;

        assert_eq!(unchanged, nomination);

        Ok(())
    }

    #[tokio::test]
    async fn unknown_nomination_is_not_found() {
        let ctx = TestContext::new().await;

        let result = ctx
            .nominations
            .mark_step_complete(NominationUuid::new(), Step::Nominator)
            .await;

        assert!(
            matches!(result, Err(NominationsServiceError::NotFound)),
            "expected NotFound, got {result:?}"
        );

        let result = ctx.nominations.find_by_slug("best-team-2025-missing").await;

        assert!(
            matches!(result, Err(NominationsServiceError::NotFound)),
            "expected NotFound, got {result:?}"
        );
    }

    #[tokio::test]
    async fn single_submission_award_blocks_second_nomination() -> TestResult {
        let ctx = TestContext::new().await;

        create_award(&ctx, AWARD, false, false).await?;

        let nomination = created(&ctx, false).await?;

        for step in [Step::Nominator, Step::Nominee, Step::Questionnaire] {
            ctx.nominations
                .mark_step_complete(nomination.uuid, step)
                .await?;
        }

        let outcome = ctx.nominations.find_or_create(AWARD, EMAIL, false).await?;

        assert_eq!(outcome, FindOrCreateOutcome::AlreadySubmitted);

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM nominations")
            .fetch_one(ctx.db.pool())
            .await?;

        assert_eq!(total, 1);

        Ok(())
    }

    #[tokio::test]
    async fn multiple_submission_award_starts_a_fresh_nomination() -> TestResult {
        let ctx = TestContext::new().await;

        create_award(&ctx, AWARD, false, true).await?;

        let first = created(&ctx, false).await?;

        for step in [Step::Nominator, Step::Nominee, Step::Questionnaire] {
            ctx.nominations.mark_step_complete(first.uuid, step).await?;
        }

        let second = created(&ctx, false).await?;

        assert_ne!(second.uuid, first.uuid);
        assert_ne!(second.slug, first.slug);
        assert_eq!(second.current_step, Step::Nominator);

        Ok(())
    }

    #[tokio::test]
    async fn unknown_award_is_reported() {
        let ctx = TestContext::new().await;

        let result = ctx.nominations.find_or_create("no-such-award", EMAIL, false).await;

        assert!(
            matches!(result, Err(NominationsServiceError::AwardNotFound)),
            "expected AwardNotFound, got {result:?}"
        );
    }

    #[tokio::test]
    async fn slug_lookup_returns_the_nomination() -> TestResult {
        let ctx = TestContext::new().await;

        create_award(&ctx, AWARD, true, false).await?;

        let nomination = created(&ctx, true).await?;

        let found = ctx.nominations.find_by_slug(&nomination.slug).await?;

        assert_eq!(found, nomination);

        Ok(())
    }

    fn scripted_slugs(slugs: &[&str]) -> SlugGenerator {
        let slugs: Vec<String> = slugs.iter().map(ToString::to_string).collect();
        let next = AtomicUsize::new(0);

        Arc::new(move |_award: &AwardSlug| {
            let index = next.fetch_add(1, Ordering::SeqCst).min(slugs.len() - 1);

            slugs[index].clone()
        })
    }

    fn scripted_service(ctx: &TestContext, slugs: &[&str]) -> PgNominationsService {
        ctx.nominations.clone().with_slug_generator(scripted_slugs(slugs))
    }

    #[tokio::test]
    async fn colliding_slug_is_retried_with_a_new_candidate() -> TestResult {
        let ctx = TestContext::new().await;

        create_award(&ctx, AWARD, false, true).await?;

        scripted_service(&ctx, &["best-team-2025-taken"])
            .find_or_create(AWARD, "other@x.com", false)
            .await?;

        let outcome = scripted_service(&ctx, &["best-team-2025-taken", "best-team-2025-fresh"])
            .find_or_create(AWARD, EMAIL, false)
            .await?;

        let FindOrCreateOutcome::Created(nomination) = outcome else {
            return Err(format!("expected Created, got {outcome:?}").into());
        };

        assert_eq!(nomination.slug, "best-team-2025-fresh");
        assert_eq!(nomination.email.as_str(), EMAIL);

        Ok(())
    }

    #[tokio::test]
    async fn slug_collision_is_reported_after_every_attempt_fails() -> TestResult {
        let ctx = TestContext::new().await;

        create_award(&ctx, AWARD, false, true).await?;

        scripted_service(&ctx, &["best-team-2025-taken"])
            .find_or_create(AWARD, "other@x.com", false)
            .await?;

        let attempts = Arc::new(AtomicUsize::new(0));
        let counted = attempts.clone();

        let service = ctx
            .nominations
            .clone()
            .with_slug_generator(Arc::new(move |_award: &AwardSlug| {
                counted.fetch_add(1, Ordering::SeqCst);

                "best-team-2025-taken".to_string()
            }));

        let result = service.find_or_create(AWARD, EMAIL, false).await;

        assert!(
            matches!(result, Err(NominationsServiceError::SlugCollision)),
            "expected SlugCollision, got {result:?}"
        );
        assert_eq!(attempts.load(Ordering::SeqCst), MAX_SLUG_ATTEMPTS);

        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM nominations WHERE email = $1")
            .bind(EMAIL)
            .fetch_one(ctx.db.pool())
            .await?;

        assert_eq!(rows, 0);

        Ok(())
    }

    #[tokio::test]
    async fn creation_holds_one_connection_at_a_time() -> TestResult {
        let ctx = TestContext::new().await;

        create_award(&ctx, AWARD, false, false).await?;

        let pool = PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(3))
            .connect_with((*ctx.db.pool().connect_options()).clone())
            .await?;

        let db = Db::new(pool);

        let service = PgNominationsService::new(
            db.clone(),
            Arc::new(PgAwardsProvider::new(db.clone())),
            ctx.clock.clone(),
        );

        let starters: Vec<_> = (0..4)
            .map(|i| {
                let service = service.clone();

                tokio::spawn(async move {
                    service
                        .find_or_create(AWARD, &format!("u{i}@x.com"), false)
                        .await
                })
            })
            .collect();

        for starter in starters {
            let outcome = starter.await??;

            assert!(
                matches!(outcome, FindOrCreateOutcome::Created(_)),
                "expected Created, got {outcome:?}"
            );
        }

        db.pool().close().await;

        Ok(())
    }

    #[tokio::test]
    async fn start_reads_award_settings_once() -> TestResult {
        let ctx = TestContext::new().await;

        let mut awards = MockAwardsProvider::new();

        awards.expect_award_settings().times(1).returning(|award| {
            Ok(AwardSettings {
                slug: award.clone(),
                name: "Best Team".to_string(),
                needs_documents: true,
                allow_multiple_submissions: false,
            })
        });

        let service = PgNominationsService::new(
            Db::new(ctx.db.pool().clone()),
            Arc::new(awards),
            ctx.clock.clone(),
        );

        let FindOrCreateOutcome::Created(nomination) = service.start(AWARD, EMAIL).await? else {
            return Err("expected a new nomination".into());
        };

        assert_eq!(nomination.progress, StepProgress::new(true));

        let resumed = service.start(AWARD, EMAIL).await?;

        assert_eq!(resumed, FindOrCreateOutcome::Resumed(nomination));

        Ok(())
    }

    #[tokio::test]
    async fn concurrent_step_completions_are_all_kept() -> TestResult {
        let ctx = TestContext::new().await;

        create_award(&ctx, AWARD, true, false).await?;

        let nomination = created(&ctx, true).await?;

        let uuid = nomination.uuid;
        let steps = [Step::Nominator, Step::Nominee, Step::Questionnaire, Step::Documents];

        let writers: Vec<_> = steps
            .into_iter()
            .map(|step| {
                let service = ctx.nominations.clone();

                tokio::spawn(async move { service.mark_step_complete(uuid, step).await })
            })
            .collect();

        let mut completions = 0;

        for writer in writers {
            if writer.await??.is_completed() {
                completions += 1;
            }
        }

        assert_eq!(completions, 1, "exactly one writer observes the completion");

        let finished = ctx.nominations.get_nomination(uuid).await?;

        for step in steps {
            assert!(finished.progress.is_done(step), "{step} lost by a concurrent write");
        }

        assert_eq!(finished.current_step, compute_next_step(&finished.progress));
        assert_eq!(finished.current_step, Step::Success);
        assert_eq!(finished.status, NominationStatus::Completed);
        assert_eq!(finished.completed_at, Some(ctx.clock.now()));

        Ok(())
    }

    #[tokio::test]
    async fn verified_identity_drives_nomination_to_completion() -> TestResult {
        let ctx = TestContext::new().await;

        create_award(&ctx, AWARD, true, false).await?;

        let issued = ctx
            .credentials
            .issue(CredentialRequest::code(AWARD, EMAIL))
            .await?;

        ctx.clock.advance(SignedDuration::from_mins(3));

        let identity = ctx
            .credentials
            .verify(AWARD, EMAIL, issued.secret.expose())
            .await?
            .require_valid()?;

        let nomination = created(&ctx, true).await?;

        assert_eq!(nomination.award, identity.award);
        assert_eq!(nomination.email, identity.email);
        assert_eq!(nomination.current_step, Step::Nominator);

        let expected = [
            (Step::Nominator, Step::Nominee),
            (Step::Nominee, Step::Questionnaire),
            (Step::Questionnaire, Step::Documents),
        ];

        for (completed, next) in expected {
            let updated = ctx
                .nominations
                .mark_step_complete(nomination.uuid, completed)
                .await?;

            assert_eq!(updated.current_step, next, "after completing {completed}");
            assert_eq!(updated.completed_at, None);
        }

        ctx.clock.advance(SignedDuration::from_mins(10));

        let finished = ctx
            .nominations
            .mark_step_complete(nomination.uuid, Step::Documents)
            .await?;

        assert_eq!(finished.status, NominationStatus::Completed);
        assert_eq!(finished.current_step, Step::Success);
        assert_eq!(finished.completed_at, Some(ctx.clock.now()));

        let replay = ctx
            .credentials
            .verify(AWARD, EMAIL, issued.secret.expose())
            .await?;

        assert!(!replay.is_valid(), "redeemed credential must not work twice");

        let again = ctx.nominations.find_or_create(AWARD, EMAIL, true).await?;

        assert_eq!(again, FindOrCreateOutcome::AlreadySubmitted);

        Ok(())
    }
}
