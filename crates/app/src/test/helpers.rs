//! Test Helpers

use crate::test::TestContext;

/// Insert an award row; awards are administered outside this crate.
pub(crate) async fn create_award(
    ctx: &TestContext,
    slug: &str,
    needs_documents: bool,
    allow_multiple_submissions: bool,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO awards (slug, name, needs_documents, allow_multiple_submissions) \
         VALUES ($1, $1, $2, $3)",
    )
    .bind(slug)
    .bind(needs_documents)
    .bind(allow_multiple_submissions)
    .execute(ctx.db.pool())
    .await?;

    Ok(())
}
