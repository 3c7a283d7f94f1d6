use clap::Args;
use nominate_app::{
    config::{CredentialPolicyConfig, DatabaseConfig},
    context::AppContext,
    domain::nominations::records::{NominationUuid, Step},
};
use uuid::Uuid;

#[derive(Debug, Args)]
pub(crate) struct CompleteStepArgs {
    #[command(flatten)]
    database: DatabaseConfig,

    #[command(flatten)]
    policy: CredentialPolicyConfig,

    /// Nomination UUID
    #[arg(long)]
    nomination: Uuid,

    /// Step to mark done (nominator, nominee, questionnaire, documents)
    #[arg(long)]
    step: String,
}

pub(crate) async fn run(args: CompleteStepArgs) -> Result<(), String> {
    let step = args
        .step
        .parse::<Step>()
        .map_err(|error| error.to_string())?;

    let ctx = AppContext::from_config(&args.database, &args.policy)
        .await
        .map_err(|error| format!("failed to initialise: {error}"))?;

    let nomination = ctx
        .nominations
        .mark_step_complete(NominationUuid::from_uuid(args.nomination), step)
        .await
        .map_err(|error| format!("failed to complete step: {error}"))?;

    println!("nomination_slug: {}", nomination.slug);
    println!("status: {}", nomination.status);
    println!("current_step: {}", nomination.current_step);

    if let Some(completed_at) = nomination.completed_at {
        println!("completed_at: {completed_at}");
    }

    Ok(())
}
