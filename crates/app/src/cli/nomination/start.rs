use clap::Args;
use nominate_app::{
    config::{CredentialPolicyConfig, DatabaseConfig, ResumeConfig},
    context::AppContext,
    domain::nominations::data::FindOrCreateOutcome,
};

#[derive(Debug, Args)]
pub(crate) struct StartNominationArgs {
    #[command(flatten)]
    database: DatabaseConfig,

    #[command(flatten)]
    policy: CredentialPolicyConfig,

    #[command(flatten)]
    resume: ResumeConfig,

    /// Award slug
    #[arg(long)]
    award: String,

    /// Verified email address
    #[arg(long)]
    email: String,
}

pub(crate) async fn run(args: StartNominationArgs) -> Result<(), String> {
    let ctx = AppContext::from_config(&args.database, &args.policy)
        .await
        .map_err(|error| format!("failed to initialise: {error}"))?;

    let outcome = ctx
        .nominations
        .start(&args.award, &args.email)
        .await
        .map_err(|error| format!("failed to start nomination: {error}"))?;

    let (label, nomination) = match outcome {
        FindOrCreateOutcome::Created(nomination) => ("created", nomination),
        FindOrCreateOutcome::Resumed(nomination) => ("resumed", nomination),
        FindOrCreateOutcome::AlreadySubmitted => {
            println!("outcome: already_submitted");
            return Ok(());
        }
    };

    println!("outcome: {label}");
    println!("nomination_uuid: {}", nomination.uuid);
    println!("nomination_slug: {}", nomination.slug);
    println!("current_step: {}", nomination.current_step);

    if args.resume.resume_token_secret.is_some() {
        let signer = args.resume.signer().map_err(|error| error.to_string())?;

        let token = signer
            .issue(&nomination, ctx.clock.now())
            .map_err(|error| format!("failed to sign resume token: {error}"))?;

        println!("resume_token: {token}");
    }

    Ok(())
}
