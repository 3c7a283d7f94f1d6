use clap::Args;
use jiff::SignedDuration;
use nominate_app::{
    config::{CredentialPolicyConfig, DatabaseConfig},
    context::AppContext,
};

#[derive(Debug, Args)]
pub(crate) struct PurgeCredentialsArgs {
    #[command(flatten)]
    database: DatabaseConfig,

    #[command(flatten)]
    policy: CredentialPolicyConfig,

    /// Keep credentials that expired or were used within this many hours
    #[arg(long, default_value_t = 24)]
    older_than_hours: u32,
}

pub(crate) async fn run(args: PurgeCredentialsArgs) -> Result<(), String> {
    let ctx = AppContext::from_config(&args.database, &args.policy)
        .await
        .map_err(|error| format!("failed to initialise: {error}"))?;

    let purged = ctx
        .credentials
        .purge_stale(SignedDuration::from_hours(i64::from(args.older_than_hours)))
        .await
        .map_err(|error| format!("failed to purge credentials: {error}"))?;

    println!("purged: {purged}");

    Ok(())
}
