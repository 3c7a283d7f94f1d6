use clap::Args;
use nominate_app::{
    config::{CredentialPolicyConfig, DatabaseConfig},
    context::AppContext,
};

#[derive(Debug, Args)]
pub(crate) struct VerifyCredentialArgs {
    #[command(flatten)]
    database: DatabaseConfig,

    #[command(flatten)]
    policy: CredentialPolicyConfig,

    /// Award slug the credential is scoped to
    #[arg(long)]
    award: String,

    /// Email address the credential was issued to
    #[arg(long)]
    email: String,

    /// Code or magic-link token as submitted
    #[arg(long)]
    secret: String,
}

pub(crate) async fn run(args: VerifyCredentialArgs) -> Result<(), String> {
    let ctx = AppContext::from_config(&args.database, &args.policy)
        .await
        .map_err(|error| format!("failed to initialise: {error}"))?;

    let identity = ctx
        .credentials
        .verify(&args.award, &args.email, &args.secret)
        .await
        .map_err(|error| format!("failed to verify credential: {error}"))?
        .require_valid()
        .map_err(|error| error.to_string())?;

    println!("credential_uuid: {}", identity.credential);
    println!("award: {}", identity.award);
    println!("email: {}", identity.email);
    println!("redeemed_at: {}", identity.redeemed_at);

    Ok(())
}
