use std::sync::Arc;

use clap::Args;
use nominate_app::{
    config::{CredentialPolicyConfig, DatabaseConfig, MailConfig},
    context::AppContext,
    domain::credentials::{
        CredentialDelivery,
        data::{ClientInfo, CredentialRequest},
    },
    mail::MailgunMailer,
};

use super::KindArg;

#[derive(Debug, Args)]
pub(crate) struct IssueCredentialArgs {
    #[command(flatten)]
    database: DatabaseConfig,

    #[command(flatten)]
    policy: CredentialPolicyConfig,

    #[command(flatten)]
    mail: MailConfig,

    /// Award slug the credential is scoped to
    #[arg(long)]
    award: String,

    /// Recipient email address
    #[arg(long)]
    email: String,

    /// Credential kind
    #[arg(long, value_enum, default_value_t = KindArg::Code)]
    kind: KindArg,

    /// Mail the credential instead of printing it
    #[arg(long)]
    send: bool,

    /// Requesting client address to record with the credential
    #[arg(long)]
    ip: Option<String>,
}

pub(crate) async fn run(args: IssueCredentialArgs) -> Result<(), String> {
    let ctx = AppContext::from_config(&args.database, &args.policy)
        .await
        .map_err(|error| format!("failed to initialise: {error}"))?;

    let client = ClientInfo {
        ip: args.ip,
        user_agent: Some(format!("nominate-app/{}", env!("CARGO_PKG_VERSION"))),
    };

    if args.send {
        let mailgun = args.mail.mailgun().map_err(|error| error.to_string())?;
        let base_url = args.mail.public_base_url().map_err(|error| error.to_string())?;

        let delivery = CredentialDelivery::new(
            ctx.credentials.clone(),
            Arc::new(MailgunMailer::new(mailgun)),
            base_url,
        );

        let receipt = delivery
            .deliver(&args.award, &args.email, args.kind.into(), client)
            .await
            .map_err(|error| format!("failed to deliver credential: {error}"))?;

        println!("credential_uuid: {}", receipt.credential);
        println!("kind: {}", receipt.kind);
        println!("sent_to: {}", receipt.masked_email);
        println!("expires_at: {}", receipt.expires_at);

        return Ok(());
    }

    let issued = ctx
        .credentials
        .issue(
            CredentialRequest::code(&args.award, &args.email)
                .with_kind(args.kind.into())
                .with_client(client),
        )
        .await
        .map_err(|error| format!("failed to issue credential: {error}"))?;

    println!("credential_uuid: {}", issued.record.uuid);
    println!("kind: {}", issued.record.kind);
    println!("expires_at: {}", issued.record.expires_at);
    println!("superseded: {}", issued.superseded);
    println!("secret: {}", issued.secret.expose());
    println!("deliver this secret now; it is only shown once");

    Ok(())
}
