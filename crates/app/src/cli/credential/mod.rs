use clap::{Args, Subcommand, ValueEnum};
use nominate_app::domain::credentials::secret::CredentialKind;

mod issue;
mod purge;
mod verify;

#[derive(Debug, Args)]
pub(crate) struct CredentialCommand {
    #[command(subcommand)]
    command: CredentialSubcommand,
}

#[derive(Debug, Subcommand)]
enum CredentialSubcommand {
    /// Issue a verification credential, superseding any outstanding one
    Issue(issue::IssueCredentialArgs),

    /// Redeem a submitted secret
    Verify(verify::VerifyCredentialArgs),

    /// Delete long-dead credentials
    Purge(purge::PurgeCredentialsArgs),
}

/// Credential kind as spelled on the command line.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub(crate) enum KindArg {
    Code,
    MagicLink,
}

impl From<KindArg> for CredentialKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Code => Self::Code,
            KindArg::MagicLink => Self::MagicLink,
        }
    }
}

pub(crate) async fn run(command: CredentialCommand) -> Result<(), String> {
    match command.command {
        CredentialSubcommand::Issue(args) => issue::run(args).await,
        CredentialSubcommand::Verify(args) => verify::run(args).await,
        CredentialSubcommand::Purge(args) => purge::run(args).await,
    }
}
