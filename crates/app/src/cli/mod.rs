use clap::{Parser, Subcommand};
use nominate_app::{config::LoggingConfig, observability};

mod credential;
mod db;
mod nomination;

#[derive(Debug, Parser)]
#[command(name = "nominate-app", about = "Nomination engine CLI", long_about = None)]
pub(crate) struct Cli {
    #[command(flatten)]
    logging: LoggingConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Credential(credential::CredentialCommand),
    Nomination(nomination::NominationCommand),
    Db(db::DbCommand),
}

impl Cli {
    pub(crate) async fn run(self) -> Result<(), String> {
        observability::init_logging(&self.logging)
            .map_err(|error| format!("failed to initialise logging: {error}"))?;

        match self.command {
            Commands::Credential(command) => credential::run(command).await,
            Commands::Nomination(command) => nomination::run(command).await,
            Commands::Db(command) => db::run(command).await,
        }
    }
}
