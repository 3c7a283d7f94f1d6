use clap::{Args, Subcommand};

mod complete_step;
mod start;

#[derive(Debug, Args)]
pub(crate) struct NominationCommand {
    #[command(subcommand)]
    command: NominationSubcommand,
}

#[derive(Debug, Subcommand)]
enum NominationSubcommand {
    /// Resume the in-progress nomination for an award and email, or start one
    Start(start::StartNominationArgs),

    /// Mark a workflow step as done
    CompleteStep(complete_step::CompleteStepArgs),
}

pub(crate) async fn run(command: NominationCommand) -> Result<(), String> {
    match command.command {
        NominationSubcommand::Start(args) => start::run(args).await,
        NominationSubcommand::CompleteStep(args) => complete_step::run(args).await,
    }
}
