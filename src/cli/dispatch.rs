use super::batch::cmd_batch;
use super::bpm::cmd_bpm;
use super::env::CliArgs;
use super::process::cmd_process;
use super::serve::cmd_serve;
use crate::cli::commands::Commands;
use crate::cli::context::CliContext;
use anyhow::Result;

pub async fn dispatch(cli: &CliArgs, ctx: &CliContext) -> Result<()> {
    match cli.command.clone() {
        Commands::Serve(args) => cmd_serve(args, ctx).await,
        Commands::Process(args) => cmd_process(args, ctx, &cli.output).await,
        Commands::Batch(args) => cmd_batch(args, ctx, &cli.output).await,
        Commands::Bpm(args) => cmd_bpm(args, ctx, &cli.output).await,
    }
}
