use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use super::context::CliContext;
use super::output::{print, OutputFormat};
use crate::batch::run_batch;

#[derive(Args, Clone)]
pub struct BatchArgs {
    /// Directory holding `*.txt` input files (defaults to paths.input)
    #[arg(long)]
    pub input: Option<PathBuf>,
}

pub async fn cmd_batch(args: BatchArgs, ctx: &CliContext, format: &OutputFormat) -> Result<()> {
    let input = args.input.unwrap_or_else(|| ctx.config().paths.input.clone());
    let service = ctx.service().await?;
    let summary = run_batch(&service, &input).await?;
    print(format, &summary, || {
        format!(
            "{} processed ({} succeeded, {} failed), {} skipped",
            summary.processed, summary.succeeded, summary.failed, summary.skipped
        )
    })
}
