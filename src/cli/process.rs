use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;
use firco_core_types::RawTransactionRequest;

use super::context::CliContext;
use super::output::{print, OutputFormat};
use crate::service::Processed;

#[derive(Args, Clone)]
pub struct ProcessArgs {
    /// Transaction identifier
    #[arg(long, short = 't', required_unless_present = "file")]
    pub transaction: Option<String>,

    /// STP-Release, Release, Block or Reject
    #[arg(long, short = 'a', default_value = "STP-Release")]
    pub action: String,

    /// Comment entered before acting
    #[arg(long)]
    pub comment: Option<String>,

    /// Market type used for the BPM fallback
    #[arg(long = "transaction-type")]
    pub transaction_type: Option<String>,

    /// Act on the most recent of several live matches
    #[arg(long)]
    pub perform_on_latest: bool,

    /// Search Live Messages again when the first pass finds nothing to do
    #[arg(long)]
    pub force_retry: bool,

    /// Read the request from an input file and archive it afterwards
    #[arg(long, conflicts_with = "transaction")]
    pub file: Option<PathBuf>,
}

impl ProcessArgs {
    fn raw(&self) -> RawTransactionRequest {
        RawTransactionRequest {
            transaction: self.transaction.clone().unwrap_or_default(),
            action: self.action.clone(),
            comment: self.comment.clone(),
            transaction_type: self.transaction_type.clone(),
            perform_on_latest: Some(self.perform_on_latest),
            force_retry: Some(self.force_retry),
        }
    }
}

pub async fn cmd_process(args: ProcessArgs, ctx: &CliContext, format: &OutputFormat) -> Result<()> {
    let service = ctx.service().await?;
    let processed = match &args.file {
        Some(file) => service.process_file(file).await?,
        None => service.process(&args.raw()).await,
    };
    report(&processed, format)
}

pub(crate) fn report(processed: &Processed, format: &OutputFormat) -> Result<()> {
    let report = &processed.report;
    print(format, report, || {
        let mut line = format!("[{}] {}", report.status_detail, report.message);
        if let Some(receipt) = &report.transaction_id {
            line.push_str(&format!(" (receipt {})", receipt));
        }
        if let Some(folder) = &processed.folder {
            line.push_str(&format!("\n  artifacts: {}", folder.display()));
        }
        line
    })?;
    if !report.success {
        bail!(
            "transaction finished with {} after {} attempt(s)",
            report.status_detail,
            processed.attempts
        );
    }
    Ok(())
}
