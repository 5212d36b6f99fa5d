use anyhow::{bail, Result};
use clap::Args;
use disposition_flow::BpmLookupRequest;

use super::context::CliContext;
use super::output::{print, OutputFormat};

#[derive(Args, Clone)]
pub struct BpmArgs {
    /// Transaction reference
    #[arg(long, short = 't')]
    pub transaction: String,

    /// Market type, e.g. FEDWIRE or SEPA-Instant
    #[arg(long = "transaction-type")]
    pub transaction_type: Option<String>,
}

pub async fn cmd_bpm(args: BpmArgs, ctx: &CliContext, format: &OutputFormat) -> Result<()> {
    let service = ctx.service().await?;
    let request = BpmLookupRequest {
        transaction_id: args.transaction,
        market_type: args.transaction_type,
    };
    let response = service.lookup(&request).await;
    let row = &response.results.bmp_result;
    print(format, &response, || {
        format!("[{}] {}", row.status.as_str(), row.message)
    })?;
    if !response.is_ok() {
        bail!("BPM lookup failed: {}", row.message);
    }
    Ok(())
}
