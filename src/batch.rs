//! File entry point
//!
//! An input file names one transaction, either one field per line
//! (identifier, action, comment) or as `identifier|action|comment`.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use firco_core_types::{DispositionAction, RawTransactionRequest};
use serde::Serialize;
use tracing::{error, info};

use crate::service::DispositionService;

pub fn parse_input(text: &str) -> Result<RawTransactionRequest> {
    let text = text.trim_start_matches('\u{feff}');
    let first = text.lines().map(str::trim).find(|line| !line.is_empty());
    let Some(first) = first else {
        bail!("input file is empty");
    };

    let (transaction, action, comment) = if first.contains('|') {
        let mut fields = first.splitn(3, '|').map(str::trim);
        (
            fields.next().unwrap_or_default().to_string(),
            fields.next().unwrap_or_default().to_string(),
            fields.next().unwrap_or_default().to_string(),
        )
    } else {
        let mut lines = text.lines().map(str::trim).skip_while(|line| line.is_empty());
        (
            lines.next().unwrap_or_default().to_string(),
            lines.next().unwrap_or_default().to_string(),
            lines.next().unwrap_or_default().to_string(),
        )
    };

    Ok(RawTransactionRequest {
        transaction,
        action: if action.is_empty() {
            DispositionAction::StpRelease.as_str().to_string()
        } else {
            action
        },
        comment: Some(comment).filter(|c| !c.is_empty()),
        ..RawTransactionRequest::default()
    })
}

/// Input files waiting in `dir`, oldest name first
pub async fn pending_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .with_context(|| format!("failed to read input directory {}", dir.display()))?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) == Some("txt") && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Process every pending input file, one at a time
pub async fn run_batch(service: &DispositionService, input: &Path) -> Result<BatchSummary> {
    let files = pending_files(input).await?;
    info!(dir = %input.display(), files = files.len(), "batch started");

    let mut summary = BatchSummary::default();
    for file in files {
        match service.process_file(&file).await {
            Ok(processed) => {
                summary.processed += 1;
                if processed.report.success {
                    summary.succeeded += 1;
                } else {
                    summary.failed += 1;
                }
            }
            Err(err) => {
                error!(file = %file.display(), "{:#}", err);
                summary.skipped += 1;
            }
        }
    }

    info!(?summary, "batch finished");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_per_field() {
        let raw = parse_input("TXN123\nBlock\nsanctions team approval\n").unwrap();
        assert_eq!(raw.transaction, "TXN123");
        assert_eq!(raw.action, "Block");
        assert_eq!(raw.comment.as_deref(), Some("sanctions team approval"));
    }

    #[test]
    fn test_pipe_separated_keeps_pipes_in_comment() {
        let raw = parse_input(" TXN9 | Release | ok | checked\n").unwrap();
        assert_eq!(raw.transaction, "TXN9");
        assert_eq!(raw.action, "Release");
        assert_eq!(raw.comment.as_deref(), Some("ok | checked"));
    }

    #[test]
    fn test_missing_action_defaults_to_stp_release() {
        let raw = parse_input("\r\nTXN5\r\n").unwrap();
        assert_eq!(raw.transaction, "TXN5");
        assert_eq!(raw.action, "STP-Release");
        assert!(raw.comment.is_none());
    }

    #[test]
    fn test_empty_input_is_rejected() {
        assert!(parse_input(" \n\n").is_err());
    }
}
