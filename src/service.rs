use std::path::{Path, PathBuf};
use std::sync::Arc;

use action_primitives::{SessionFactory, SessionScope};
use anyhow::{Context, Result};
use chrono::Local;
use disposition_flow::{
    report, BpmLookup, BpmLookupRequest, BpmLookupResponse, DispositionExecutor, DispositionReport,
    RetryController,
};
use firco_core_types::{BpmRowStatus, RawTransactionRequest};
use tracing::{info, warn};

use crate::batch::parse_input;
use crate::config::Config;
use crate::output::{folder_name, OutputLayout};

/// Terminal report of one request plus where its artifacts went
#[derive(Debug, Clone)]
pub struct Processed {
    pub report: DispositionReport,
    pub attempts: u32,
    /// Dated transaction folder, when one was prepared
    pub folder: Option<PathBuf>,
}

/// Wires the controller and the BPM lookup to the output folders
#[derive(Clone)]
pub struct DispositionService {
    controller: RetryController,
    lookup: Option<BpmLookup>,
    output: OutputLayout,
    screenshots: PathBuf,
}

impl DispositionService {
    pub fn from_config(config: &Config, factory: Arc<dyn SessionFactory>) -> Result<Self> {
        let policy = config.retry_policy()?;
        let executor = DispositionExecutor::new(config.locator()?);
        let controller =
            RetryController::new(factory.clone(), executor, config.actors(), policy.clone());
        let lookup = config
            .bpm_surface()?
            .map(|bpm| BpmLookup::new(factory, bpm, policy));

        Ok(Self::from_parts(
            controller,
            lookup,
            OutputLayout::new(&config.paths.output),
            &config.paths.screenshots,
        ))
    }

    pub fn from_parts(
        controller: RetryController,
        lookup: Option<BpmLookup>,
        output: OutputLayout,
        screenshots: impl Into<PathBuf>,
    ) -> Self {
        Self {
            controller,
            lookup,
            output,
            screenshots: screenshots.into(),
        }
    }

    pub fn output(&self) -> &OutputLayout {
        &self.output
    }

    fn scope(&self, identifier: &str) -> SessionScope {
        let mut scope = SessionScope::new(folder_name(identifier), PathBuf::new());
        scope.screenshot_dir = self.screenshots.join(scope.request_id.to_string());
        scope
    }

    /// Run one request, then move its screenshots and journal the result
    pub async fn process(&self, raw: &RawTransactionRequest) -> Processed {
        let identifier = raw.transaction.trim();
        let scope = self.scope(identifier);
        let screenshot_dir = scope.screenshot_dir.clone();

        let run = self.controller.run_raw(raw, scope).await;
        let completed_at = Local::now();
        let report = report(&run.outcome, identifier, &completed_at);

        // rejected requests never opened a session
        let folder = if report.is_validation_error() {
            None
        } else {
            match self.output.prepare(completed_at.date_naive(), identifier).await {
                Ok(folder) => {
                    match self.output.collect_screenshots(&screenshot_dir, &folder).await {
                        Ok(moved) => info!(folder = %folder.display(), moved, "screenshots collected"),
                        Err(err) => warn!(%err, "failed to collect screenshots"),
                    }
                    Some(folder)
                }
                Err(err) => {
                    warn!(%err, "failed to prepare the transaction folder");
                    None
                }
            }
        };

        if let Err(err) = self
            .output
            .journal(&completed_at, identifier, raw.action.trim(), &report)
            .await
        {
            warn!(%err, "failed to append to the journal");
        }

        info!(
            transaction = identifier,
            status = %report.status_detail,
            success = report.success,
            attempts = run.retry.attempts(),
            "transaction finished"
        );
        Processed {
            report,
            attempts: run.retry.attempts(),
            folder,
        }
    }

    /// Process an input file and move it into its transaction folder
    pub async fn process_file(&self, path: &Path) -> Result<Processed> {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        let raw = parse_input(&text).with_context(|| format!("invalid input file {}", path.display()))?;

        let mut processed = self.process(&raw).await;
        let folder = match processed.folder.clone() {
            Some(folder) => folder,
            None => self
                .output
                .prepare(Local::now().date_naive(), &raw.transaction)
                .await
                .context("failed to prepare the transaction folder")?,
        };
        match self.output.relocate_input(path, &folder).await {
            Ok(moved) => info!(file = %moved.display(), "input file archived"),
            Err(err) => warn!(file = %path.display(), %err, "input file left in place"),
        }
        processed.folder = Some(folder);
        Ok(processed)
    }

    /// Read-only BPM check
    pub async fn lookup(&self, request: &BpmLookupRequest) -> BpmLookupResponse {
        let Some(lookup) = &self.lookup else {
            return BpmLookupResponse::error(BpmRowStatus::Unknown, "BPM is not configured.");
        };
        let mut scope = self.scope(&request.transaction_id);
        scope.label = format!("bpm-{}", scope.label);
        lookup.run(request, scope).await
    }
}
