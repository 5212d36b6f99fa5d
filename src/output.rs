//! Output folder layout
//!
//! `<output>/<YYYY-MM-DD>/<identifier>/` holds the input file and the
//! screenshots of one request; `daily_log.txt` and `error_log.txt` at the
//! output root get one line per request.

use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, NaiveDate};
use disposition_flow::DispositionReport;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

pub const DAILY_LOG: &str = "daily_log.txt";
pub const ERROR_LOG: &str = "error_log.txt";

/// Folder name for an identifier that may not have passed validation
pub fn folder_name(identifier: &str) -> String {
    let cleaned: String = identifier
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "unidentified".to_string()
    } else {
        cleaned.to_string()
    }
}

#[derive(Debug, Clone)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn transaction_dir(&self, date: NaiveDate, identifier: &str) -> PathBuf {
        self.root
            .join(date.format("%Y-%m-%d").to_string())
            .join(folder_name(identifier))
    }

    pub async fn prepare(&self, date: NaiveDate, identifier: &str) -> io::Result<PathBuf> {
        let dir = self.transaction_dir(date, identifier);
        fs::create_dir_all(&dir).await?;
        Ok(dir)
    }

    /// Move every `*.png` from `from` into `to`, then drop `from` when empty
    pub async fn collect_screenshots(&self, from: &Path, to: &Path) -> io::Result<usize> {
        let mut entries = match fs::read_dir(from).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(err) => return Err(err),
        };

        let mut moved = 0;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("png") {
                continue;
            }
            match move_file(&path, &to.join(entry.file_name())).await {
                Ok(()) => moved += 1,
                Err(err) => warn!(file = %path.display(), %err, "failed to move screenshot"),
            }
        }
        if let Err(err) = fs::remove_dir(from).await {
            debug!(dir = %from.display(), %err, "screenshot directory left in place");
        }
        Ok(moved)
    }

    /// Move a processed input file next to its screenshots
    pub async fn relocate_input(&self, file: &Path, to: &Path) -> io::Result<PathBuf> {
        let name = file
            .file_name()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "input path has no file name"))?;
        let target = to.join(name);
        if fs::try_exists(&target).await? {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} already exists", target.display()),
            ));
        }
        move_file(file, &target).await?;
        Ok(target)
    }

    /// Append the request's line to the daily or error log
    pub async fn journal(
        &self,
        at: &DateTime<Local>,
        identifier: &str,
        action: &str,
        report: &DispositionReport,
    ) -> io::Result<()> {
        let stamp = at.format("%Y-%m-%d %H:%M:%S");
        let (file, line) = match &report.error_code {
            None => (
                DAILY_LOG,
                format!(
                    "{} Transaction {} processing attempt. Final status: {}, Action: {}",
                    stamp, identifier, report.status_detail, action
                ),
            ),
            Some(code) => (
                ERROR_LOG,
                format!(
                    "{} ERROR {}: {}, action: {}, error: {}",
                    stamp, code, identifier, action, report.message
                ),
            ),
        };

        fs::create_dir_all(&self.root).await?;
        let mut log = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.root.join(file))
            .await?;
        log.write_all(line.as_bytes()).await?;
        log.write_all(b"\n").await?;
        log.flush().await
    }
}

async fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to).await {
        Ok(()) => Ok(()),
        Err(_) => {
            // rename fails across devices
            fs::copy(from, to).await?;
            fs::remove_file(from).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folder_names_stay_inside_the_output_root() {
        assert_eq!(folder_name("TXN123"), "TXN123");
        assert_eq!(folder_name("a/b"), "a_b");
        assert_eq!(folder_name("../etc"), "_etc");
        assert_eq!(folder_name("  "), "unidentified");
    }

    fn report(error_code: Option<&str>) -> DispositionReport {
        DispositionReport {
            success: error_code.is_none(),
            status: if error_code.is_none() { "ok" } else { "error" }.to_string(),
            status_detail: if error_code.is_none() { "escalated" } else { "failed" }.to_string(),
            message: "Element not found: #escalate".to_string(),
            transaction_id: None,
            error_code: error_code.map(str::to_string),
        }
    }

    #[test]
    fn test_journal_splits_daily_and_error_lines() {
        let dir = tempfile::tempdir().unwrap();
        let layout = OutputLayout::new(dir.path().join("out"));
        let at = Local::now();

        tokio_test::block_on(async {
            layout.journal(&at, "TXN1", "Block", &report(None)).await.unwrap();
            layout.journal(&at, "TXN2", "Block", &report(Some("AUTOMATION_ERROR"))).await.unwrap();
            layout.journal(&at, "TXN3", "Release", &report(None)).await.unwrap();
        });

        let daily = std::fs::read_to_string(layout.root().join(DAILY_LOG)).unwrap();
        assert_eq!(daily.lines().count(), 2);
        assert!(daily.contains("Transaction TXN1 processing attempt. Final status: escalated, Action: Block"));
        let errors = std::fs::read_to_string(layout.root().join(ERROR_LOG)).unwrap();
        assert!(errors.trim_end().ends_with(
            "ERROR AUTOMATION_ERROR: TXN2, action: Block, error: Element not found: #escalate"
        ));
    }

    #[test]
    fn test_missing_screenshot_dir_moves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let layout = OutputLayout::new(dir.path());
        let moved = tokio_test::block_on(
            layout.collect_screenshots(&dir.path().join("absent"), dir.path()),
        )
        .unwrap();
        assert_eq!(moved, 0);
    }

    #[test]
    fn test_transaction_dir_is_dated() {
        let layout = OutputLayout::new("/srv/output");
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(
            layout.transaction_dir(date, "TXN123"),
            PathBuf::from("/srv/output/2024-03-07/TXN123")
        );
    }
}
