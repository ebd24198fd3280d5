use std::fmt::Write;
use std::path::PathBuf;

use crate::scraper::{RunResult, RunStatus};

const SUBJECT_PREFIX: &str = "Senate Reports";

/// Outcome-specific subject, body and attachments for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub subject: String,
    pub body: String,
    pub attachments: Vec<PathBuf>,
}

impl Notification {
    pub fn for_run(result: &RunResult) -> Self {
        let date = result.run_date.format("%Y-%m-%d");
        let records = result.records.len();
        let failures = result.failure_count();

        let subject = match result.status {
            RunStatus::Success => format!("{SUBJECT_PREFIX} {date}: {records} Reports Scraped"),
            RunStatus::NoResults => format!("{SUBJECT_PREFIX} {date}: No Reports Found"),
            RunStatus::Partial => format!(
                "{SUBJECT_PREFIX} {date}: {records} Reports Scraped, {failures} Failed"
            ),
            RunStatus::Fatal => format!("{SUBJECT_PREFIX} {date}: Scrape Failed"),
        };

        let mut body = String::new();
        match result.status {
            RunStatus::NoResults => {
                let _ = writeln!(body, "No periodic transaction reports were filed on {date}.");
            }
            RunStatus::Fatal => {
                let stage = result
                    .aborted_at
                    .map(|state| state.to_string())
                    .unwrap_or_else(|| "unknown".to_string());
                let _ = writeln!(body, "The scrape for {date} aborted after state {stage}.");
                if let Some(error) = &result.fatal_error {
                    let _ = writeln!(body, "Error: {error}");
                }
            }
            RunStatus::Success | RunStatus::Partial => {
                let _ = writeln!(
                    body,
                    "Scraped {records} reports with {} transactions for {date}.",
                    result.transaction_count()
                );
                for record in &result.records {
                    let _ = writeln!(
                        body,
                        "  - {} ({} transactions)",
                        record.url,
                        record.transactions.len()
                    );
                }
                if failures > 0 {
                    let _ = writeln!(body, "\n{failures} reports could not be extracted:");
                    for failure in &result.failed {
                        let _ = writeln!(body, "  - {}: {}", failure.url, failure.reason);
                    }
                }
                if let Some(error) = &result.persistence_error {
                    let _ = writeln!(body, "\nResults could not be saved: {error}");
                }
            }
        }
        let _ = write!(body, "\nRun id: {}", result.run_id);

        Self {
            subject,
            body,
            attachments: result.report_path.iter().cloned().collect(),
        }
    }
}
