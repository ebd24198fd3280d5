use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::browser::SessionMetrics;

/// Parameters submitted to the portal's search form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCriteria {
    pub report_type: String,
    pub as_of: NaiveDate,
}

impl SearchCriteria {
    pub fn new(report_type: impl Into<String>, as_of: NaiveDate) -> Self {
        Self {
            report_type: report_type.into(),
            as_of,
        }
    }

    pub fn formatted_date(&self, format: &str) -> String {
        self.as_of.format(format).to_string()
    }
}

/// A discovered link to one detail page. `index` is the discovery order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportReference {
    pub url: String,
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub number: String,
    pub transaction_date: String,
    pub owner: String,
    pub ticker: String,
    pub asset_name: String,
    pub asset_type: String,
    #[serde(rename = "type")]
    pub transaction_type: String,
    pub amount: String,
    pub comment: String,
}

impl Transaction {
    /// Builds a transaction from already-trimmed cell texts in column order.
    /// Columns past the ninth are ignored; missing ones are left empty.
    pub fn from_cells(cells: &[String]) -> Self {
        let cell = |idx: usize| cells.get(idx).cloned().unwrap_or_default();
        Self {
            number: cell(0),
            transaction_date: cell(1),
            owner: cell(2),
            ticker: cell(3),
            asset_name: cell(4),
            asset_type: cell(5),
            transaction_type: cell(6),
            amount: cell(7),
            comment: cell(8),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRecord {
    pub url: String,
    pub timestamp: DateTime<Utc>,
    pub transactions: Vec<Transaction>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedReference {
    pub url: String,
    pub reason: String,
}

/// Outcome of one per-reference extraction. Failures never abort the run.
#[derive(Debug, Clone)]
pub enum ExtractionOutcome {
    Extracted(ReportRecord),
    Failed(FailedReference),
}

pub fn partition_outcomes(
    outcomes: Vec<ExtractionOutcome>,
) -> (Vec<ReportRecord>, Vec<FailedReference>) {
    let mut records = Vec::new();
    let mut failed = Vec::new();
    for outcome in outcomes {
        match outcome {
            ExtractionOutcome::Extracted(record) => records.push(record),
            ExtractionOutcome::Failed(failure) => failed.push(failure),
        }
    }
    (records, failed)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Success,
    NoResults,
    Partial,
    Fatal,
}

impl RunStatus {
    /// Status of a run that reached extraction with at least one reference.
    pub fn after_extraction(failures: usize, persisted: bool) -> Self {
        if failures == 0 && persisted {
            RunStatus::Success
        } else {
            RunStatus::Partial
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RunStatus::Success => "SUCCESS",
            RunStatus::NoResults => "NO_RESULTS",
            RunStatus::Partial => "PARTIAL",
            RunStatus::Fatal => "FATAL",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunState {
    Init,
    Navigated,
    Agreed,
    Searched,
    ResultsChecked,
    Extracting,
    Done,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RunState::Init => "INIT",
            RunState::Navigated => "NAVIGATED",
            RunState::Agreed => "AGREED",
            RunState::Searched => "SEARCHED",
            RunState::ResultsChecked => "RESULTS_CHECKED",
            RunState::Extracting => "EXTRACTING",
            RunState::Done => "DONE",
        };
        f.write_str(label)
    }
}

/// Aggregate outcome of one pipeline execution.
#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub run_id: Uuid,
    pub run_date: NaiveDate,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub status: RunStatus,
    pub records: Vec<ReportRecord>,
    pub failed: Vec<FailedReference>,
    /// Last state reached before a fatal abort.
    pub aborted_at: Option<RunState>,
    pub fatal_error: Option<String>,
    pub report_path: Option<PathBuf>,
    pub persistence_error: Option<String>,
    pub metrics: Option<SessionMetrics>,
}

impl RunResult {
    pub fn failure_count(&self) -> usize {
        self.failed.len()
    }

    pub fn transaction_count(&self) -> usize {
        self.records
            .iter()
            .map(|record| record.transactions.len())
            .sum()
    }

    /// FATAL, a PARTIAL run with nothing extracted, or records that never
    /// reached disk.
    pub fn is_effectively_fatal(&self) -> bool {
        match self.status {
            RunStatus::Fatal => true,
            RunStatus::Partial => self.records.is_empty() || self.persistence_error.is_some(),
            RunStatus::Success | RunStatus::NoResults => false,
        }
    }
}
