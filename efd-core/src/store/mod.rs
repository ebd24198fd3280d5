use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use thiserror::Error;
use tracing::info;

use crate::scraper::ReportRecord;

pub type PersistResult<T> = Result<T, PersistenceError>;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Durable storage for a run's records.
#[async_trait]
pub trait ReportSink: Send + Sync {
    async fn write(
        &self,
        records: &[ReportRecord],
        suggested_name: Option<&str>,
    ) -> PersistResult<PathBuf>;
}

pub fn default_file_name(date: NaiveDate) -> String {
    format!("senate_reports_{}.json", date.format("%Y-%m-%d"))
}

/// Writes records as a pretty-printed JSON array into one directory.
#[derive(Debug, Clone)]
pub struct JsonReportStore {
    directory: PathBuf,
}

impl JsonReportStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub async fn read(path: impl AsRef<Path>) -> PersistResult<Vec<ReportRecord>> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| PersistenceError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl ReportSink for JsonReportStore {
    async fn write(
        &self,
        records: &[ReportRecord],
        suggested_name: Option<&str>,
    ) -> PersistResult<PathBuf> {
        let name = suggested_name
            .map(str::to_string)
            .unwrap_or_else(|| default_file_name(Local::now().date_naive()));
        let path = self.directory.join(name);
        let payload = serde_json::to_vec_pretty(records)?;

        tokio::fs::create_dir_all(&self.directory)
            .await
            .map_err(|source| PersistenceError::Io {
                path: self.directory.clone(),
                source,
            })?;
        tokio::fs::write(&path, payload)
            .await
            .map_err(|source| PersistenceError::Io {
                path: path.clone(),
                source,
            })?;
        info!(path = %path.display(), records = records.len(), "saved reports");
        Ok(path)
    }
}
