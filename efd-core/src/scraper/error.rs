use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::browser::BrowserError;

pub type StageResult<T> = Result<T, StageError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Navigation,
    Consent,
    Search,
    ResultSet,
    Extraction,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Stage::Navigation => "navigation",
            Stage::Consent => "consent",
            Stage::Search => "search",
            Stage::ResultSet => "result set",
            Stage::Extraction => "report extraction",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Error)]
pub enum StageError {
    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },
    #[error("consent control never became interactable within {0:?}")]
    ConsentTimeout(Duration),
    #[error("{stage} stage timed out waiting for {target}")]
    StageTimeout { stage: Stage, target: String },
    #[error("{stage} stage failed: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: BrowserError,
    },
    #[error("extraction error: {0}")]
    Extraction(String),
}

impl StageError {
    pub fn from_browser(stage: Stage, err: BrowserError) -> Self {
        match err {
            BrowserError::Navigation { url, reason } => StageError::Navigation { url, reason },
            BrowserError::Timeout(target) => StageError::StageTimeout { stage, target },
            other => StageError::Stage {
                stage,
                source: other,
            },
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            StageError::ConsentTimeout(_) | StageError::StageTimeout { .. }
        )
    }
}

pub(crate) trait StageContext<T> {
    fn in_stage(self, stage: Stage) -> StageResult<T>;
}

impl<T> StageContext<T> for Result<T, BrowserError> {
    fn in_stage(self, stage: Stage) -> StageResult<T> {
        self.map_err(|err| StageError::from_browser(stage, err))
    }
}
