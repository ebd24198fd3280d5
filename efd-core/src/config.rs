use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{ConfigError, Result};

pub const DEFAULT_BASE_URL: &str = "https://efdsearch.senate.gov/search/";
pub const PERIODIC_TRANSACTION_REPORT: &str = "11";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct ScraperConfig {
    pub browser: BrowserSection,
    pub timing: TimingSection,
    pub portal: PortalSection,
    pub selectors: SelectorSection,
    pub extraction: ExtractionSection,
    pub output: OutputSection,
    pub notify: NotifySection,
}

impl ScraperConfig {
    pub fn validate(&self) -> Result<()> {
        if self.timing.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "timing.poll_interval_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.extraction.min_columns == 0 {
            return Err(ConfigError::Invalid {
                field: "extraction.min_columns",
                reason: "must be greater than zero".to_string(),
            });
        }
        if url::Url::parse(&self.portal.base_url).is_err() {
            return Err(ConfigError::Invalid {
                field: "portal.base_url",
                reason: format!("not an absolute url: {}", self.portal.base_url),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrowserSection {
    pub headless: bool,
    pub executable_path: Option<PathBuf>,
    pub sandbox: bool,
    pub disable_gpu: bool,
    pub request_timeout_seconds: Option<u64>,
}

impl Default for BrowserSection {
    fn default() -> Self {
        Self {
            headless: true,
            executable_path: None,
            sandbox: false,
            disable_gpu: true,
            request_timeout_seconds: Some(30),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimingSection {
    pub stage_timeout_seconds: u64,
    pub settle_seconds: u64,
    pub poll_interval_ms: u64,
}

impl Default for TimingSection {
    fn default() -> Self {
        Self {
            stage_timeout_seconds: 10,
            settle_seconds: 3,
            poll_interval_ms: 250,
        }
    }
}

impl TimingSection {
    pub fn stage_timeout(&self) -> Duration {
        Duration::from_secs(self.stage_timeout_seconds)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_secs(self.settle_seconds)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PortalSection {
    pub base_url: String,
    pub report_type: String,
    pub date_format: String,
}

impl Default for PortalSection {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            report_type: PERIODIC_TRANSACTION_REPORT.to_string(),
            date_format: "%m/%d/%Y".to_string(),
        }
    }
}

/// CSS fragments for the portal's markup. Controls are keyed by id or value
/// code, never by position.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SelectorSection {
    pub consent_id: String,
    pub report_type_input: String,
    pub date_input_id: String,
    pub submit: String,
    pub results_body: String,
    pub empty_marker: String,
    pub result_link: String,
    pub detail_table: String,
    pub detail_row: String,
    pub detail_cell: String,
}

impl Default for SelectorSection {
    fn default() -> Self {
        Self {
            consent_id: "agree_statement".to_string(),
            report_type_input: "input.report_types".to_string(),
            date_input_id: "fromDate".to_string(),
            submit: "button[type='submit']".to_string(),
            results_body: "#filedReports tbody".to_string(),
            empty_marker: "#filedReports td.dataTables_empty".to_string(),
            result_link: "a".to_string(),
            detail_table: "table.table".to_string(),
            detail_row: "tr".to_string(),
            detail_cell: "td".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExtractionSection {
    pub min_columns: usize,
}

impl Default for ExtractionSection {
    fn default() -> Self {
        Self { min_columns: 9 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputSection {
    pub directory: PathBuf,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotifySection {
    pub recipients: Vec<String>,
    pub smtp_server: String,
    pub smtp_port: u16,
    pub sender: Option<String>,
    pub smtp_timeout_seconds: u64,
}

impl Default for NotifySection {
    fn default() -> Self {
        Self {
            recipients: Vec::new(),
            smtp_server: "smtp.gmail.com".to_string(),
            smtp_port: 587,
            sender: None,
            smtp_timeout_seconds: 10,
        }
    }
}

impl NotifySection {
    /// Configured addresses with blanks dropped.
    pub fn active_recipients(&self) -> impl Iterator<Item = &str> {
        self.recipients
            .iter()
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }

    pub fn enabled(&self) -> bool {
        self.active_recipients().next().is_some()
    }
}

pub fn load_scraper_config<P: AsRef<Path>>(path: P) -> Result<ScraperConfig> {
    let config: ScraperConfig = load_toml(path)?;
    config.validate()?;
    Ok(config)
}

fn load_toml<T, P>(path: P) -> Result<T>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        source,
        path: path.to_path_buf(),
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        source,
        path: path.to_path_buf(),
    })
}
