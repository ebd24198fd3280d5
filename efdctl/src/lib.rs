use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use clap::{Parser, ValueEnum};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use efd_core::browser::BrowserLauncher;
use efd_core::notify::{EmailNotifier, Notifier, SmtpCredentials};
use efd_core::scraper::{PipelineSettings, RunResult, RunStatus, ScrapePipeline, SearchCriteria};
use efd_core::store::JsonReportStore;
use efd_core::{load_scraper_config, ScraperConfig};

const DEFAULT_CONFIG: &str = "configs/efd.toml";

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(#[from] efd_core::ConfigError),
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Senate financial disclosure scraper", long_about = None)]
pub struct Cli {
    /// Path to efd.toml (defaults to configs/efd.toml when present)
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Show the browser window instead of running headless
    #[arg(long)]
    pub headed: bool,
    /// Seconds each stage waits for its element
    #[arg(long, value_name = "SECONDS")]
    pub stage_timeout: Option<u64>,
    /// Seconds to pause after transitions with no readiness signal
    #[arg(long, value_name = "SECONDS")]
    pub settle: Option<u64>,
    /// Notification address, repeatable; replaces configured recipients
    #[arg(long = "recipient", value_name = "ADDRESS")]
    pub recipients: Vec<String>,
    /// Directory for the dated JSON output
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
    /// Filing date to search from (YYYY-MM-DD); defaults to today
    #[arg(long)]
    pub date: Option<NaiveDate>,
    /// Report type code submitted with the search form
    #[arg(long)]
    pub report_type: Option<String>,
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

pub fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Runs one scrape and returns the process exit code.
pub async fn run(cli: Cli) -> Result<i32> {
    let config = resolve_config(&cli)?;
    let settings = PipelineSettings::from_config(&config)?;
    let criteria = SearchCriteria::new(
        config.portal.report_type.clone(),
        cli.date.unwrap_or_else(|| Local::now().date_naive()),
    );

    let launcher = BrowserLauncher::new(config.browser.clone());
    let store = JsonReportStore::new(config.output.directory.clone());
    let pipeline = ScrapePipeline::new(
        settings,
        Arc::new(launcher),
        Arc::new(store),
        build_notifier(&config),
    );

    let result = pipeline.run(&criteria).await;
    render(&RunSummary::from(&result), cli.format)?;
    Ok(exit_code(&result))
}

fn resolve_config(cli: &Cli) -> Result<ScraperConfig> {
    let mut config = match &cli.config {
        Some(path) => load_scraper_config(path)?,
        None if Path::new(DEFAULT_CONFIG).exists() => load_scraper_config(DEFAULT_CONFIG)?,
        None => ScraperConfig::default(),
    };
    apply_overrides(&mut config, cli);
    config.validate()?;
    Ok(config)
}

fn apply_overrides(config: &mut ScraperConfig, cli: &Cli) {
    if cli.headed {
        config.browser.headless = false;
    }
    if let Some(seconds) = cli.stage_timeout {
        config.timing.stage_timeout_seconds = seconds;
    }
    if let Some(seconds) = cli.settle {
        config.timing.settle_seconds = seconds;
    }
    if !cli.recipients.is_empty() {
        config.notify.recipients = cli.recipients.clone();
    }
    if let Some(dir) = &cli.output_dir {
        config.output.directory = dir.clone();
    }
    if let Some(code) = &cli.report_type {
        config.portal.report_type = code.clone();
    }
}

fn build_notifier(config: &ScraperConfig) -> Option<Arc<dyn Notifier>> {
    if !config.notify.enabled() {
        info!("no notification recipient configured; notifications disabled");
        return None;
    }
    let credentials = match SmtpCredentials::from_env() {
        Ok(credentials) => credentials,
        Err(err) => {
            warn!(error = %err, "notifications disabled");
            return None;
        }
    };
    match EmailNotifier::from_config(&config.notify, credentials) {
        Ok(Some(notifier)) => Some(Arc::new(notifier)),
        Ok(None) => None,
        Err(err) => {
            warn!(error = %err, "invalid notification settings; notifications disabled");
            None
        }
    }
}

/// Zero for SUCCESS, NO_RESULTS and PARTIAL runs that saved at least one
/// report; one otherwise.
pub fn exit_code(result: &RunResult) -> i32 {
    if result.is_effectively_fatal() {
        1
    } else {
        0
    }
}

fn render<T>(value: &T, format: OutputFormat) -> Result<()>
where
    T: Serialize + DisplayFallback,
{
    match format {
        OutputFormat::Text => {
            println!("{}", value.display());
            Ok(())
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value)?;
            println!("{}", json);
            Ok(())
        }
    }
}

trait DisplayFallback {
    fn display(&self) -> String;
}

#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub run_id: String,
    pub date: NaiveDate,
    pub status: RunStatus,
    pub reports: usize,
    pub transactions: usize,
    pub failures: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&RunResult> for RunSummary {
    fn from(result: &RunResult) -> Self {
        Self {
            run_id: result.run_id.to_string(),
            date: result.run_date,
            status: result.status,
            reports: result.records.len(),
            transactions: result.transaction_count(),
            failures: result
                .failed
                .iter()
                .map(|failure| format!("{}: {}", failure.url, failure.reason))
                .collect(),
            output: result.report_path.clone(),
            error: result
                .fatal_error
                .clone()
                .or_else(|| result.persistence_error.clone()),
        }
    }
}

impl DisplayFallback for RunSummary {
    fn display(&self) -> String {
        let mut lines = vec![format!("Run {} for {}: {}", self.run_id, self.date, self.status)];
        lines.push(format!(
            "  - Reports: {} ({} transactions)",
            self.reports, self.transactions
        ));
        if let Some(path) = &self.output {
            lines.push(format!("  - Saved to: {}", path.display()));
        }
        if !self.failures.is_empty() {
            lines.push("Failed reports:".to_string());
            for failure in &self.failures {
                lines.push(format!("  - {failure}"));
            }
        }
        if let Some(error) = &self.error {
            lines.push(format!("Error: {error}"));
        }
        lines.join("\n")
    }
}
