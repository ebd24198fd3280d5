pub mod browser;
pub mod config;
pub mod error;
pub mod notify;
pub mod scraper;
pub mod store;

pub use browser::{
    BrowserError, BrowserLauncher, BrowserResult, BrowserSession, DriverFactory, PageDriver,
    PageElement, Selector, SessionMetrics,
};
pub use config::{load_scraper_config, ScraperConfig};
pub use error::{ConfigError, Result};
pub use notify::{EmailNotifier, Notification, Notifier, NotifierError, SmtpCredentials};
pub use scraper::{
    PipelineSettings, ReportRecord, RunResult, RunState, RunStatus, ScrapePipeline,
    SearchCriteria, StageError, Transaction,
};
pub use store::{JsonReportStore, PersistenceError, ReportSink};
