use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::browser::{BrowserSession, DriverFactory};
use crate::notify::{Notification, Notifier};
use crate::store::{default_file_name, ReportSink};

use super::consent::ConsentStage;
use super::error::{Stage, StageError};
use super::extraction::ReportExtractor;
use super::model::{
    partition_outcomes, ExtractionOutcome, RunResult, RunState, RunStatus, SearchCriteria,
};
use super::portal::PipelineSettings;
use super::results::ResultSetStage;
use super::search::SearchStage;

enum Discovery {
    Empty,
    Extracted(Vec<ExtractionOutcome>),
}

struct Fatal {
    at: RunState,
    error: StageError,
}

struct RunContext {
    run_id: Uuid,
    run_date: NaiveDate,
    started_at: DateTime<Utc>,
    state: RunState,
}

impl RunContext {
    fn advance(&mut self, next: RunState) {
        info!(run_id = %self.run_id, from = %self.state, to = %next, "run state transition");
        self.state = next;
    }

    fn abort(&self, error: StageError) -> Fatal {
        Fatal {
            at: self.state,
            error,
        }
    }
}

/// Drives one browser session through consent, search, result discovery and
/// per-report extraction, then persists and reports the outcome.
pub struct ScrapePipeline {
    settings: PipelineSettings,
    sessions: Arc<dyn DriverFactory>,
    sink: Arc<dyn ReportSink>,
    notifier: Option<Arc<dyn Notifier>>,
}

impl ScrapePipeline {
    pub fn new(
        settings: PipelineSettings,
        sessions: Arc<dyn DriverFactory>,
        sink: Arc<dyn ReportSink>,
        notifier: Option<Arc<dyn Notifier>>,
    ) -> Self {
        Self {
            settings,
            sessions,
            sink,
            notifier,
        }
    }

    pub async fn run(&self, criteria: &SearchCriteria) -> RunResult {
        let mut context = RunContext {
            run_id: Uuid::new_v4(),
            run_date: criteria.as_of,
            started_at: Utc::now(),
            state: RunState::Init,
        };
        info!(
            run_id = %context.run_id,
            date = %criteria.as_of,
            report_type = %criteria.report_type,
            "starting disclosure scrape"
        );

        let (discovery, metrics) = match self.sessions.create().await {
            Ok(driver) => {
                let mut session = BrowserSession::new(driver, self.settings.timing.poll_interval);
                let discovery = self.drive(&mut session, criteria, &mut context).await;
                let metrics = session.metrics().clone();
                if let Err(err) = session.close().await {
                    warn!(error = %err, "failed to release browser session");
                }
                (discovery, Some(metrics))
            }
            Err(err) => (
                Err(context.abort(StageError::from_browser(Stage::Navigation, err))),
                None,
            ),
        };

        let mut result = self.conclude(&context, discovery).await;
        if let Some(metrics) = &metrics {
            debug!(
                pages = metrics.pages_opened,
                polls = metrics.poll_attempts,
                wait_success_rate = metrics.wait_success_rate(),
                "browser session stats"
            );
        }
        result.metrics = metrics;
        info!(
            run_id = %result.run_id,
            status = %result.status,
            records = result.records.len(),
            failures = result.failure_count(),
            "disclosure scrape finished"
        );
        self.notify(&result).await;
        result
    }

    async fn drive(
        &self,
        session: &mut BrowserSession,
        criteria: &SearchCriteria,
        context: &mut RunContext,
    ) -> Result<Discovery, Fatal> {
        let settings = &self.settings;
        let layout = &settings.layout;
        let timing = settings.timing;

        session
            .open(settings.entry_url.as_str())
            .await
            .map_err(|err| context.abort(StageError::from_browser(Stage::Navigation, err)))?;
        context.advance(RunState::Navigated);

        ConsentStage::new(layout, timing)
            .run(session)
            .await
            .map_err(|err| context.abort(err))?;
        context.advance(RunState::Agreed);

        SearchStage::new(layout, timing, &settings.date_format)
            .run(session, criteria)
            .await
            .map_err(|err| context.abort(err))?;
        context.advance(RunState::Searched);

        let results = ResultSetStage::new(layout, timing, &settings.entry_url);
        let empty = results
            .is_empty(session)
            .await
            .map_err(|err| context.abort(err))?;
        context.advance(RunState::ResultsChecked);
        if empty {
            info!(date = %criteria.as_of, "no reports filed for date");
            return Ok(Discovery::Empty);
        }

        let references = results
            .enumerate_references(session)
            .await
            .map_err(|err| context.abort(err))?;
        context.advance(RunState::Extracting);

        let extractor = ReportExtractor::new(layout, timing, settings.min_columns);
        let mut outcomes = Vec::with_capacity(references.len());
        for reference in &references {
            outcomes.push(extractor.extract(session, reference).await);
        }
        Ok(Discovery::Extracted(outcomes))
    }

    async fn conclude(
        &self,
        context: &RunContext,
        discovery: Result<Discovery, Fatal>,
    ) -> RunResult {
        let mut records = Vec::new();
        let mut failed = Vec::new();
        let mut aborted_at = None;
        let mut fatal_error = None;
        let mut report_path = None;
        let mut persistence_error = None;

        let status = match discovery {
            Err(Fatal { at, error }) => {
                error!(run_id = %context.run_id, state = %at, error = %error, "run aborted");
                aborted_at = Some(at);
                fatal_error = Some(error.to_string());
                RunStatus::Fatal
            }
            Ok(Discovery::Empty) => RunStatus::NoResults,
            Ok(Discovery::Extracted(outcomes)) => {
                (records, failed) = partition_outcomes(outcomes);
                if !records.is_empty() {
                    let name = default_file_name(context.run_date);
                    match self.sink.write(&records, Some(&name)).await {
                        Ok(path) => report_path = Some(path),
                        Err(err) => {
                            error!(error = %err, "failed to persist reports");
                            persistence_error = Some(err.to_string());
                        }
                    }
                }
                RunStatus::after_extraction(failed.len(), persistence_error.is_none())
            }
        };
        info!(run_id = %context.run_id, from = %context.state, to = %RunState::Done, %status, "run state transition");

        RunResult {
            run_id: context.run_id,
            run_date: context.run_date,
            started_at: context.started_at,
            finished_at: Utc::now(),
            status,
            records,
            failed,
            aborted_at,
            fatal_error,
            report_path,
            persistence_error,
            metrics: None,
        }
    }

    async fn notify(&self, result: &RunResult) {
        let Some(notifier) = &self.notifier else {
            debug!("notifications disabled");
            return;
        };
        let message = Notification::for_run(result);
        match notifier
            .send(&message.subject, &message.body, &message.attachments)
            .await
        {
            Ok(()) => info!(subject = %message.subject, "notification sent"),
            Err(err) => warn!(error = %err, subject = %message.subject, "notification failed"),
        }
    }
}
