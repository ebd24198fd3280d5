use std::fmt;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{debug, info, trace, warn};

use super::driver::{PageDriver, PageElement};
use super::error::{BrowserError, BrowserResult};
use super::metrics::SessionMetrics;
use super::selector::Selector;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitCondition {
    Present,
    Clickable,
}

impl fmt::Display for WaitCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaitCondition::Present => f.write_str("present"),
            WaitCondition::Clickable => f.write_str("clickable"),
        }
    }
}

/// Exclusive owner of one driver instance for the lifetime of a run.
///
/// Released by [`BrowserSession::close`], which consumes the session so it
/// cannot run twice.
pub struct BrowserSession {
    driver: Box<dyn PageDriver>,
    poll_interval: Duration,
    metrics: SessionMetrics,
    closed: bool,
}

impl BrowserSession {
    pub fn new(driver: Box<dyn PageDriver>, poll_interval: Duration) -> Self {
        Self {
            driver,
            poll_interval: poll_interval.max(Duration::from_millis(1)),
            metrics: SessionMetrics::default(),
            closed: false,
        }
    }

    pub fn metrics(&self) -> &SessionMetrics {
        &self.metrics
    }

    pub async fn open(&mut self, url: &str) -> BrowserResult<()> {
        debug!(url = %url, "opening page");
        match self.driver.open(url).await {
            Ok(()) => {
                self.metrics.record_page_open(true);
                Ok(())
            }
            Err(err) => {
                self.metrics.record_page_open(false);
                Err(match err {
                    BrowserError::Navigation { .. } => err,
                    other => BrowserError::Navigation {
                        url: url.to_string(),
                        reason: other.to_string(),
                    },
                })
            }
        }
    }

    pub async fn current_url(&self) -> BrowserResult<Option<String>> {
        self.driver.current_url().await
    }

    pub async fn wait_for_clickable(
        &mut self,
        selector: &Selector,
        timeout: Duration,
    ) -> BrowserResult<Box<dyn PageElement>> {
        self.wait_for(selector, WaitCondition::Clickable, timeout)
            .await
    }

    pub async fn wait_for_present(
        &mut self,
        selector: &Selector,
        timeout: Duration,
    ) -> BrowserResult<Box<dyn PageElement>> {
        self.wait_for(selector, WaitCondition::Present, timeout)
            .await
    }

    /// Re-checks `condition` every poll interval until it holds or `timeout`
    /// elapses. The condition is always checked at least once, and a failed
    /// lookup counts as not ready.
    async fn wait_for(
        &mut self,
        selector: &Selector,
        condition: WaitCondition,
        timeout: Duration,
    ) -> BrowserResult<Box<dyn PageElement>> {
        let deadline = Instant::now() + timeout;
        let mut polls = 0u64;
        let mut last_error: Option<BrowserError> = None;
        loop {
            polls += 1;
            match self.poll_once(selector, condition).await {
                Ok(Some(element)) => {
                    self.metrics.record_wait(true, polls);
                    trace!(selector = %selector, %condition, polls, "wait satisfied");
                    return Ok(element);
                }
                Ok(None) => {}
                Err(err) => {
                    trace!(selector = %selector, %condition, error = %err, "lookup failed, retrying");
                    last_error = Some(err);
                }
            }

            let now = Instant::now();
            if now >= deadline {
                self.metrics.record_wait(false, polls);
                match &last_error {
                    Some(err) => {
                        debug!(selector = %selector, %condition, polls, last_error = %err, "wait timed out")
                    }
                    None => debug!(selector = %selector, %condition, polls, "wait timed out"),
                }
                return Err(BrowserError::Timeout(format!("{selector} to become {condition}")));
            }
            sleep(self.poll_interval.min(deadline - now)).await;
        }
    }

    /// Driver errors are returned to the caller, which treats them as not ready.
    async fn poll_once(
        &self,
        selector: &Selector,
        condition: WaitCondition,
    ) -> BrowserResult<Option<Box<dyn PageElement>>> {
        let Some(element) = self.driver.find(selector).await? else {
            return Ok(None);
        };
        let ready = match condition {
            WaitCondition::Present => true,
            WaitCondition::Clickable => element.is_interactable().await?,
        };
        Ok(ready.then_some(element))
    }

    pub async fn find(&self, selector: &Selector) -> BrowserResult<Option<Box<dyn PageElement>>> {
        self.driver.find(selector).await
    }

    pub async fn find_all(&self, selector: &Selector) -> BrowserResult<Vec<Box<dyn PageElement>>> {
        self.driver.find_all(selector).await
    }

    /// Unconditional pause for transitions that expose no readiness signal.
    pub async fn settle(&mut self, duration: Duration) {
        if duration.is_zero() {
            return;
        }
        trace!(duration_ms = duration.as_millis() as u64, "settling");
        sleep(duration).await;
        self.metrics.record_settle();
    }

    pub async fn close(mut self) -> BrowserResult<SessionMetrics> {
        self.closed = true;
        info!(
            pages = self.metrics.pages_opened,
            waits = self.metrics.waits_satisfied,
            timeouts = self.metrics.wait_timeouts,
            "Closing browser session"
        );
        self.driver.quit().await?;
        Ok(self.metrics.clone())
    }
}

impl fmt::Debug for BrowserSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrowserSession")
            .field("poll_interval", &self.poll_interval)
            .field("metrics", &self.metrics)
            .field("closed", &self.closed)
            .finish()
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        if !self.closed {
            warn!("BrowserSession dropped without explicit close");
        }
    }
}
