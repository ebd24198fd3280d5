use std::collections::HashSet;

use tracing::{debug, info, warn};
use url::Url;

use crate::browser::BrowserSession;

use super::error::{Stage, StageContext, StageError, StageResult};
use super::model::ReportReference;
use super::portal::{PortalLayout, StageTiming};

pub struct ResultSetStage<'a> {
    layout: &'a PortalLayout,
    timing: StageTiming,
    fallback_base: &'a Url,
}

impl<'a> ResultSetStage<'a> {
    pub fn new(layout: &'a PortalLayout, timing: StageTiming, fallback_base: &'a Url) -> Self {
        Self {
            layout,
            timing,
            fallback_base,
        }
    }

    /// True when the results region carries the explicit "no rows" marker.
    pub async fn is_empty(&self, session: &mut BrowserSession) -> StageResult<bool> {
        session
            .wait_for_present(&self.layout.results_body, self.timing.stage_timeout)
            .await
            .in_stage(Stage::ResultSet)?;
        let marker = session
            .find(&self.layout.empty_marker)
            .await
            .in_stage(Stage::ResultSet)?;
        let empty = marker.is_some();
        debug!(empty, "checked result set");
        Ok(empty)
    }

    pub async fn enumerate_references(
        &self,
        session: &mut BrowserSession,
    ) -> StageResult<Vec<ReportReference>> {
        let body = session
            .find(&self.layout.results_body)
            .await
            .in_stage(Stage::ResultSet)?
            .ok_or_else(|| {
                StageError::Extraction(format!(
                    "results table body {} disappeared",
                    self.layout.results_body
                ))
            })?;

        let anchors = body
            .find_all(&self.layout.result_link)
            .await
            .in_stage(Stage::ResultSet)?;
        let mut hrefs = Vec::with_capacity(anchors.len());
        for anchor in &anchors {
            match anchor.attribute("href").await.in_stage(Stage::ResultSet)? {
                Some(href) => hrefs.push(href),
                None => debug!("skipping anchor without href"),
            }
        }

        let base = match session.current_url().await.in_stage(Stage::ResultSet)? {
            Some(current) => Url::parse(&current).unwrap_or_else(|_| self.fallback_base.clone()),
            None => self.fallback_base.clone(),
        };
        let references = dedupe_references(hrefs, &base);
        if references.is_empty() {
            return Err(StageError::Extraction(
                "result set is not empty but no report links were found".to_string(),
            ));
        }

        info!(
            anchors = anchors.len(),
            references = references.len(),
            "enumerated report references"
        );
        Ok(references)
    }
}

/// Resolves each href against `base` and keeps the first occurrence of every
/// URL, numbering survivors in discovery order.
pub fn dedupe_references<I>(hrefs: I, base: &Url) -> Vec<ReportReference>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    let mut references = Vec::new();
    for href in hrefs {
        let href = href.trim();
        if href.is_empty() {
            continue;
        }
        let url = match base.join(href) {
            Ok(url) => url.to_string(),
            Err(err) => {
                warn!(href = %href, error = %err, "skipping unparseable report link");
                continue;
            }
        };
        if seen.insert(url.clone()) {
            references.push(ReportReference {
                url,
                index: references.len(),
            });
        }
    }
    references
}
