use tracing::{debug, info};

use crate::browser::BrowserSession;

use super::error::{Stage, StageContext, StageResult};
use super::model::SearchCriteria;
use super::portal::{PortalLayout, StageTiming};

pub struct SearchStage<'a> {
    layout: &'a PortalLayout,
    timing: StageTiming,
    date_format: &'a str,
}

impl<'a> SearchStage<'a> {
    pub fn new(layout: &'a PortalLayout, timing: StageTiming, date_format: &'a str) -> Self {
        Self {
            layout,
            timing,
            date_format,
        }
    }

    pub async fn run(
        &self,
        session: &mut BrowserSession,
        criteria: &SearchCriteria,
    ) -> StageResult<()> {
        let report_type = self.layout.report_type(&criteria.report_type);
        let checkbox = session
            .wait_for_clickable(&report_type, self.timing.stage_timeout)
            .await
            .in_stage(Stage::Search)?;
        if checkbox.is_selected().await.in_stage(Stage::Search)? {
            debug!(code = %criteria.report_type, "report type already selected");
        } else {
            checkbox.click().await.in_stage(Stage::Search)?;
            info!(code = %criteria.report_type, "selected report type");
        }

        let date = criteria.formatted_date(self.date_format);
        let input = session
            .wait_for_present(&self.layout.date_input, self.timing.stage_timeout)
            .await
            .in_stage(Stage::Search)?;
        input.send_text(&date).await.in_stage(Stage::Search)?;
        info!(date = %date, "entered from date");

        let submit = session
            .wait_for_clickable(&self.layout.submit, self.timing.stage_timeout)
            .await
            .in_stage(Stage::Search)?;
        submit.click().await.in_stage(Stage::Search)?;
        info!("submitted search form");

        // Submission completes asynchronously with no observable marker.
        session.settle(self.timing.settle).await;
        Ok(())
    }
}
