use tracing::{debug, info};

use crate::browser::{BrowserError, BrowserSession};

use super::error::{Stage, StageContext, StageError, StageResult};
use super::portal::{PortalLayout, StageTiming};

pub struct ConsentStage<'a> {
    layout: &'a PortalLayout,
    timing: StageTiming,
}

impl<'a> ConsentStage<'a> {
    pub fn new(layout: &'a PortalLayout, timing: StageTiming) -> Self {
        Self { layout, timing }
    }

    pub async fn run(&self, session: &mut BrowserSession) -> StageResult<()> {
        debug!(selector = %self.layout.consent, "waiting for agreement checkbox");
        let checkbox = session
            .wait_for_clickable(&self.layout.consent, self.timing.stage_timeout)
            .await
            .map_err(|err| match err {
                BrowserError::Timeout(_) => StageError::ConsentTimeout(self.timing.stage_timeout),
                other => StageError::from_browser(Stage::Consent, other),
            })?;

        if checkbox.is_selected().await.in_stage(Stage::Consent)? {
            debug!("agreement already accepted");
        } else {
            checkbox.click().await.in_stage(Stage::Consent)?;
            info!("accepted portal agreement");
        }

        // The portal exposes nothing to wait on after the agreement posts.
        session.settle(self.timing.settle).await;
        Ok(())
    }
}
