use chrono::Utc;
use tracing::{debug, info, warn};

use crate::browser::BrowserSession;

use super::error::{Stage, StageContext, StageResult};
use super::model::{ExtractionOutcome, FailedReference, ReportRecord, ReportReference, Transaction};
use super::portal::{PortalLayout, StageTiming};

pub struct ReportExtractor<'a> {
    layout: &'a PortalLayout,
    timing: StageTiming,
    min_columns: usize,
}

impl<'a> ReportExtractor<'a> {
    pub fn new(layout: &'a PortalLayout, timing: StageTiming, min_columns: usize) -> Self {
        Self {
            layout,
            timing,
            min_columns,
        }
    }

    /// Never fails the run: errors come back as [`ExtractionOutcome::Failed`].
    pub async fn extract(
        &self,
        session: &mut BrowserSession,
        reference: &ReportReference,
    ) -> ExtractionOutcome {
        match self.try_extract(session, reference).await {
            Ok(record) => {
                info!(
                    url = %record.url,
                    index = reference.index,
                    transactions = record.transactions.len(),
                    "extracted report"
                );
                ExtractionOutcome::Extracted(record)
            }
            Err(err) => {
                warn!(url = %reference.url, index = reference.index, error = %err, "report extraction failed");
                ExtractionOutcome::Failed(FailedReference {
                    url: reference.url.clone(),
                    reason: err.to_string(),
                })
            }
        }
    }

    async fn try_extract(
        &self,
        session: &mut BrowserSession,
        reference: &ReportReference,
    ) -> StageResult<ReportRecord> {
        session
            .open(&reference.url)
            .await
            .in_stage(Stage::Extraction)?;
        let table = session
            .wait_for_present(&self.layout.detail_table, self.timing.stage_timeout)
            .await
            .in_stage(Stage::Extraction)?;
        let rows = table
            .find_all(&self.layout.detail_row)
            .await
            .in_stage(Stage::Extraction)?;

        let mut transactions = Vec::with_capacity(rows.len().saturating_sub(1));
        // First row is the header.
        for (row_index, row) in rows.iter().enumerate().skip(1) {
            let cells = row
                .find_all(&self.layout.detail_cell)
                .await
                .in_stage(Stage::Extraction)?;
            if cells.len() < self.min_columns {
                debug!(
                    url = %reference.url,
                    row = row_index,
                    columns = cells.len(),
                    required = self.min_columns,
                    "skipping malformed row"
                );
                continue;
            }
            let mut texts = Vec::with_capacity(cells.len());
            for cell in &cells {
                texts.push(cell.text().await.in_stage(Stage::Extraction)?.trim().to_string());
            }
            transactions.push(Transaction::from_cells(&texts));
        }

        Ok(ReportRecord {
            url: reference.url.clone(),
            timestamp: Utc::now(),
            transactions,
        })
    }
}
