mod consent;
mod error;
mod extraction;
mod model;
mod pipeline;
mod portal;
mod results;
mod search;

pub use consent::ConsentStage;
pub use error::{Stage, StageError, StageResult};
pub use extraction::ReportExtractor;
pub use model::{
    partition_outcomes, ExtractionOutcome, FailedReference, ReportRecord, ReportReference,
    RunResult, RunState, RunStatus, SearchCriteria, Transaction,
};
pub use pipeline::ScrapePipeline;
pub use portal::{PipelineSettings, PortalLayout, StageTiming};
pub use results::{dedupe_references, ResultSetStage};
pub use search::SearchStage;
