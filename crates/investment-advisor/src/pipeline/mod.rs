//! Sequential, fail-fast analysis pipeline

mod orchestrator;
mod result;
mod state;

pub use orchestrator::{
    Collaborators, PipelineOrchestrator, PipelineRun, PipelineStatus, RunRequest, StageTiming,
    normalize_symbol,
};
pub use result::{
    CorrelationKey, FinancialAnalysis, NewsAnalysis, RecommendationAnalysis, Sentiment,
    StageFailure, StageName, StageResult, SynthesisAnalysis,
};
pub use state::{ExecutionSummary, PipelineState};
