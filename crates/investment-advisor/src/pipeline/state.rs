//! State threaded through one pipeline run

use super::result::{
    FinancialAnalysis, NewsAnalysis, RecommendationAnalysis, StageFailure, StageName, StageResult,
    SynthesisAnalysis,
};
use crate::error::{AdvisorError, Result};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

/// Output type owned by exactly one stage
pub(crate) trait StageOutput: Sized {
    const STAGE: StageName;

    fn slot(state: &PipelineState) -> &Option<StageResult<Self>>;

    fn slot_mut(state: &mut PipelineState) -> &mut Option<StageResult<Self>>;
}

macro_rules! stage_output {
    ($ty:ty, $stage:expr, $field:ident) => {
        impl StageOutput for $ty {
            const STAGE: StageName = $stage;

            fn slot(state: &PipelineState) -> &Option<StageResult<Self>> {
                &state.$field
            }

            fn slot_mut(state: &mut PipelineState) -> &mut Option<StageResult<Self>> {
                &mut state.$field
            }
        }
    };
}

stage_output!(NewsAnalysis, StageName::News, news);
stage_output!(FinancialAnalysis, StageName::Financials, financials);
stage_output!(SynthesisAnalysis, StageName::Synthesis, synthesis);
stage_output!(RecommendationAnalysis, StageName::Recommendation, recommendation);

/// Accumulated results of one run
///
/// Each stage writes only its own result. Once a failure is recorded nothing
/// else can be written, so the fields after the failing stage stay `None`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineState {
    symbol: String,
    company_name: String,
    news: Option<StageResult<NewsAnalysis>>,
    financials: Option<StageResult<FinancialAnalysis>>,
    synthesis: Option<StageResult<SynthesisAnalysis>>,
    recommendation: Option<StageResult<RecommendationAnalysis>>,
    failure: Option<StageFailure>,
    completed_stages: Vec<StageName>,
}

/// Status snapshot of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionSummary {
    pub symbol: String,
    pub completed_stages: Vec<StageName>,
    pub has_error: bool,
    pub error: Option<String>,
}

impl PipelineState {
    /// Fresh state; the company name defaults to the symbol
    pub fn new(symbol: impl Into<String>, company_name: Option<&str>) -> Self {
        let symbol = symbol.into();
        let company_name = company_name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map_or_else(|| symbol.clone(), str::to_string);

        Self {
            symbol,
            company_name,
            news: None,
            financials: None,
            synthesis: None,
            recommendation: None,
            failure: None,
            completed_stages: Vec::new(),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn company_name(&self) -> &str {
        &self.company_name
    }

    pub fn news(&self) -> Option<&StageResult<NewsAnalysis>> {
        self.news.as_ref()
    }

    pub fn financials(&self) -> Option<&StageResult<FinancialAnalysis>> {
        self.financials.as_ref()
    }

    pub fn synthesis(&self) -> Option<&StageResult<SynthesisAnalysis>> {
        self.synthesis.as_ref()
    }

    pub fn recommendation(&self) -> Option<&StageResult<RecommendationAnalysis>> {
        self.recommendation.as_ref()
    }

    pub fn failure(&self) -> Option<&StageFailure> {
        self.failure.as_ref()
    }

    pub fn completed_stages(&self) -> &[StageName] {
        &self.completed_stages
    }

    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }

    pub fn summary(&self) -> ExecutionSummary {
        ExecutionSummary {
            symbol: self.symbol.clone(),
            completed_stages: self.completed_stages.clone(),
            has_error: self.failure.is_some(),
            error: self.failure.as_ref().map(ToString::to_string),
        }
    }

    /// Successful output of an earlier stage
    pub(crate) fn require<T: StageOutput>(&self) -> Result<&T> {
        T::slot(self)
            .as_ref()
            .and_then(StageResult::output)
            .ok_or(AdvisorError::UpstreamFailure { stage: T::STAGE })
    }

    /// Store a stage outcome
    ///
    /// Success appends the stage to `completed_stages`; an error stores a
    /// failure result and sets `failure`. Writes after a failure, or a second
    /// write to the same slot, are ignored. Returns whether the stage succeeded.
    pub(crate) fn record<T: StageOutput>(&mut self, outcome: Result<(T, String)>) -> bool {
        if let Some(failure) = &self.failure {
            warn!(
                "Ignoring {} result, run already failed at {}",
                T::STAGE,
                failure.stage
            );
            return false;
        }

        if T::slot(self).is_some() {
            warn!("Ignoring duplicate {} result", T::STAGE);
            return false;
        }

        match outcome {
            Ok((output, raw_text)) => {
                *T::slot_mut(self) = Some(StageResult::Success { output, raw_text });
                self.completed_stages.push(T::STAGE);
                info!("{} stage completed for {}", T::STAGE, self.symbol);
                true
            }
            Err(e) => {
                error!("{} stage failed for {}: {}", T::STAGE, self.symbol, e);
                *T::slot_mut(self) = Some(StageResult::Failure {
                    message: e.to_string(),
                });
                self.failure = Some(StageFailure {
                    symbol: self.symbol.clone(),
                    stage: T::STAGE,
                    message: e.to_string(),
                    kind: e.kind(),
                });
                false
            }
        }
    }
}
