//! Final BUY/HOLD/SELL call

use super::Stage;
use crate::api::TextGenerator;
use crate::error::Result;
use crate::extract::{
    Recommendation, RecommendationSection, extract_classification_label, extract_confidence,
    extract_key_factors, extract_sections, extract_target_price, extract_time_horizon,
};
use crate::pipeline::{
    FinancialAnalysis, NewsAnalysis, PipelineState, RecommendationAnalysis, StageName,
    SynthesisAnalysis,
};
use crate::prompts::{INVESTMENT_EXPERT, recommendation_prompt};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

pub struct RecommendationStage {
    generator: Arc<dyn TextGenerator>,
}

impl RecommendationStage {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    async fn analyze(&self, state: &PipelineState) -> Result<(RecommendationAnalysis, String)> {
        let news = state.require::<NewsAnalysis>()?;
        let financials = state.require::<FinancialAnalysis>()?;
        let synthesis = state.require::<SynthesisAnalysis>()?;

        let prompt = recommendation_prompt(
            state.symbol(),
            state.company_name(),
            news,
            financials,
            synthesis,
        )?;
        let text = self.generator.generate(INVESTMENT_EXPERT, &prompt).await?;

        let analysis = parse_recommendation(&text);
        info!(
            "{}: {} ({} confidence)",
            state.symbol(),
            analysis.recommendation,
            analysis.confidence
        );

        Ok((analysis, text))
    }
}

#[async_trait]
impl Stage for RecommendationStage {
    fn name(&self) -> StageName {
        StageName::Recommendation
    }

    async fn run(&self, state: &mut PipelineState) {
        let outcome = self.analyze(state).await;
        state.record(outcome);
    }
}

/// Structure a recommendation; total over any input
pub fn parse_recommendation(text: &str) -> RecommendationAnalysis {
    RecommendationAnalysis {
        recommendation: extract_classification_label(text, Recommendation::default()),
        confidence: extract_confidence(text),
        target_price: extract_target_price(text),
        time_horizon: extract_time_horizon(text),
        key_factors: extract_key_factors(text),
        sections: extract_sections::<RecommendationSection>(text),
    }
}
