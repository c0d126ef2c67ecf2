//! Comprehensive analysis combining news and financials

use super::{Stage, keyword_hits};
use crate::api::TextGenerator;
use crate::error::Result;
use crate::extract::{SynthesisSection, extract_bulleted_list, extract_sections};
use crate::pipeline::{
    CorrelationKey, FinancialAnalysis, NewsAnalysis, PipelineState, Sentiment, StageName,
    SynthesisAnalysis,
};
use crate::prompts::{SENIOR_ANALYST, synthesis_prompt};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;

const MIXED: &str = "Mixed alignment - Inconclusive correlation";
const POSITIVE_DEVELOPMENTS: &[&str] = &["growth", "expansion", "profit", "success", "positive"];
const NEGATIVE_DEVELOPMENTS: &[&str] = &["decline", "loss", "risk", "concern", "negative"];

pub struct SynthesisStage {
    generator: Arc<dyn TextGenerator>,
}

impl SynthesisStage {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    async fn analyze(&self, state: &PipelineState) -> Result<(SynthesisAnalysis, String)> {
        let news = state.require::<NewsAnalysis>()?;
        let financials = state.require::<FinancialAnalysis>()?;

        let prompt = synthesis_prompt(state.symbol(), state.company_name(), news, financials)?;
        let text = self.generator.generate(SENIOR_ANALYST, &prompt).await?;

        let sections = extract_sections::<SynthesisSection>(&text);
        let analysis = SynthesisAnalysis {
            sections,
            key_insights: extract_bulleted_list(&text, 5),
            correlations: correlations(news, financials),
        };

        Ok((analysis, text))
    }
}

#[async_trait]
impl Stage for SynthesisStage {
    fn name(&self) -> StageName {
        StageName::Synthesis
    }

    async fn run(&self, state: &mut PipelineState) {
        let outcome = self.analyze(state).await;
        state.record(outcome);
    }
}

pub(crate) fn correlations(
    news: &NewsAnalysis,
    financials: &FinancialAnalysis,
) -> BTreeMap<CorrelationKey, String> {
    BTreeMap::from([
        (
            CorrelationKey::SentimentHealth,
            sentiment_health(news.sentiment, &financials.health).to_string(),
        ),
        (
            CorrelationKey::DevelopmentsTrends,
            developments_trends(&news.developments, &financials.growth_trend).to_string(),
        ),
    ])
}

fn sentiment_health(sentiment: Sentiment, health: &str) -> &'static str {
    let healthy = health.contains("Healthy");
    let concerning = health.contains("Concerning");

    match sentiment {
        Sentiment::Positive if healthy => {
            "Strong alignment - Positive news supports strong fundamentals"
        }
        Sentiment::Negative if concerning => {
            "Strong alignment - Negative news aligns with weak fundamentals"
        }
        Sentiment::Positive if concerning => "Divergence - Positive news despite weak fundamentals",
        Sentiment::Negative if healthy => "Divergence - Negative news despite strong fundamentals",
        _ => MIXED,
    }
}

fn developments_trends(developments: &[String], trend: &str) -> &'static str {
    if developments.is_empty() {
        return "No developments to correlate";
    }

    let positive = developments
        .iter()
        .filter(|d| keyword_hits(d, POSITIVE_DEVELOPMENTS) > 0)
        .count();
    let negative = developments
        .iter()
        .filter(|d| keyword_hits(d, NEGATIVE_DEVELOPMENTS) > 0)
        .count();
    let growing = trend.contains("Growing");
    let declining = trend.contains("Declining");

    if growing && positive > negative {
        "Strong alignment - Positive developments support growth trends"
    } else if declining && negative > positive {
        "Strong alignment - Negative developments align with declining trends"
    } else if growing && negative > positive {
        "Divergence - Negative developments despite growth trends"
    } else if declining && positive > negative {
        "Divergence - Positive developments despite declining trends"
    } else {
        MIXED
    }
}
