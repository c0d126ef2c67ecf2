//! The four pipeline stages
//!
//! A stage reads the results of earlier stages from the [`PipelineState`],
//! calls its collaborators, structures the generated prose and records exactly
//! one result. Errors never escape [`Stage::run`]; they become a failure in the
//! state instead.

mod financials;
mod news;
mod recommendation;
mod synthesis;

pub use financials::FinancialsStage;
pub use news::NewsStage;
pub use recommendation::{RecommendationStage, parse_recommendation};
pub use synthesis::SynthesisStage;

use crate::extract::contains_word;
use crate::pipeline::{PipelineState, StageName};
use async_trait::async_trait;

/// One unit of the fixed four-step pipeline
#[async_trait]
pub trait Stage: Send + Sync {
    /// Which result slot this stage owns
    fn name(&self) -> StageName;

    /// Run the stage and record its outcome in `state`
    async fn run(&self, state: &mut PipelineState);
}

/// Number of `keywords` present in `text` as whole words
pub(crate) fn keyword_hits(text: &str, keywords: &[&str]) -> usize {
    keywords.iter().filter(|k| contains_word(text, k)).count()
}
