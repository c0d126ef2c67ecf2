//! News gathering and sentiment

use super::{Stage, keyword_hits};
use crate::api::{NewsArticle, NewsSearch, TextGenerator};
use crate::error::Result;
use crate::extract::extract_highlights;
use crate::pipeline::{NewsAnalysis, PipelineState, Sentiment, StageName};
use crate::prompts::{NEWS_RESEARCHER, news_analysis_prompt};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

const POSITIVE: &[&str] = &["positive", "growth", "profit", "success", "up", "gain", "strong"];
const NEGATIVE: &[&str] = &["negative", "loss", "decline", "down", "weak", "risk", "concern"];

/// Searches news and company background, then summarizes them
pub struct NewsStage {
    search: Arc<dyn NewsSearch>,
    generator: Arc<dyn TextGenerator>,
}

impl NewsStage {
    pub fn new(search: Arc<dyn NewsSearch>, generator: Arc<dyn TextGenerator>) -> Self {
        Self { search, generator }
    }

    async fn analyze(&self, state: &PipelineState) -> Result<(NewsAnalysis, String)> {
        let company = state.company_name();
        let symbol = state.symbol();

        let articles = self.search.search_news(company, symbol).await?;
        info!("Found {} news articles for {}", articles.len(), symbol);
        let overview = self.search.search_overview(company).await?;

        let prompt = news_analysis_prompt(company, symbol, &overview, &articles)?;
        let text = self.generator.generate(NEWS_RESEARCHER, &prompt).await?;

        let analysis = NewsAnalysis {
            sentiment: assess_sentiment(&articles),
            developments: key_developments(&articles),
            highlights: extract_highlights(&text, 5),
            company_overview: overview.overview_text,
            overview_source: overview.source,
            articles,
        };

        Ok((analysis, text))
    }
}

#[async_trait]
impl Stage for NewsStage {
    fn name(&self) -> StageName {
        StageName::News
    }

    async fn run(&self, state: &mut PipelineState) {
        let outcome = self.analyze(state).await;
        state.record(outcome);
    }
}

/// Article-level keyword vote over titles and snippets
pub(crate) fn assess_sentiment(articles: &[NewsArticle]) -> Sentiment {
    let (positive, negative) = articles.iter().fold((0, 0), |(pos, neg), article| {
        let text = format!("{} {}", article.title, article.snippet);
        (
            pos + keyword_hits(&text, POSITIVE),
            neg + keyword_hits(&text, NEGATIVE),
        )
    });
    debug!("Sentiment votes: {} positive, {} negative", positive, negative);

    match positive.cmp(&negative) {
        std::cmp::Ordering::Greater => Sentiment::Positive,
        std::cmp::Ordering::Less => Sentiment::Negative,
        std::cmp::Ordering::Equal => Sentiment::Neutral,
    }
}

/// Titles of the first three articles with a meaningful headline
pub(crate) fn key_developments(articles: &[NewsArticle]) -> Vec<String> {
    articles
        .iter()
        .map(|a| a.title.trim())
        .filter(|title| title.chars().count() > 10)
        .take(3)
        .map(str::to_string)
        .collect()
}
