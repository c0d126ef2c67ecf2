//! Runs the four stages in order and stops at the first failure

use super::result::StageName;
use super::state::{ExecutionSummary, PipelineState};
use crate::api::{
    DuckDuckGoClient, LlmTextGenerator, MarketData, NewsSearch, TextGenerator, YahooFinanceClient,
};
use crate::config::AdvisorConfig;
use crate::error::{AdvisorError, Result};
use crate::stages::{FinancialsStage, NewsStage, RecommendationStage, Stage, SynthesisStage};
use chrono::{DateTime, Local};
use futures::future::join_all;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{Instrument, error, info, info_span};
use uuid::Uuid;

/// External services shared by every stage and every run
#[derive(Clone)]
pub struct Collaborators {
    pub generator: Arc<dyn TextGenerator>,
    pub search: Arc<dyn NewsSearch>,
    pub market: Arc<dyn MarketData>,
}

impl Collaborators {
    /// Groq text generation, DuckDuckGo search and Yahoo Finance market data
    pub fn from_config(config: &AdvisorConfig) -> Result<Self> {
        Ok(Self {
            generator: Arc::new(LlmTextGenerator::from_config(config)?),
            search: Arc::new(DuckDuckGoClient::from_config(config)?),
            market: Arc::new(YahooFinanceClient::from_config(config)?),
        })
    }
}

/// Where a run is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "stage", rename_all = "snake_case")]
pub enum PipelineStatus {
    Pending,
    Running(StageName),
    Failed(StageName),
    Completed,
}

impl PipelineStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Failed(_) | Self::Completed)
    }
}

impl fmt::Display for PipelineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => f.write_str("Pending"),
            Self::Running(stage) => write!(f, "Running({stage})"),
            Self::Failed(stage) => write!(f, "Failed({stage})"),
            Self::Completed => f.write_str("Completed"),
        }
    }
}

/// Wall-clock time spent in one stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StageTiming {
    pub stage: StageName,
    pub elapsed: Duration,
    pub success: bool,
}

/// Final state of one run plus execution metadata
#[derive(Debug, Clone, Serialize)]
pub struct PipelineRun {
    pub run_id: Uuid,
    pub started_at: DateTime<Local>,
    pub state: PipelineState,
    pub elapsed: Duration,
    pub success: bool,
    pub status: PipelineStatus,
    pub stage_timings: Vec<StageTiming>,
}

impl PipelineRun {
    pub fn summary(&self) -> ExecutionSummary {
        self.state.summary()
    }

    /// "{stage} stage failed for {symbol}: {cause}" when the run failed
    pub fn failure_message(&self) -> Option<String> {
        self.state.failure().map(ToString::to_string)
    }
}

/// One symbol to analyze
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    pub symbol: String,
    pub company_name: Option<String>,
}

impl RunRequest {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            company_name: None,
        }
    }

    pub fn with_company_name(mut self, name: impl Into<String>) -> Self {
        self.company_name = Some(name.into());
        self
    }
}

/// Trim and uppercase a ticker, rejecting anything that cannot be one
pub fn normalize_symbol(raw: &str) -> Result<String> {
    let symbol = raw.trim().to_uppercase();
    let valid = !symbol.is_empty()
        && symbol.len() <= 12
        && symbol
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '='));

    if valid {
        Ok(symbol)
    } else {
        Err(AdvisorError::InvalidSymbol(raw.trim().to_string()))
    }
}

/// Fixed News → Financials → Synthesis → Recommendation chain
///
/// No stage is retried here; retries belong to the collaborators. The
/// orchestrator owns each run's [`PipelineState`] and lends it to one stage at
/// a time.
pub struct PipelineOrchestrator {
    stages: Vec<Box<dyn Stage>>,
}

impl PipelineOrchestrator {
    pub fn new(collaborators: Collaborators, statement_periods: usize) -> Self {
        let Collaborators {
            generator,
            search,
            market,
        } = collaborators;

        let stages: Vec<Box<dyn Stage>> = vec![
            Box::new(NewsStage::new(search, Arc::clone(&generator))),
            Box::new(FinancialsStage::new(
                market,
                Arc::clone(&generator),
                statement_periods,
            )),
            Box::new(SynthesisStage::new(Arc::clone(&generator))),
            Box::new(RecommendationStage::new(generator)),
        ];

        Self { stages }
    }

    pub fn from_config(config: &AdvisorConfig) -> Result<Self> {
        Ok(Self::new(
            Collaborators::from_config(config)?,
            config.statement_periods,
        ))
    }

    pub fn stage_names(&self) -> Vec<StageName> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Analyze one symbol
    ///
    /// Never fails as a whole: a stage error ends the run early and is
    /// reported through [`PipelineRun::success`] and the state's failure.
    pub async fn run(&self, symbol: &str, company_name: Option<&str>) -> PipelineRun {
        let run_id = Uuid::new_v4();
        let span = info_span!("pipeline", %run_id, symbol);
        self.execute(run_id, symbol, company_name)
            .instrument(span)
            .await
    }

    /// Analyze several symbols concurrently, one independent state each
    pub async fn run_batch(&self, requests: &[RunRequest]) -> Vec<PipelineRun> {
        info!("Starting batch of {} runs", requests.len());
        join_all(
            requests
                .iter()
                .map(|r| self.run(&r.symbol, r.company_name.as_deref())),
        )
        .await
    }

    async fn execute(
        &self,
        run_id: Uuid,
        symbol: &str,
        company_name: Option<&str>,
    ) -> PipelineRun {
        let started_at = Local::now();
        let started = Instant::now();
        let mut state = PipelineState::new(symbol, company_name);
        let mut status = PipelineStatus::Pending;
        let mut stage_timings = Vec::with_capacity(self.stages.len());

        info!("Starting analysis pipeline for {}", symbol);

        for stage in &self.stages {
            let name = stage.name();
            transition(&mut status, PipelineStatus::Running(name));

            let stage_started = Instant::now();
            stage.run(&mut state).await;
            let failed = state.is_failed();
            stage_timings.push(StageTiming {
                stage: name,
                elapsed: stage_started.elapsed(),
                success: !failed,
            });

            if failed {
                transition(&mut status, PipelineStatus::Failed(name));
                break;
            }
        }

        if !state.is_failed() {
            transition(&mut status, PipelineStatus::Completed);
        }

        let elapsed = started.elapsed();
        let success = !state.is_failed();
        match state.failure() {
            None => info!("Analysis pipeline completed for {} in {:.2?}", symbol, elapsed),
            Some(failure) => error!("Analysis pipeline stopped: {}", failure),
        }

        PipelineRun {
            run_id,
            started_at,
            state,
            elapsed,
            success,
            status,
            stage_timings,
        }
    }
}

fn transition(status: &mut PipelineStatus, next: PipelineStatus) {
    info!("Pipeline status: {} -> {}", status, next);
    *status = next;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{
        CompanyOverview, CompanyProfile, MockMarketData, MockNewsSearch, MockTextGenerator,
        NewsArticle, Quote, StatementPeriod, StatementSet,
    };
    use crate::extract::{Confidence, INSIGHT_PLACEHOLDER, NOT_SPECIFIED, Recommendation};
    use crate::pipeline::{Sentiment, StageResult};
    use crate::prompts::{FINANCIAL_RESEARCHER, INVESTMENT_EXPERT, NEWS_RESEARCHER, SENIOR_ANALYST};
    use advisor_llm::LLMError;
    use std::collections::BTreeMap;

    const NEWS_PROSE: &str = "## Key Highlights\n- Services revenue reached a record high\n- Strong iPhone demand in emerging markets";
    const FINANCIAL_PROSE: &str = "1. Gross margin expanded to 46%\n2. Net income remained robust";
    const SYNTHESIS_PROSE: &str = "## Executive Summary\nApple pairs strong fundamentals with positive news flow.\n\n## Conclusion\n- Key catalyst is the upcoming product cycle";
    const RECOMMENDATION_PROSE: &str = "After weighing everything we recommend a BUY.\nConfidence Level: High\nTarget Price Range: $210-$230\nInvestment Time Horizon: long-term\n\n## Reasoning\n- Services growth is the key driver of margin expansion";

    fn reply_for(system: &str) -> &'static str {
        match system {
            s if s == NEWS_RESEARCHER => NEWS_PROSE,
            s if s == FINANCIAL_RESEARCHER => FINANCIAL_PROSE,
            s if s == SENIOR_ANALYST => SYNTHESIS_PROSE,
            s if s == INVESTMENT_EXPERT => RECOMMENDATION_PROSE,
            _ => "",
        }
    }

    /// Generator answering per stage, failing on the stage whose system prompt is `fail_on`
    fn generator(calls: usize, fail_on: Option<&'static str>) -> MockTextGenerator {
        let mut generator = MockTextGenerator::new();
        generator
            .expect_generate()
            .times(calls)
            .returning(move |system, _| {
                if fail_on == Some(system) {
                    return Err(AdvisorError::Generation(LLMError::RequestFailed(
                        "503 Service Unavailable".to_string(),
                    )));
                }
                Ok(reply_for(system).to_string())
            });
        generator
    }

    fn search(calls: usize) -> MockNewsSearch {
        let mut search = MockNewsSearch::new();
        search.expect_search_news().times(calls).returning(|_, _| {
            Ok(vec![
                NewsArticle::new(
                    "Apple posts strong growth quarter",
                    "https://www.reuters.com/technology/apple",
                    "Profit up on services",
                ),
                NewsArticle::new("Short", "https://www.cnbc.com/apple", ""),
            ])
        });
        search.expect_search_overview().times(calls).returning(|_| {
            Ok(CompanyOverview {
                overview_text: "Apple designs consumer electronics and services.".to_string(),
                source: "DuckDuckGo Search".to_string(),
            })
        });
        search
    }

    fn income() -> StatementSet {
        let period = |date: &str, revenue: f64, net: f64| StatementPeriod {
            period: date.to_string(),
            items: BTreeMap::from([
                ("Total Revenue".to_string(), revenue),
                ("Net Income".to_string(), net),
            ]),
        };
        StatementSet {
            periods: vec![
                period("2024-09-28", 391.0e9, 93.7e9),
                period("2023-09-30", 383.3e9, 97.0e9),
            ],
        }
    }

    fn market(calls: usize) -> MockMarketData {
        let mut market = MockMarketData::new();
        market.expect_current_quote().times(calls).returning(|_| {
            Ok(Quote {
                price: Some(189.5),
                market_cap: Some(2.95e12),
                ..Quote::default()
            })
        });
        market.expect_company_profile().times(calls).returning(|_| {
            Ok(CompanyProfile {
                name: Some("Apple Inc.".to_string()),
                sector: Some("Technology".to_string()),
                ..CompanyProfile::default()
            })
        });
        market
            .expect_income_statements()
            .times(calls)
            .returning(|_, _| Ok(income()));
        market
            .expect_balance_sheet()
            .times(calls)
            .returning(|_, _| Ok(StatementSet::default()));
        market
    }

    fn orchestrator(
        generator: MockTextGenerator,
        search: MockNewsSearch,
        market: MockMarketData,
    ) -> PipelineOrchestrator {
        PipelineOrchestrator::new(
            Collaborators {
                generator: Arc::new(generator),
                search: Arc::new(search),
                market: Arc::new(market),
            },
            4,
        )
    }

    #[test]
    fn test_stage_order() {
        let orchestrator = orchestrator(
            MockTextGenerator::new(),
            MockNewsSearch::new(),
            MockMarketData::new(),
        );
        assert_eq!(orchestrator.stage_names(), StageName::ORDER.to_vec());
    }

    #[tokio::test]
    async fn test_full_run_recommends_buy() {
        let orchestrator = orchestrator(generator(4, None), search(1), market(1));
        let run = orchestrator.run("AAPL", None).await;

        assert!(run.success);
        assert_eq!(run.status, PipelineStatus::Completed);
        assert_eq!(run.state.completed_stages(), &StageName::ORDER);
        assert_eq!(run.stage_timings.len(), 4);
        assert!(run.stage_timings.iter().all(|t| t.success));
        assert!(run.failure_message().is_none());

        let news = run.state.news().and_then(StageResult::output).unwrap();
        assert_eq!(news.sentiment, Sentiment::Positive);
        assert_eq!(news.developments, vec!["Apple posts strong growth quarter"]);

        let financials = run.state.financials().and_then(StageResult::output).unwrap();
        assert_eq!(financials.health, "Healthy - Profitable");

        let recommendation = run.state.recommendation().and_then(StageResult::output).unwrap();
        assert_eq!(recommendation.recommendation, Recommendation::Buy);
        assert_eq!(recommendation.confidence, Confidence::High);
        assert_eq!(recommendation.target_price, "$210-$230");
        assert_eq!(recommendation.time_horizon, "Long-term (1+ years)");
        assert_eq!(
            recommendation.key_factors,
            vec!["Services growth is the key driver of margin expansion"]
        );
        assert_eq!(
            run.state.recommendation().and_then(StageResult::raw_text),
            Some(RECOMMENDATION_PROSE)
        );
    }

    #[tokio::test]
    async fn test_market_data_failure_stops_at_financials() {
        let mut market = MockMarketData::new();
        market
            .expect_current_quote()
            .times(1)
            .returning(|_| Err(AdvisorError::MarketData("connection reset by peer".to_string())));
        market.expect_company_profile().times(0);
        market.expect_income_statements().times(0);
        market.expect_balance_sheet().times(0);

        let orchestrator = orchestrator(generator(1, None), search(1), market);
        let run = orchestrator.run("AAPL", Some("Apple")).await;

        assert!(!run.success);
        assert_eq!(run.status, PipelineStatus::Failed(StageName::Financials));
        let failure = run.state.failure().unwrap();
        assert_eq!(failure.stage, StageName::Financials);
        assert!(failure.message.contains("connection reset by peer"));
        assert!(run.state.synthesis().is_none());
        assert!(run.state.recommendation().is_none());
        assert_eq!(run.state.completed_stages(), &[StageName::News]);
        assert_eq!(
            run.failure_message().unwrap(),
            "Financials stage failed for AAPL: Market data error: connection reset by peer"
        );
    }

    #[tokio::test]
    async fn test_news_failure_invokes_nothing_else() {
        let mut search = MockNewsSearch::new();
        search
            .expect_search_news()
            .times(1)
            .returning(|_, _| Err(AdvisorError::Search("HTTP 503".to_string())));
        search.expect_search_overview().times(0);

        let orchestrator = orchestrator(generator(0, None), search, market(0));
        let run = orchestrator.run("AAPL", None).await;

        assert_eq!(run.status, PipelineStatus::Failed(StageName::News));
        assert!(run.state.completed_stages().is_empty());
        assert_eq!(run.stage_timings.len(), 1);
        assert!(run.state.news().is_some_and(|r| !r.is_success()));
        assert!(run.state.financials().is_none());
    }

    #[tokio::test]
    async fn test_synthesis_failure() {
        let orchestrator =
            orchestrator(generator(3, Some(SENIOR_ANALYST)), search(1), market(1));
        let run = orchestrator.run("AAPL", None).await;

        assert_eq!(run.status, PipelineStatus::Failed(StageName::Synthesis));
        assert_eq!(
            run.state.completed_stages(),
            &[StageName::News, StageName::Financials]
        );
        assert!(run.state.recommendation().is_none());
    }

    #[tokio::test]
    async fn test_recommendation_failure() {
        let orchestrator =
            orchestrator(generator(4, Some(INVESTMENT_EXPERT)), search(1), market(1));
        let run = orchestrator.run("AAPL", None).await;

        assert!(!run.success);
        assert_eq!(run.status, PipelineStatus::Failed(StageName::Recommendation));
        assert_eq!(run.state.completed_stages().len(), 3);
        assert!(
            run.state
                .recommendation()
                .and_then(StageResult::error)
                .is_some_and(|e| e.contains("503"))
        );
        assert!(run.stage_timings.last().is_some_and(|t| !t.success));
    }

    #[tokio::test]
    async fn test_unstructured_prose_degrades_to_defaults() {
        let mut generator = MockTextGenerator::new();
        generator
            .expect_generate()
            .times(4)
            .returning(|_, _| Ok("The company appears to be doing fine overall".to_string()));

        let orchestrator = orchestrator(generator, search(1), market(1));
        let run = orchestrator.run("AAPL", None).await;
        assert!(run.success);

        let synthesis = run.state.synthesis().and_then(StageResult::output).unwrap();
        assert_eq!(synthesis.key_insights, vec![INSIGHT_PLACEHOLDER]);

        let recommendation = run.state.recommendation().and_then(StageResult::output).unwrap();
        assert_eq!(recommendation.recommendation, Recommendation::Hold);
        assert_eq!(recommendation.confidence, Confidence::Medium);
        assert_eq!(recommendation.target_price, NOT_SPECIFIED);
        assert!(recommendation.key_factors.is_empty());
    }

    #[tokio::test]
    async fn test_batch_runs_are_independent() {
        let orchestrator = orchestrator(generator(8, None), search(2), market(2));
        let requests = vec![
            RunRequest::new("AAPL").with_company_name("Apple"),
            RunRequest::new("MSFT"),
        ];
        let runs = orchestrator.run_batch(&requests).await;

        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].state.symbol(), "AAPL");
        assert_eq!(runs[0].state.company_name(), "Apple");
        assert_eq!(runs[1].state.symbol(), "MSFT");
        assert_eq!(runs[1].state.company_name(), "MSFT");
        assert!(runs.iter().all(|r| r.success));
        assert_ne!(runs[0].run_id, runs[1].run_id);
    }

    #[test]
    fn test_normalize_symbol() {
        assert_eq!(normalize_symbol(" aapl ").unwrap(), "AAPL");
        assert_eq!(normalize_symbol("brk.b").unwrap(), "BRK.B");
        assert_eq!(normalize_symbol("^GSPC").unwrap(), "^GSPC");
        assert!(matches!(normalize_symbol("  "), Err(AdvisorError::InvalidSymbol(_))));
        assert!(matches!(normalize_symbol("AA PL"), Err(AdvisorError::InvalidSymbol(_))));
        assert!(normalize_symbol("THISISWAYTOOLONG").is_err());
    }

    #[test]
    fn test_status_display() {
        assert_eq!(PipelineStatus::Pending.to_string(), "Pending");
        assert_eq!(
            PipelineStatus::Running(StageName::Synthesis).to_string(),
            "Running(Synthesis)"
        );
        assert!(PipelineStatus::Failed(StageName::News).is_terminal());
        assert!(!PipelineStatus::Running(StageName::News).is_terminal());
    }
}
