//! Four-stage equity research pipeline
//!
//! For one ticker symbol the crate gathers recent news, pulls market data and
//! financial statements, asks a language model to synthesize both, and turns a
//! final model answer into a structured recommendation:
//!
//! - News: web search, keyword sentiment, generated news analysis
//! - Financials: quote, profile and statements from Yahoo Finance
//! - Synthesis: seven named sections, key insights, news/financials correlations
//! - Recommendation: BUY/HOLD/SELL, confidence, target price, time horizon
//!
//! # Architecture
//!
//! [`PipelineOrchestrator`] runs the stages in a fixed order over one
//! [`PipelineState`] and stops at the first stage that records a failure. The
//! stages reach the outside world only through the [`api::TextGenerator`],
//! [`api::NewsSearch`] and [`api::MarketData`] traits. The [`extract`] module
//! recovers typed fields from generated prose and never fails.
//!
//! # Example
//!
//! ```rust,ignore
//! use investment_advisor::{AdvisorConfig, MarkdownReportAssembler, PipelineOrchestrator, ReportAssembler};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = AdvisorConfig::from_env()?;
//!     let orchestrator = PipelineOrchestrator::from_config(&config)?;
//!
//!     let run = orchestrator.run("AAPL", Some("Apple")).await;
//!     MarkdownReportAssembler::from_config(&config).assemble(&run)?;
//!     println!("{:?}", run.summary());
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod extract;
pub mod pipeline;
pub mod prompts;
pub mod report;
pub mod retry;
pub mod stages;

// Re-export main types for convenience
pub use config::AdvisorConfig;
pub use error::{AdvisorError, ErrorKind, Result};
pub use extract::{Confidence, Recommendation};
pub use pipeline::{
    ExecutionSummary, PipelineOrchestrator, PipelineRun, PipelineState, PipelineStatus,
    RunRequest, StageName, normalize_symbol,
};
pub use report::{GeneratedReports, MarkdownReportAssembler, ReportAssembler, find_reports};
pub use retry::RetryPolicy;
