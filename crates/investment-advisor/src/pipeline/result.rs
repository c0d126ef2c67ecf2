//! Stage result types

use crate::api::{CompanyProfile, NewsArticle, Quote};
use crate::error::ErrorKind;
use crate::extract::{Confidence, Recommendation, RecommendationSection, SynthesisSection};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The four pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StageName {
    News,
    Financials,
    Synthesis,
    Recommendation,
}

impl StageName {
    pub const ORDER: [Self; 4] = [
        Self::News,
        Self::Financials,
        Self::Synthesis,
        Self::Recommendation,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::News => "News",
            Self::Financials => "Financials",
            Self::Synthesis => "Synthesis",
            Self::Recommendation => "Recommendation",
        }
    }
}

impl fmt::Display for StageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one stage: structured output plus the raw generated text, or an error
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StageResult<T> {
    Success { output: T, raw_text: String },
    Failure { message: String },
}

impl<T> StageResult<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn output(&self) -> Option<&T> {
        match self {
            Self::Success { output, .. } => Some(output),
            Self::Failure { .. } => None,
        }
    }

    pub fn raw_text(&self) -> Option<&str> {
        match self {
            Self::Success { raw_text, .. } => Some(raw_text),
            Self::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { message } => Some(message),
        }
    }
}

/// Why a run stopped
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageFailure {
    pub symbol: String,
    pub stage: StageName,
    pub message: String,
    pub kind: ErrorKind,
}

impl fmt::Display for StageFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} stage failed for {}: {}", self.stage, self.symbol, self.message)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sentiment {
    Positive,
    Negative,
    #[default]
    Neutral,
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Positive => "Positive",
            Self::Negative => "Negative",
            Self::Neutral => "Neutral",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationKey {
    /// News sentiment against financial health
    SentimentHealth,
    /// Recent developments against the growth trend
    DevelopmentsTrends,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsAnalysis {
    pub sentiment: Sentiment,
    pub developments: Vec<String>,
    pub highlights: Vec<String>,
    pub company_overview: String,
    pub overview_source: String,
    pub articles: Vec<NewsArticle>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancialAnalysis {
    pub health: String,
    pub growth_trend: String,
    pub metrics: Vec<String>,
    pub risks: Vec<String>,
    pub strengths: Vec<String>,
    pub quote: Quote,
    pub profile: CompanyProfile,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisAnalysis {
    pub sections: BTreeMap<SynthesisSection, String>,
    pub key_insights: Vec<String>,
    pub correlations: BTreeMap<CorrelationKey, String>,
}

impl SynthesisAnalysis {
    /// Body of `section`, empty when the prose had none
    pub fn section(&self, section: SynthesisSection) -> &str {
        self.sections.get(&section).map_or("", String::as_str)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationAnalysis {
    pub recommendation: Recommendation,
    pub confidence: Confidence,
    pub target_price: String,
    pub time_horizon: String,
    pub key_factors: Vec<String>,
    pub sections: BTreeMap<RecommendationSection, String>,
}

impl RecommendationAnalysis {
    /// Body of `section`, empty when the prose had none
    pub fn section(&self, section: RecommendationSection) -> &str {
        self.sections.get(&section).map_or("", String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_result_accessors() {
        let ok: StageResult<u32> = StageResult::Success {
            output: 7,
            raw_text: "seven".to_string(),
        };
        assert!(ok.is_success());
        assert_eq!(ok.output(), Some(&7));
        assert_eq!(ok.raw_text(), Some("seven"));
        assert_eq!(ok.error(), None);

        let failed: StageResult<u32> = StageResult::Failure {
            message: "timeout".to_string(),
        };
        assert!(!failed.is_success());
        assert_eq!(failed.output(), None);
        assert_eq!(failed.error(), Some("timeout"));
    }

    #[test]
    fn test_stage_result_serialization() {
        let failed: StageResult<u32> = StageResult::Failure {
            message: "timeout".to_string(),
        };
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["status"], "failure");
        assert_eq!(json["message"], "timeout");
    }

    #[test]
    fn test_failure_display() {
        let failure = StageFailure {
            symbol: "AAPL".to_string(),
            stage: StageName::Financials,
            message: "Market data error: connection reset".to_string(),
            kind: ErrorKind::Collaborator,
        };
        assert_eq!(
            failure.to_string(),
            "Financials stage failed for AAPL: Market data error: connection reset"
        );
    }

    #[test]
    fn test_stage_order() {
        assert_eq!(StageName::ORDER[0], StageName::News);
        assert!(StageName::Synthesis < StageName::Recommendation);
    }
}
