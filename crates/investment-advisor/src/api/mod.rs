//! External collaborators: text generation, web search and market data
//!
//! The pipeline only sees the traits defined here. Concrete clients live in the
//! submodules; tests substitute the mockall-generated `Mock*` types.

mod generation;
mod search;
mod yahoo;

pub use generation::LlmTextGenerator;
pub use search::DuckDuckGoClient;
pub use yahoo::YahooFinanceClient;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Text-generation service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a completion for a system prompt and a user prompt
    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String>;
}

/// Web search for news and company background
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NewsSearch: Send + Sync {
    /// Recent articles about the company, possibly none
    async fn search_news(&self, company_name: &str, symbol: &str) -> Result<Vec<NewsArticle>>;

    /// Short description of the company's business
    async fn search_overview(&self, company_name: &str) -> Result<CompanyOverview>;
}

/// Quotes, profile and financial statements
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketData: Send + Sync {
    /// Latest trading data
    async fn current_quote(&self, symbol: &str) -> Result<Quote>;

    /// Descriptive company information
    async fn company_profile(&self, symbol: &str) -> Result<CompanyProfile>;

    /// Income statements, most recent period first
    async fn income_statements(&self, symbol: &str, periods: usize) -> Result<StatementSet>;

    /// Balance sheets, most recent period first
    async fn balance_sheet(&self, symbol: &str, periods: usize) -> Result<StatementSet>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsArticle {
    pub title: String,
    pub link: String,
    pub snippet: String,
    /// Host of `link`, or "Unknown"
    pub source: String,
}

impl NewsArticle {
    pub fn new(title: impl Into<String>, link: impl Into<String>, snippet: impl Into<String>) -> Self {
        let link = link.into();
        let source = source_of(&link);
        Self {
            title: title.into(),
            link,
            snippet: snippet.into(),
            source,
        }
    }
}

/// Host part of a URL, "Unknown" when it has none
pub fn source_of(link: &str) -> String {
    url::Url::parse(link)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| "Unknown".to_string())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyOverview {
    pub overview_text: String,
    pub source: String,
}

/// Latest trading data; any field may be missing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub price: Option<f64>,
    pub previous_close: Option<f64>,
    pub market_cap: Option<f64>,
    pub volume: Option<u64>,
    pub day_high: Option<f64>,
    pub day_low: Option<f64>,
    pub fifty_two_week_high: Option<f64>,
    pub fifty_two_week_low: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub name: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub country: Option<String>,
    pub website: Option<String>,
    pub business_summary: Option<String>,
    pub employees: Option<u64>,
}

/// One reporting period of a financial statement
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatementPeriod {
    /// Period end date, e.g. "2024-09-28"
    pub period: String,
    /// Line item name to value
    pub items: BTreeMap<String, f64>,
}

/// Statement periods ordered most recent first; empty when unavailable
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatementSet {
    pub periods: Vec<StatementPeriod>,
}

impl StatementSet {
    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    /// `item` for every period that reports it, most recent first
    pub fn series(&self, item: &str) -> Vec<(&str, f64)> {
        self.periods
            .iter()
            .filter_map(|p| p.items.get(item).map(|v| (p.period.as_str(), *v)))
            .collect()
    }

    /// `item` from the most recent period, if reported there
    pub fn latest(&self, item: &str) -> Option<f64> {
        self.periods.first().and_then(|p| p.items.get(item).copied())
    }
}

/// Render an optional number, "N/A" when missing
pub fn fmt_amount(value: Option<f64>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| format!("{v:.2}"))
}

/// Render a large dollar amount with a T/B/M suffix
pub fn fmt_large(value: Option<f64>) -> String {
    match value {
        Some(v) if v.abs() >= 1e12 => format!("${:.2}T", v / 1e12),
        Some(v) if v.abs() >= 1e9 => format!("${:.2}B", v / 1e9),
        Some(v) if v.abs() >= 1e6 => format!("${:.2}M", v / 1e6),
        Some(v) => format!("${v:.2}"),
        None => "N/A".to_string(),
    }
}

/// Whole-dollar amount with thousands separators, e.g. `$391,035,000,000` or `-$1,500`
pub fn fmt_dollars(value: f64) -> String {
    let grouped = group_thousands(value);
    match grouped.strip_prefix('-') {
        Some(magnitude) => format!("-${magnitude}"),
        None => format!("${grouped}"),
    }
}

/// Round to a whole number and group digits by thousands
pub fn group_thousands(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if rounded < 0.0 {
        grouped.insert(0, '-');
    }
    grouped
}
