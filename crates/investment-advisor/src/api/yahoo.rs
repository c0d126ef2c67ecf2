//! Yahoo Finance market data

use super::{CompanyProfile, MarketData, Quote, StatementPeriod, StatementSet};
use crate::config::AdvisorConfig;
use crate::error::{AdvisorError, Result};
use crate::retry::RetryPolicy;
use async_trait::async_trait;
use chrono::DateTime;
use reqwest::Client;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use time::OffsetDateTime;
use tracing::{debug, warn};
use yahoo_finance_api as yahoo;

const SUMMARY_URL: &str = "https://query2.finance.yahoo.com/v10/finance/quoteSummary";
const USER_AGENT: &str = "Mozilla/5.0 (compatible; investment-advisor/0.1)";

/// Yahoo field name to statement line item
const INCOME_ITEMS: &[(&str, &str)] = &[
    ("totalRevenue", "Total Revenue"),
    ("grossProfit", "Gross Profit"),
    ("operatingIncome", "Operating Income"),
    ("netIncome", "Net Income"),
];
const BALANCE_ITEMS: &[(&str, &str)] = &[
    ("totalAssets", "Total Assets"),
    ("totalLiab", "Total Liabilities Net Minority Interest"),
    ("totalStockholderEquity", "Stockholders Equity"),
    ("cash", "Cash And Cash Equivalents"),
];

/// One daily bar, reduced to what the quote needs
#[derive(Debug, Clone, Copy, PartialEq)]
struct Bar {
    high: f64,
    low: f64,
    close: f64,
    volume: u64,
}

/// [`MarketData`] backed by Yahoo Finance
///
/// Prices come from the chart API through `yahoo_finance_api`; profile and
/// statements come from the `quoteSummary` JSON endpoint.
pub struct YahooFinanceClient {
    client: Client,
    retry: RetryPolicy,
}

impl YahooFinanceClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            retry: RetryPolicy::default(),
        })
    }

    pub fn from_config(config: &AdvisorConfig) -> Result<Self> {
        let mut client = Self::new(config.request_timeout)?;
        client.retry = config.retry_policy();
        Ok(client)
    }

    async fn daily_bars(&self, symbol: &str) -> Result<Vec<Bar>> {
        let provider =
            yahoo::YahooConnector::new().map_err(|e| AdvisorError::MarketData(e.to_string()))?;

        let end = OffsetDateTime::now_utc();
        let start = end - time::Duration::days(365);

        let response = provider
            .get_quote_history(symbol, start, end)
            .await
            .map_err(|e| history_error(symbol, e.to_string()))?;
        let quotes = response
            .quotes()
            .map_err(|e| history_error(symbol, e.to_string()))?;

        Ok(quotes
            .iter()
            .map(|q| Bar {
                high: q.high,
                low: q.low,
                close: q.close,
                volume: q.volume,
            })
            .collect())
    }

    /// `quoteSummary` result for `modules`, `None` when Yahoo has nothing to serve
    async fn summary(&self, symbol: &str, modules: &str) -> Result<Option<Value>> {
        self.retry
            .execute("yahoo_quote_summary", || self.summary_once(symbol, modules))
            .await
    }

    async fn summary_once(&self, symbol: &str, modules: &str) -> Result<Option<Value>> {
        let url = format!("{SUMMARY_URL}/{symbol}");
        let response = self
            .client
            .get(&url)
            .query(&[("modules", modules)])
            .send()
            .await
            .map_err(|e| AdvisorError::MarketData(format!("Yahoo request failed: {e}")))?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(AdvisorError::RateLimitExceeded {
                provider: "yahoo".to_string(),
            });
        }
        if status.is_server_error() {
            return Err(AdvisorError::MarketData(format!("Yahoo returned {status}")));
        }
        if !status.is_success() {
            warn!("quoteSummary for {} unavailable ({})", symbol, status);
            return Ok(None);
        }

        let body: Value = response.json().await?;
        Ok(body
            .pointer("/quoteSummary/result/0")
            .filter(|v| !v.is_null())
            .cloned())
    }
}

/// Messages Yahoo uses when a symbol simply has no price history
const NO_HISTORY_MARKERS: &[&str] = &[
    "empty data set",
    "no quotes",
    "no result",
    "no data",
    "not found",
    "404",
];

/// Map a price-history failure; a missing history is permanent and must not be retried
fn history_error(symbol: &str, message: String) -> AdvisorError {
    let lower = message.to_lowercase();
    if NO_HISTORY_MARKERS.iter().any(|m| lower.contains(m)) {
        debug!("No price history for {}: {}", symbol, message);
        AdvisorError::InvalidSymbol(symbol.to_string())
    } else {
        AdvisorError::MarketData(message)
    }
}

#[async_trait]
impl MarketData for YahooFinanceClient {
    async fn current_quote(&self, symbol: &str) -> Result<Quote> {
        let bars = self
            .retry
            .execute("yahoo_quote_history", || self.daily_bars(symbol))
            .await?;
        if bars.is_empty() {
            return Err(AdvisorError::InvalidSymbol(symbol.to_string()));
        }

        let mut quote = summarize_bars(&bars);
        match self.summary(symbol, "price,summaryDetail").await {
            Ok(Some(summary)) => {
                quote.market_cap = raw_number(&summary, "/price/marketCap")
                    .or_else(|| raw_number(&summary, "/summaryDetail/marketCap"));
            }
            Ok(None) => {}
            Err(e) => warn!("Market cap lookup failed for {}: {}", symbol, e),
        }
        debug!("{} quote: {:?}", symbol, quote);

        Ok(quote)
    }

    async fn company_profile(&self, symbol: &str) -> Result<CompanyProfile> {
        Ok(self
            .summary(symbol, "assetProfile,price")
            .await?
            .map(|summary| parse_profile(&summary))
            .unwrap_or_default())
    }

    async fn income_statements(&self, symbol: &str, periods: usize) -> Result<StatementSet> {
        Ok(self
            .summary(symbol, "incomeStatementHistory")
            .await?
            .map(|summary| {
                parse_statements(
                    &summary,
                    "/incomeStatementHistory/incomeStatementHistory",
                    INCOME_ITEMS,
                    periods,
                )
            })
            .unwrap_or_default())
    }

    async fn balance_sheet(&self, symbol: &str, periods: usize) -> Result<StatementSet> {
        Ok(self
            .summary(symbol, "balanceSheetHistory")
            .await?
            .map(|summary| {
                parse_statements(
                    &summary,
                    "/balanceSheetHistory/balanceSheetStatements",
                    BALANCE_ITEMS,
                    periods,
                )
            })
            .unwrap_or_default())
    }
}

/// Latest bar for the day, the one before for the previous close, all for the 52-week range
fn summarize_bars(bars: &[Bar]) -> Quote {
    let last = bars.last();
    let previous = bars.len().checked_sub(2).and_then(|i| bars.get(i));

    let high = bars.iter().map(|b| b.high).fold(f64::NAN, f64::max);
    let low = bars.iter().map(|b| b.low).fold(f64::NAN, f64::min);

    Quote {
        price: last.map(|b| b.close),
        previous_close: previous.map(|b| b.close),
        market_cap: None,
        volume: last.map(|b| b.volume),
        day_high: last.map(|b| b.high),
        day_low: last.map(|b| b.low),
        fifty_two_week_high: (!high.is_nan()).then_some(high),
        fifty_two_week_low: (!low.is_nan()).then_some(low),
    }
}

/// Yahoo wraps numbers as `{"raw": 1.0, "fmt": "1.00"}`
fn raw_number(value: &Value, pointer: &str) -> Option<f64> {
    let field = value.pointer(pointer)?;
    field
        .get("raw")
        .and_then(Value::as_f64)
        .or_else(|| field.as_f64())
}

fn text(value: &Value, pointer: &str) -> Option<String> {
    value
        .pointer(pointer)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn parse_profile(summary: &Value) -> CompanyProfile {
    CompanyProfile {
        name: text(summary, "/price/longName").or_else(|| text(summary, "/price/shortName")),
        sector: text(summary, "/assetProfile/sector"),
        industry: text(summary, "/assetProfile/industry"),
        country: text(summary, "/assetProfile/country"),
        website: text(summary, "/assetProfile/website"),
        business_summary: text(summary, "/assetProfile/longBusinessSummary"),
        employees: summary
            .pointer("/assetProfile/fullTimeEmployees")
            .and_then(Value::as_u64),
    }
}

/// Statement periods under `pointer`, most recent first, at most `periods`
fn parse_statements(
    summary: &Value,
    pointer: &str,
    items: &[(&str, &str)],
    periods: usize,
) -> StatementSet {
    let Some(rows) = summary.pointer(pointer).and_then(Value::as_array) else {
        return StatementSet::default();
    };

    let mut parsed: Vec<(i64, StatementPeriod)> = rows
        .iter()
        .filter_map(|row| {
            let end = row.pointer("/endDate/raw").and_then(Value::as_i64)?;
            let period = text(row, "/endDate/fmt").or_else(|| {
                DateTime::from_timestamp(end, 0).map(|d| d.format("%Y-%m-%d").to_string())
            })?;

            let values: BTreeMap<String, f64> = items
                .iter()
                .filter_map(|(field, name)| {
                    raw_number(row, &format!("/{field}")).map(|v| ((*name).to_string(), v))
                })
                .collect();
            Some((end, StatementPeriod { period, items: values }))
        })
        .collect();

    parsed.sort_by(|a, b| b.0.cmp(&a.0));
    StatementSet {
        periods: parsed.into_iter().take(periods).map(|(_, p)| p).collect(),
    }
}
