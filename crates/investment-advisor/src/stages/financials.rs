//! Market data, statements and a rule-based health check

use super::Stage;
use crate::api::{
    MarketData, Quote, StatementSet, TextGenerator, fmt_amount, fmt_dollars, group_thousands,
};
use crate::error::Result;
use crate::extract::extract_highlights;
use crate::pipeline::{FinancialAnalysis, PipelineState, StageName};
use crate::prompts::{FINANCIAL_RESEARCHER, financial_analysis_prompt};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

const REVENUE: &str = "Total Revenue";
const NET_INCOME: &str = "Net Income";
const TOTAL_ASSETS: &str = "Total Assets";
const TOTAL_LIABILITIES: &str = "Total Liabilities Net Minority Interest";

/// Gathers quote, profile and statements, then asks for an interpretation
pub struct FinancialsStage {
    market: Arc<dyn MarketData>,
    generator: Arc<dyn TextGenerator>,
    statement_periods: usize,
}

impl FinancialsStage {
    pub fn new(
        market: Arc<dyn MarketData>,
        generator: Arc<dyn TextGenerator>,
        statement_periods: usize,
    ) -> Self {
        Self {
            market,
            generator,
            statement_periods,
        }
    }

    async fn analyze(&self, state: &PipelineState) -> Result<(FinancialAnalysis, String)> {
        let symbol = state.symbol();

        let quote = self.market.current_quote(symbol).await?;
        let profile = self.market.company_profile(symbol).await?;
        let income = self
            .market
            .income_statements(symbol, self.statement_periods)
            .await?;
        let balance = self
            .market
            .balance_sheet(symbol, self.statement_periods)
            .await?;
        info!(
            "Retrieved {} income and {} balance sheet periods for {}",
            income.periods.len(),
            balance.periods.len(),
            symbol
        );

        let prompt = financial_analysis_prompt(
            state.company_name(),
            symbol,
            &profile,
            &market_summary(&quote),
            &financial_summary(&quote, &income, &balance),
        )?;
        let text = self.generator.generate(FINANCIAL_RESEARCHER, &prompt).await?;

        let analysis = FinancialAnalysis {
            health: assess_health(&income).to_string(),
            growth_trend: growth_trend(&income).to_string(),
            metrics: extract_highlights(&text, 5),
            risks: risk_factors(&quote, &income),
            strengths: strengths(&income),
            quote,
            profile,
        };
        debug!("{} health: {}, trend: {}", symbol, analysis.health, analysis.growth_trend);

        Ok((analysis, text))
    }
}

#[async_trait]
impl Stage for FinancialsStage {
    fn name(&self) -> StageName {
        StageName::Financials
    }

    async fn run(&self, state: &mut PipelineState) {
        let outcome = self.analyze(state).await;
        state.record(outcome);
    }
}

fn market_summary(quote: &Quote) -> String {
    let mut parts = Vec::new();
    if let Some(price) = quote.price {
        parts.push(format!("Current Price: ${}", fmt_amount(Some(price))));
    }
    if let Some(previous) = quote.previous_close {
        parts.push(format!("Previous Close: ${}", fmt_amount(Some(previous))));
    }
    if let Some(volume) = quote.volume {
        parts.push(format!("Volume: {}", group_thousands(volume as f64)));
    }

    if parts.is_empty() {
        "Market data unavailable".to_string()
    } else {
        parts.join("\n")
    }
}

/// Price, market cap and the two most recent periods of the headline items
pub(crate) fn financial_summary(quote: &Quote, income: &StatementSet, balance: &StatementSet) -> String {
    let mut parts = Vec::new();

    if let Some(price) = quote.price {
        parts.push(format!("Current Price: ${}", fmt_amount(Some(price))));
    }
    if let Some(cap) = quote.market_cap {
        parts.push(format!("Market Cap: {}", fmt_dollars(cap)));
    }

    for period in income.periods.iter().take(2) {
        if let Some(revenue) = period.items.get(REVENUE) {
            parts.push(format!("{} Revenue: {}", period.period, fmt_dollars(*revenue)));
        }
        if let Some(net) = period.items.get(NET_INCOME) {
            parts.push(format!("{} Net Income: {}", period.period, fmt_dollars(*net)));
        }
    }

    for period in balance.periods.iter().take(2) {
        if let Some(assets) = period.items.get(TOTAL_ASSETS) {
            parts.push(format!("{} Total Assets: {}", period.period, fmt_dollars(*assets)));
        }
        if let Some(liabilities) = period.items.get(TOTAL_LIABILITIES) {
            parts.push(format!(
                "{} Total Liabilities: {}",
                period.period,
                fmt_dollars(*liabilities)
            ));
        }
    }

    if parts.is_empty() {
        "Limited financial data available".to_string()
    } else {
        parts.join("\n")
    }
}

/// Profitability of the most recent period
pub(crate) fn assess_health(income: &StatementSet) -> &'static str {
    match income.latest(NET_INCOME) {
        Some(net) if net > 0.0 => "Healthy - Profitable",
        Some(net) if net < 0.0 => "Concerning - Loss-making",
        _ => "Moderate - Limited data available",
    }
}

/// Revenue of the latest period against the one before it
pub(crate) fn growth_trend(income: &StatementSet) -> &'static str {
    match latest_two_revenues(income) {
        Some((recent, previous)) if recent > previous => "Growing - Revenue increasing",
        Some(_) => "Declining - Revenue decreasing",
        None => "Stable - Insufficient data for trend analysis",
    }
}

fn latest_two_revenues(income: &StatementSet) -> Option<(f64, f64)> {
    let recent = income.periods.first()?.items.get(REVENUE)?;
    let previous = income.periods.get(1)?.items.get(REVENUE)?;
    Some((*recent, *previous))
}

pub(crate) fn risk_factors(quote: &Quote, income: &StatementSet) -> Vec<String> {
    let mut risks = Vec::new();
    if quote.price.is_none() {
        risks.push("Data retrieval issues".to_string());
    }
    risks.extend(
        income
            .series(NET_INCOME)
            .into_iter()
            .filter(|(_, net)| *net < 0.0)
            .map(|(period, _)| format!("Loss-making in {period}")),
    );

    if risks.is_empty() {
        return vec!["No significant risks identified".to_string()];
    }
    risks.truncate(3);
    risks
}

pub(crate) fn strengths(income: &StatementSet) -> Vec<String> {
    let mut strengths: Vec<String> = income
        .series(NET_INCOME)
        .into_iter()
        .filter(|(_, net)| *net > 0.0)
        .map(|(period, _)| format!("Profitable in {period}"))
        .collect();
    if latest_two_revenues(income).is_some_and(|(recent, previous)| recent > previous) {
        strengths.push("Revenue growth".to_string());
    }

    if strengths.is_empty() {
        return vec!["Limited strength indicators available".to_string()];
    }
    strengths.truncate(3);
    strengths
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{CompanyProfile, MockMarketData, MockTextGenerator, StatementPeriod};
    use crate::error::AdvisorError;
    use crate::pipeline::StageResult;
    use std::collections::BTreeMap;

    fn period(date: &str, items: &[(&str, f64)]) -> StatementPeriod {
        StatementPeriod {
            period: date.to_string(),
            items: items
                .iter()
                .map(|(k, v)| ((*k).to_string(), *v))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    fn income(periods: Vec<StatementPeriod>) -> StatementSet {
        StatementSet { periods }
    }

    #[test]
    fn test_health_and_trend() {
        let growing = income(vec![
            period("2024-09-28", &[(REVENUE, 391.0), (NET_INCOME, 94.0)]),
            period("2023-09-30", &[(REVENUE, 383.0), (NET_INCOME, 97.0)]),
        ]);
        assert_eq!(assess_health(&growing), "Healthy - Profitable");
        assert_eq!(growth_trend(&growing), "Growing - Revenue increasing");

        let shrinking = income(vec![
            period("2024-12-31", &[(REVENUE, 10.0), (NET_INCOME, -2.0)]),
            period("2023-12-31", &[(REVENUE, 12.0)]),
        ]);
        assert_eq!(assess_health(&shrinking), "Concerning - Loss-making");
        assert_eq!(growth_trend(&shrinking), "Declining - Revenue decreasing");

        let empty = StatementSet::default();
        assert_eq!(assess_health(&empty), "Moderate - Limited data available");
        assert_eq!(growth_trend(&empty), "Stable - Insufficient data for trend analysis");
    }

    #[test]
    fn test_risks_and_strengths() {
        let set = income(vec![
            period("2024", &[(REVENUE, 20.0), (NET_INCOME, 5.0)]),
            period("2023", &[(REVENUE, 15.0), (NET_INCOME, -1.0)]),
            period("2022", &[(NET_INCOME, -3.0)]),
        ]);
        let quote = Quote::default();

        assert_eq!(
            risk_factors(&quote, &set),
            vec!["Data retrieval issues", "Loss-making in 2023", "Loss-making in 2022"]
        );
        assert_eq!(strengths(&set), vec!["Profitable in 2024", "Revenue growth"]);

        let priced = Quote {
            price: Some(10.0),
            ..Quote::default()
        };
        let empty = StatementSet::default();
        assert_eq!(risk_factors(&priced, &empty), vec!["No significant risks identified"]);
        assert_eq!(strengths(&empty), vec!["Limited strength indicators available"]);
    }

    #[test]
    fn test_financial_summary() {
        let quote = Quote {
            price: Some(189.5),
            market_cap: Some(2_950_000_000_000.0),
            ..Quote::default()
        };
        let income = income(vec![period("2024-09-28", &[(REVENUE, 391_035_000_000.0)])]);
        let balance = StatementSet {
            periods: vec![period("2024-09-28", &[(TOTAL_ASSETS, 364_980_000_000.0)])],
        };

        let summary = financial_summary(&quote, &income, &balance);
        assert!(summary.contains("Current Price: $189.50"));
        assert!(summary.contains("Market Cap: $2,950,000,000,000"));
        assert!(summary.contains("2024-09-28 Revenue: $391,035,000,000"));
        assert!(summary.contains("2024-09-28 Total Assets: $364,980,000,000"));

        assert_eq!(
            financial_summary(&Quote::default(), &StatementSet::default(), &StatementSet::default()),
            "Limited financial data available"
        );
        assert_eq!(market_summary(&Quote::default()), "Market data unavailable");
    }

    #[tokio::test]
    async fn test_run_success() {
        let mut market = MockMarketData::new();
        market.expect_current_quote().times(1).returning(|_| {
            Ok(Quote {
                price: Some(189.5),
                ..Quote::default()
            })
        });
        market.expect_company_profile().times(1).returning(|_| {
            Ok(CompanyProfile {
                name: Some("Apple Inc.".to_string()),
                ..CompanyProfile::default()
            })
        });
        market
            .expect_income_statements()
            .withf(|symbol, periods| symbol == "AAPL" && *periods == 4)
            .times(1)
            .returning(|_, _| {
                Ok(income(vec![
                    period("2024-09-28", &[(REVENUE, 391.0), (NET_INCOME, 94.0)]),
                    period("2023-09-30", &[(REVENUE, 383.0), (NET_INCOME, 97.0)]),
                ]))
            });
        market
            .expect_balance_sheet()
            .times(1)
            .returning(|_, _| Ok(StatementSet::default()));

        let mut generator = MockTextGenerator::new();
        generator
            .expect_generate()
            .times(1)
            .returning(|_, _| Ok("1. Revenue grew 2% year over year\n2. Net margin near 24%".to_string()));

        let stage = FinancialsStage::new(Arc::new(market), Arc::new(generator), 4);
        let mut state = PipelineState::new("AAPL", None);
        stage.run(&mut state).await;

        let financials = state.financials().and_then(StageResult::output).unwrap();
        assert_eq!(financials.health, "Healthy - Profitable");
        assert_eq!(financials.growth_trend, "Growing - Revenue increasing");
        assert_eq!(financials.metrics[0], "Revenue grew 2% year over year");
        assert_eq!(financials.risks, vec!["No significant risks identified"]);
        assert_eq!(financials.profile.name.as_deref(), Some("Apple Inc."));
    }

    #[tokio::test]
    async fn test_quote_failure_stops_stage() {
        let mut market = MockMarketData::new();
        market
            .expect_current_quote()
            .times(1)
            .returning(|_| Err(AdvisorError::MarketData("connection reset".to_string())));
        market.expect_company_profile().times(0);
        let mut generator = MockTextGenerator::new();
        generator.expect_generate().times(0);

        let stage = FinancialsStage::new(Arc::new(market), Arc::new(generator), 4);
        let mut state = PipelineState::new("AAPL", None);
        stage.run(&mut state).await;

        assert_eq!(state.failure().map(|f| f.stage), Some(StageName::Financials));
    }
}
