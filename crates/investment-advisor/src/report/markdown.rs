//! Markdown analysis and recommendation reports

use super::{GeneratedReports, ReportAssembler, analysis_file_name, recommendation_file_name};
use crate::api::{fmt_amount, fmt_dollars, group_thousands};
use crate::config::AdvisorConfig;
use crate::error::Result;
use crate::extract::{RecommendationSection, SectionKey, SynthesisSection};
use crate::pipeline::{PipelineRun, StageResult};
use std::path::PathBuf;
use tracing::{info, warn};

/// Writes `{SYMBOL}_Analysis_{ts}.md` and `{SYMBOL}_Recommendation_{ts}.md`
pub struct MarkdownReportAssembler {
    analysis_dir: PathBuf,
    recommendation_dir: PathBuf,
}

impl MarkdownReportAssembler {
    pub fn new(analysis_dir: impl Into<PathBuf>, recommendation_dir: impl Into<PathBuf>) -> Self {
        Self {
            analysis_dir: analysis_dir.into(),
            recommendation_dir: recommendation_dir.into(),
        }
    }

    pub fn from_config(config: &AdvisorConfig) -> Self {
        Self::new(config.analysis_dir(), config.recommendation_dir())
    }
}

impl ReportAssembler for MarkdownReportAssembler {
    fn assemble(&self, run: &PipelineRun) -> Result<GeneratedReports> {
        if !run.success {
            warn!(
                "Skipping reports for {}: run did not complete",
                run.state.symbol()
            );
            return Ok(GeneratedReports::default());
        }

        let symbol = run.state.symbol();
        let timestamp = run.started_at.format("%Y%m%d_%H%M%S").to_string();

        std::fs::create_dir_all(&self.analysis_dir)?;
        std::fs::create_dir_all(&self.recommendation_dir)?;

        let analysis = self
            .analysis_dir
            .join(analysis_file_name(symbol, &timestamp));
        std::fs::write(&analysis, render_analysis(run))?;
        info!("Analysis report saved to {}", analysis.display());

        let recommendation = self
            .recommendation_dir
            .join(recommendation_file_name(symbol, &timestamp));
        std::fs::write(&recommendation, render_recommendation(run))?;
        info!("Recommendation report saved to {}", recommendation.display());

        Ok(GeneratedReports {
            analysis: Some(analysis),
            recommendation: Some(recommendation),
        })
    }
}

fn or_na(value: Option<&String>) -> &str {
    value.map_or("N/A", String::as_str)
}

fn push_list(out: &mut String, items: &[String], indent: &str) {
    for item in items {
        out.push_str(&format!("{indent}- {item}\n"));
    }
}

/// Company, market, news, financial and synthesis findings for one run
pub fn render_analysis(run: &PipelineRun) -> String {
    let state = &run.state;
    let mut out = format!(
        "# Investment Analysis Report: {}\nGenerated on: {}\n\n",
        state.symbol(),
        run.started_at.format("%Y-%m-%d %H:%M:%S")
    );

    let financials = state.financials().and_then(StageResult::output);
    let news = state.news().and_then(StageResult::output);
    let synthesis = state.synthesis().and_then(StageResult::output);

    if let Some(financials) = financials {
        let profile = &financials.profile;
        out.push_str("## Company Information\n");
        out.push_str(&format!(
            "- **Company Name**: {}\n",
            profile.name.as_deref().unwrap_or(state.company_name())
        ));
        out.push_str(&format!("- **Sector**: {}\n", or_na(profile.sector.as_ref())));
        out.push_str(&format!("- **Industry**: {}\n", or_na(profile.industry.as_ref())));
        out.push_str(&format!("- **Country**: {}\n\n", or_na(profile.country.as_ref())));

        let quote = &financials.quote;
        out.push_str("## Current Market Data\n");
        out.push_str(&format!("- **Current Price**: ${}\n", fmt_amount(quote.price)));
        out.push_str(&format!(
            "- **Market Cap**: {}\n",
            quote.market_cap.map_or_else(|| "N/A".to_string(), fmt_dollars)
        ));
        out.push_str(&format!(
            "- **Volume**: {}\n\n",
            quote
                .volume
                .map_or_else(|| "N/A".to_string(), |v| group_thousands(v as f64))
        ));
    }

    if let Some(news) = news {
        out.push_str("## News and Market Sentiment\n");
        out.push_str(&format!("- **Market Sentiment**: {}\n", news.sentiment));
        out.push_str("- **Key Developments**:\n");
        push_list(&mut out, &news.developments, "  ");
        out.push('\n');
    }

    if let Some(financials) = financials {
        out.push_str("## Financial Analysis\n");
        out.push_str(&format!("- **Financial Health**: {}\n", financials.health));
        out.push_str(&format!("- **Growth Trends**: {}\n", financials.growth_trend));
        out.push_str("- **Key Metrics**:\n");
        push_list(&mut out, &financials.metrics, "  ");
        out.push('\n');
    }

    if let Some(synthesis) = synthesis {
        out.push_str("## Comprehensive Analysis\n");
        let summary = synthesis.section(SynthesisSection::ExecutiveSummary);
        if !summary.is_empty() {
            out.push_str(&format!("### Executive Summary\n{summary}\n\n"));
        }
        if !synthesis.key_insights.is_empty() {
            out.push_str("### Key Insights\n");
            push_list(&mut out, &synthesis.key_insights, "");
            out.push('\n');
        }
        if let Some(text) = state.synthesis().and_then(StageResult::raw_text) {
            out.push_str(&format!("### Full Analysis (LLM)\n{text}\n\n"));
        }
    }

    if let Some(text) = state.news().and_then(StageResult::raw_text) {
        out.push_str(&format!("## News Analysis (LLM)\n{text}\n\n"));
    }
    if let Some(text) = state.financials().and_then(StageResult::raw_text) {
        out.push_str(&format!("## Financial Analysis (LLM)\n{text}\n\n"));
    }

    out
}

/// Headline recommendation, supporting sections and key factors
pub fn render_recommendation(run: &PipelineRun) -> String {
    let state = &run.state;
    let mut out = format!(
        "# Investment Recommendation: {}\nGenerated on: {}\n\n",
        state.symbol(),
        run.started_at.format("%Y-%m-%d %H:%M:%S")
    );

    let Some(recommendation) = state.recommendation().and_then(StageResult::output) else {
        return out;
    };

    let current_price = state
        .financials()
        .and_then(StageResult::output)
        .and_then(|f| f.quote.price)
        .map_or_else(|| "Not available".to_string(), |p| format!("${p:.2}"));

    out.push_str("## Investment Recommendation\n");
    out.push_str(&format!("**RECOMMENDATION**: {}\n", recommendation.recommendation));
    out.push_str(&format!("**Current Price**: {current_price}\n"));
    out.push_str(&format!("**Confidence Level**: {}\n", recommendation.confidence));
    out.push_str(&format!("**Target Price**: {}\n", recommendation.target_price));
    out.push_str(&format!("**Time Horizon**: {}\n\n", recommendation.time_horizon));

    for section in RecommendationSection::ALL {
        let body = recommendation.section(*section);
        if !body.trim().is_empty() {
            out.push_str(&format!("## {}\n{body}\n\n", section.title()));
        }
    }

    if !recommendation.key_factors.is_empty() {
        out.push_str("## Key Factors\n");
        push_list(&mut out, &recommendation.key_factors, "");
        out.push('\n');
    }

    if let Some(text) = state.recommendation().and_then(StageResult::raw_text) {
        out.push_str(&format!("## Full Recommendation (LLM)\n{text}\n\n"));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{CompanyProfile, Quote};
    use crate::error::AdvisorError;
    use crate::extract::{Confidence, Recommendation};
    use crate::pipeline::{
        FinancialAnalysis, NewsAnalysis, PipelineState, PipelineStatus, RecommendationAnalysis,
        Sentiment, StageName, SynthesisAnalysis,
    };
    use chrono::{Local, TimeZone};
    use std::collections::BTreeMap;
    use std::time::Duration;

    fn news() -> NewsAnalysis {
        NewsAnalysis {
            sentiment: Sentiment::Positive,
            developments: vec!["Apple unveils new AI features".to_string()],
            highlights: vec![],
            company_overview: String::new(),
            overview_source: "DuckDuckGo Search".to_string(),
            articles: vec![],
        }
    }

    fn financials() -> FinancialAnalysis {
        FinancialAnalysis {
            health: "Healthy - Profitable".to_string(),
            growth_trend: "Growing - Revenue increasing".to_string(),
            metrics: vec!["Gross margin of 46%".to_string()],
            risks: vec![],
            strengths: vec![],
            quote: Quote {
                price: Some(189.5),
                market_cap: Some(2_950_000_000_000.0),
                volume: Some(48_000_000),
                ..Quote::default()
            },
            profile: CompanyProfile {
                name: Some("Apple Inc.".to_string()),
                sector: Some("Technology".to_string()),
                ..CompanyProfile::default()
            },
        }
    }

    fn synthesis() -> SynthesisAnalysis {
        SynthesisAnalysis {
            sections: BTreeMap::from([(
                SynthesisSection::ExecutiveSummary,
                "Strong franchise.".to_string(),
            )]),
            key_insights: vec!["Key insight: services keep compounding".to_string()],
            correlations: BTreeMap::new(),
        }
    }

    fn recommendation() -> RecommendationAnalysis {
        RecommendationAnalysis {
            recommendation: Recommendation::Buy,
            confidence: Confidence::High,
            target_price: "$210-$230".to_string(),
            time_horizon: "Long-term (1+ years)".to_string(),
            key_factors: vec!["Services growth".to_string()],
            sections: BTreeMap::from([
                (RecommendationSection::Reasoning, "Margins expand.".to_string()),
                (RecommendationSection::MonitoringPoints, "  ".to_string()),
            ]),
        }
    }

    fn run(success: bool) -> PipelineRun {
        let mut state = PipelineState::new("AAPL", Some("Apple"));
        state.record(Ok((news(), "news prose".to_string())));
        state.record(Ok((financials(), "financial prose".to_string())));
        state.record(Ok((synthesis(), "synthesis prose".to_string())));
        if success {
            state.record(Ok((recommendation(), "recommendation prose".to_string())));
        } else {
            state.record::<RecommendationAnalysis>(Err(AdvisorError::Other("boom".to_string())));
        }

        PipelineRun {
            run_id: uuid::Uuid::new_v4(),
            started_at: Local.with_ymd_and_hms(2025, 3, 14, 9, 30, 0).unwrap(),
            state,
            elapsed: Duration::from_secs(12),
            success,
            status: if success {
                PipelineStatus::Completed
            } else {
                PipelineStatus::Failed(StageName::Recommendation)
            },
            stage_timings: vec![],
        }
    }

    #[test]
    fn test_render_analysis() {
        let report = render_analysis(&run(true));
        assert!(report.starts_with("# Investment Analysis Report: AAPL\nGenerated on: 2025-03-14 09:30:00"));
        assert!(report.contains("- **Company Name**: Apple Inc.\n"));
        assert!(report.contains("- **Industry**: N/A\n"));
        assert!(report.contains("- **Current Price**: $189.50\n"));
        assert!(report.contains("- **Market Cap**: $2,950,000,000,000\n"));
        assert!(report.contains("- **Volume**: 48,000,000\n"));
        assert!(report.contains("- **Market Sentiment**: Positive\n"));
        assert!(report.contains("  - Apple unveils new AI features\n"));
        assert!(report.contains("### Executive Summary\nStrong franchise."));
        assert!(report.contains("- Key insight: services keep compounding\n"));
        assert!(report.contains("## News Analysis (LLM)\nnews prose"));
        assert!(report.contains("## Financial Analysis (LLM)\nfinancial prose"));
    }

    #[test]
    fn test_render_recommendation_skips_blank_sections() {
        let report = render_recommendation(&run(true));
        assert!(report.contains("**RECOMMENDATION**: BUY\n"));
        assert!(report.contains("**Current Price**: $189.50\n"));
        assert!(report.contains("**Confidence Level**: High\n"));
        assert!(report.contains("**Target Price**: $210-$230\n"));
        assert!(report.contains("## Reasoning\nMargins expand."));
        assert!(!report.contains("## Monitoring Points"));
        assert!(!report.contains("## Risk Assessment"));
        assert!(report.contains("## Key Factors\n- Services growth\n"));
        assert!(report.contains("## Full Recommendation (LLM)\nrecommendation prose"));
    }

    #[test]
    fn test_assemble_writes_both_reports() {
        let root = std::env::temp_dir().join(format!("advisor-reports-{}", uuid::Uuid::new_v4()));
        let assembler = MarkdownReportAssembler::new(root.join("analysis"), root.join("recommendations"));

        let reports = assembler.assemble(&run(true)).unwrap();
        let analysis = reports.analysis.unwrap();
        let recommendation = reports.recommendation.unwrap();
        assert!(analysis.ends_with("analysis/AAPL_Analysis_20250314_093000.md"));
        assert!(recommendation.ends_with("recommendations/AAPL_Recommendation_20250314_093000.md"));
        assert!(std::fs::read_to_string(&recommendation).unwrap().contains("BUY"));

        std::fs::remove_dir_all(root).unwrap();
    }

    #[test]
    fn test_failed_run_writes_nothing() {
        let root = std::env::temp_dir().join(format!("advisor-failed-{}", uuid::Uuid::new_v4()));
        let assembler = MarkdownReportAssembler::new(root.join("analysis"), root.join("recommendations"));

        let reports = assembler.assemble(&run(false)).unwrap();
        assert!(reports.is_empty());
        assert!(!root.exists());
    }
}
