//! Named prose sections

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// A fixed set of section headings that make up one kind of document
pub trait SectionKey: Copy + Ord + 'static {
    /// Every section in document order
    const ALL: &'static [Self];

    /// Every heading that can delimit a section in this document, lowercase
    const BOUNDARIES: &'static [&'static str];

    /// Heading text as it appears in generated prose
    fn title(self) -> &'static str;
}

/// Sections of the comprehensive analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SynthesisSection {
    ExecutiveSummary,
    CompanyOverview,
    FinancialAnalysis,
    NewsSentiment,
    RiskAssessment,
    InvestmentThesis,
    Conclusion,
}

impl SectionKey for SynthesisSection {
    const ALL: &'static [Self] = &[
        Self::ExecutiveSummary,
        Self::CompanyOverview,
        Self::FinancialAnalysis,
        Self::NewsSentiment,
        Self::RiskAssessment,
        Self::InvestmentThesis,
        Self::Conclusion,
    ];

    const BOUNDARIES: &'static [&'static str] = &[
        "executive summary",
        "company overview",
        "financial analysis",
        "news and market sentiment",
        "risk assessment",
        "investment thesis",
        "conclusion",
    ];

    fn title(self) -> &'static str {
        match self {
            Self::ExecutiveSummary => "Executive Summary",
            Self::CompanyOverview => "Company Overview",
            Self::FinancialAnalysis => "Financial Analysis",
            Self::NewsSentiment => "News and Market Sentiment",
            Self::RiskAssessment => "Risk Assessment",
            Self::InvestmentThesis => "Investment Thesis",
            Self::Conclusion => "Conclusion",
        }
    }
}

/// Sections of the investment recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationSection {
    Reasoning,
    RiskAssessment,
    InvestmentStrategy,
    MonitoringPoints,
    AlternativeScenarios,
}

impl SectionKey for RecommendationSection {
    const ALL: &'static [Self] = &[
        Self::Reasoning,
        Self::RiskAssessment,
        Self::InvestmentStrategy,
        Self::MonitoringPoints,
        Self::AlternativeScenarios,
    ];

    // The recommendation line itself also closes whatever precedes it
    const BOUNDARIES: &'static [&'static str] = &[
        "recommendation",
        "reasoning",
        "risk assessment",
        "investment strategy",
        "monitoring points",
        "alternative scenarios",
    ];

    fn title(self) -> &'static str {
        match self {
            Self::Reasoning => "Reasoning",
            Self::RiskAssessment => "Risk Assessment",
            Self::InvestmentStrategy => "Investment Strategy",
            Self::MonitoringPoints => "Monitoring Points",
            Self::AlternativeScenarios => "Alternative Scenarios",
        }
    }
}

/// A markdown heading or a line that is bold from end to end
fn is_heading(trimmed: &str) -> bool {
    trimmed.starts_with('#')
        || (trimmed.starts_with("**")
            && (trimmed.ends_with("**") || trimmed.ends_with("**:"))
            && trimmed.len() > 4)
}

/// Body of the section called `section_name`, or `""` when it never appears
///
/// The section opens on a line that mentions the name and is either a heading
/// or ends with a colon. It closes on the next heading or the next line that
/// mentions any other name in `boundaries`.
pub fn extract_section(text: &str, section_name: &str, boundaries: &[&str]) -> String {
    let target = section_name.to_lowercase();
    let others: Vec<String> = boundaries
        .iter()
        .map(|b| b.to_lowercase())
        .filter(|b| *b != target)
        .collect();

    let mut lines = text.lines();
    let opened = lines.by_ref().any(|line| {
        let trimmed = line.trim();
        trimmed.to_lowercase().contains(&target)
            && (is_heading(trimmed) || trimmed.trim_end_matches('*').ends_with(':'))
    });

    if !opened {
        debug!("Section '{}' not found", section_name);
        return String::new();
    }

    lines
        .take_while(|line| {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                return true;
            }
            let lower = trimmed.to_lowercase();
            !(is_heading(trimmed) || others.iter().any(|o| lower.contains(o.as_str())))
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Every section of `K`, empty strings included
pub fn extract_sections<K: SectionKey>(text: &str) -> BTreeMap<K, String> {
    K::ALL
        .iter()
        .map(|&key| (key, extract_section(text, key.title(), K::BOUNDARIES)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ANALYSIS: &str = "\
# Comprehensive Analysis

## Executive Summary
Apple remains a dominant franchise.
Margins are expanding.

## Company Overview
Designs consumer hardware and services.

## Risk Assessment
Regulatory pressure in the EU.

## Conclusion
A high quality compounder.";

    #[test]
    fn test_extract_heading_section() {
        let summary = extract_section(
            ANALYSIS,
            "Executive Summary",
            SynthesisSection::BOUNDARIES,
        );
        assert_eq!(
            summary,
            "Apple remains a dominant franchise.\nMargins are expanding."
        );
    }

    #[test]
    fn test_last_section_runs_to_end() {
        let conclusion = extract_section(ANALYSIS, "Conclusion", SynthesisSection::BOUNDARIES);
        assert_eq!(conclusion, "A high quality compounder.");
    }

    #[test]
    fn test_missing_section_is_empty() {
        let thesis = extract_section(ANALYSIS, "Investment Thesis", SynthesisSection::BOUNDARIES);
        assert_eq!(thesis, "");
        assert_eq!(extract_section("", "Conclusion", SynthesisSection::BOUNDARIES), "");
    }

    #[test]
    fn test_colon_and_bold_headings() {
        let text = "\
RECOMMENDATION: BUY
Reasoning:
Strong cash generation and buybacks.
**Risk Assessment**
Valuation is stretched.
Investment Strategy:
Accumulate on dips.";

        let sections = extract_sections::<RecommendationSection>(text);
        assert_eq!(
            sections[&RecommendationSection::Reasoning],
            "Strong cash generation and buybacks."
        );
        assert_eq!(
            sections[&RecommendationSection::RiskAssessment],
            "Valuation is stretched."
        );
        assert_eq!(
            sections[&RecommendationSection::InvestmentStrategy],
            "Accumulate on dips."
        );
        assert_eq!(sections[&RecommendationSection::MonitoringPoints], "");
        assert_eq!(sections.len(), 5);
    }

    #[test]
    fn test_section_ends_at_mention_of_other_section() {
        let text = "Executive Summary:\nSolid quarter.\nSee the financial analysis below.\nMore text.";
        assert_eq!(
            extract_section(text, "Executive Summary", SynthesisSection::BOUNDARIES),
            "Solid quarter."
        );
    }

    #[test]
    fn test_mention_without_heading_does_not_open() {
        let text = "The executive summary is below\nnothing else";
        assert_eq!(
            extract_section(text, "Executive Summary", SynthesisSection::BOUNDARIES),
            ""
        );
    }

    #[test]
    fn test_news_sentiment_title_matches_boundary() {
        let text = "### News and Market Sentiment\nHeadlines skew positive.\n### Risk Assessment\nLow.";
        let sections = extract_sections::<SynthesisSection>(text);
        assert_eq!(
            sections[&SynthesisSection::NewsSentiment],
            "Headlines skew positive."
        );
        assert_eq!(sections[&SynthesisSection::RiskAssessment], "Low.");
    }
}
