//! User message templates
//!
//! Each prompt is built only from structured fields already in the pipeline
//! state, never from raw collaborator payloads.

use super::render;
use crate::api::{CompanyOverview, CompanyProfile, NewsArticle, fmt_amount, fmt_large};
use crate::error::Result;
use crate::extract::SynthesisSection;
use crate::pipeline::{FinancialAnalysis, NewsAnalysis, SynthesisAnalysis};
use minijinja::context;

const NEWS_ANALYSIS: &str = "Analyze the following information about {{ company }} ({{ symbol }}):

Company Overview:
{{ overview }}

Recent News:
{% for article in articles %}- {{ article.title }}: {{ article.snippet }}
{% else %}No recent news found.
{% endfor %}
Please provide:
1. Key news highlights and their potential impact
2. Company overview summary
3. Market sentiment indicators
4. Important developments to watch

Format your response as a structured analysis.";

const FINANCIAL_ANALYSIS: &str = "Analyze the financial data for {{ company }} ({{ symbol }}):

Company Information:
- Name: {{ name }}
- Sector: {{ sector }}
- Industry: {{ industry }}

Current Market Data:
{{ market_data }}

Financial Summary:
{{ financial_summary }}

Please provide:
1. Key financial metrics and their interpretation
2. Financial health assessment
3. Growth trends and patterns
4. Risk factors and concerns
5. Strengths and opportunities

Format your response as a structured financial analysis.";

const SYNTHESIS: &str = "Create a comprehensive investment analysis for {{ symbol }} based on the following information:

NEWS AND MARKET CONTEXT:
- Market Sentiment: {{ sentiment }}
- Key Developments: {{ developments | join(\", \") if developments else \"None\" }}
{% if highlights %}- News Highlights: {{ highlights | join(\", \") }}
{% endif %}
FINANCIAL CONTEXT:
- Financial Health: {{ health }}
- Growth Trends: {{ growth }}
{% if metrics %}- Key Metrics: {{ metrics | join(\", \") }}
{% endif %}
COMPANY INFORMATION:
- Company: {{ company }}
- Sector: {{ sector }}
- Industry: {{ industry }}

Please provide a structured analysis covering:

1. **Executive Summary**
   - Key highlights and overall assessment

2. **Company Overview**
   - Business model and market position
   - Sector and industry context

3. **Financial Analysis**
   - Key financial metrics and trends
   - Financial health assessment
   - Growth prospects and challenges

4. **News and Market Sentiment**
   - Recent developments and their impact
   - Market sentiment analysis
   - Key catalysts to watch

5. **Risk Assessment**
   - Primary risk factors
   - Market and company-specific risks
   - Risk mitigation factors

6. **Investment Thesis**
   - Bull case arguments
   - Bear case arguments
   - Neutral considerations

7. **Conclusion**
   - Overall investment outlook
   - Key factors driving the recommendation

Format your response as a professional investment analysis report.";

const RECOMMENDATION: &str = "Based on the comprehensive analysis of {{ symbol }}, provide a final investment recommendation.

COMPANY: {{ company }} ({{ symbol }})
SECTOR: {{ sector }}
INDUSTRY: {{ industry }}
{% if price %}CURRENT PRICE: ${{ price }}
{% endif %}{% if market_cap %}MARKET CAP: {{ market_cap }}
{% endif %}NEWS SENTIMENT: {{ sentiment }}
{% if developments %}KEY DEVELOPMENTS: {{ developments | join(\", \") }}
{% endif %}FINANCIAL HEALTH: {{ health }}
GROWTH TRENDS: {{ growth }}
{% if summary %}EXECUTIVE SUMMARY: {{ summary }}...
{% endif %}{% if insights %}KEY INSIGHTS: {{ insights | join(\", \") }}
{% endif %}
Please provide a structured investment recommendation covering:

1. **RECOMMENDATION: BUY/HOLD/SELL**
   - Clear recommendation with confidence level (High/Medium/Low)
   - Target price range (if applicable)
   - Investment time horizon

2. **Reasoning**
   - Key factors supporting the recommendation
   - Primary drivers of the decision
   - How news and financial data align

3. **Risk Assessment**
   - Primary risks to the recommendation
   - Risk mitigation strategies
   - What could change the recommendation

4. **Investment Strategy**
   - Suggested entry/exit points
   - Position sizing considerations
   - Portfolio fit and diversification

5. **Monitoring Points**
   - Key metrics to watch
   - Events that could impact the recommendation
   - Review timeline

6. **Alternative Scenarios**
   - Bull case outcome
   - Bear case outcome
   - Base case expectations

Format your response as a professional investment recommendation.";

/// Articles and overview for the news stage
pub fn news_analysis_prompt(
    company: &str,
    symbol: &str,
    overview: &CompanyOverview,
    articles: &[NewsArticle],
) -> Result<String> {
    let articles = &articles[..articles.len().min(3)];
    render(
        "news_analysis",
        NEWS_ANALYSIS,
        context! { company, symbol, overview => &overview.overview_text, articles },
    )
}

/// Profile, market data and statement summary for the financials stage
pub fn financial_analysis_prompt(
    company: &str,
    symbol: &str,
    profile: &CompanyProfile,
    market_data: &str,
    financial_summary: &str,
) -> Result<String> {
    render(
        "financial_analysis",
        FINANCIAL_ANALYSIS,
        context! {
            company,
            symbol,
            name => or_na(profile.name.as_deref()),
            sector => or_na(profile.sector.as_deref()),
            industry => or_na(profile.industry.as_deref()),
            market_data,
            financial_summary,
        },
    )
}

/// Combined news and financials context for the synthesis stage
pub fn synthesis_prompt(
    symbol: &str,
    company: &str,
    news: &NewsAnalysis,
    financials: &FinancialAnalysis,
) -> Result<String> {
    let profile = &financials.profile;
    render(
        "synthesis",
        SYNTHESIS,
        context! {
            symbol,
            company => profile.name.as_deref().unwrap_or(company),
            sector => or_na(profile.sector.as_deref()),
            industry => or_na(profile.industry.as_deref()),
            sentiment => news.sentiment.to_string(),
            developments => &news.developments,
            highlights => first(&news.highlights, 3),
            health => &financials.health,
            growth => &financials.growth_trend,
            metrics => first(&financials.metrics, 3),
        },
    )
}

/// Everything gathered so far, condensed for the recommendation stage
pub fn recommendation_prompt(
    symbol: &str,
    company: &str,
    news: &NewsAnalysis,
    financials: &FinancialAnalysis,
    synthesis: &SynthesisAnalysis,
) -> Result<String> {
    let profile = &financials.profile;
    let quote = &financials.quote;
    let summary: String = synthesis
        .section(SynthesisSection::ExecutiveSummary)
        .chars()
        .take(200)
        .collect();

    render(
        "recommendation",
        RECOMMENDATION,
        context! {
            symbol,
            company => profile.name.as_deref().unwrap_or(company),
            sector => or_na(profile.sector.as_deref()),
            industry => or_na(profile.industry.as_deref()),
            price => quote.price.map(|p| fmt_amount(Some(p))),
            market_cap => quote.market_cap.map(|c| fmt_large(Some(c))),
            sentiment => news.sentiment.to_string(),
            developments => first(&news.developments, 3),
            health => &financials.health,
            growth => &financials.growth_trend,
            summary,
            insights => first(&synthesis.key_insights, 3),
        },
    )
}

fn or_na(value: Option<&str>) -> &str {
    value.unwrap_or("N/A")
}

fn first(items: &[String], n: usize) -> &[String] {
    &items[..items.len().min(n)]
}
