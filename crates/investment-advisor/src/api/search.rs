//! DuckDuckGo web search

use super::{CompanyOverview, NewsArticle, NewsSearch};
use crate::config::AdvisorConfig;
use crate::error::{AdvisorError, Result};
use crate::retry::RetryPolicy;
use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use regex::Regex;
use reqwest::Client;
use std::num::NonZeroU32;
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

const SEARCH_URL: &str = "https://html.duckduckgo.com/html/";
const OVERVIEW_SOURCE: &str = "DuckDuckGo Search";
const OVERVIEW_MAX_CHARS: usize = 500;
const USER_AGENT: &str = "Mozilla/5.0 (compatible; investment-advisor/0.1)";

static RESULT_TITLE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r#"(?s)<a[^>]*class="result__a"[^>]*href="([^"]*)"[^>]*>(.*?)</a>"#).ok()
});
static RESULT_SNIPPET: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"(?s)class="result__snippet"[^>]*>(.*?)</a>"#).ok());
static TAG: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"<[^>]+>").ok());

/// One organic result from the HTML endpoint
#[derive(Debug, Clone, PartialEq)]
struct SearchHit {
    title: String,
    link: String,
    snippet: String,
}

/// [`NewsSearch`] over the DuckDuckGo HTML endpoint
pub struct DuckDuckGoClient {
    client: Client,
    rate_limiter: SharedRateLimiter,
    retry: RetryPolicy,
    news_max_results: usize,
    overview_max_results: usize,
}

impl DuckDuckGoClient {
    /// Create a client allowing `rate_limit` searches per minute
    pub fn new(rate_limit: u32, timeout: Duration) -> Result<Self> {
        let quota = Quota::per_minute(NonZeroU32::new(rate_limit).unwrap_or(NonZeroU32::MIN));
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
            retry: RetryPolicy::default(),
            news_max_results: 5,
            overview_max_results: 3,
        })
    }

    pub fn from_config(config: &AdvisorConfig) -> Result<Self> {
        let mut client = Self::new(config.search_rate_limit, config.request_timeout)?;
        client.retry = config.retry_policy();
        client.news_max_results = config.news_max_results;
        client.overview_max_results = config.overview_max_results;
        Ok(client)
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
        self.retry
            .execute("duckduckgo_search", || self.search_once(query, max_results))
            .await
    }

    async fn search_once(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
        self.rate_limiter.until_ready().await;
        debug!("DuckDuckGo query: {}", query);

        let response = self
            .client
            .post(SEARCH_URL)
            .form(&[("q", query)])
            .send()
            .await
            .map_err(|e| AdvisorError::Search(format!("DuckDuckGo request failed: {e}")))?;

        let status = response.status();
        if status.as_u16() == 429 || status.as_u16() == 202 {
            return Err(AdvisorError::RateLimitExceeded {
                provider: "duckduckgo".to_string(),
            });
        }
        if !status.is_success() {
            return Err(AdvisorError::Search(format!("DuckDuckGo returned {status}")));
        }

        let html = response.text().await?;
        let mut hits = parse_results(&html);
        hits.truncate(max_results);
        Ok(hits)
    }
}

#[async_trait]
impl NewsSearch for DuckDuckGoClient {
    async fn search_news(&self, company_name: &str, symbol: &str) -> Result<Vec<NewsArticle>> {
        let query = format!("{company_name} {symbol} stock news latest");
        let hits = self.search(&query, self.news_max_results).await?;

        Ok(hits
            .into_iter()
            .map(|hit| NewsArticle::new(hit.title, hit.link, hit.snippet))
            .collect())
    }

    async fn search_overview(&self, company_name: &str) -> Result<CompanyOverview> {
        let query = format!("{company_name} company overview business description");

        let overview_text = match self.search(&query, self.overview_max_results).await {
            Ok(hits) => combine_snippets(&hits),
            // The overview only enriches the news prompt
            Err(e) => {
                warn!("Company overview search failed for {}: {}", company_name, e);
                "Error retrieving company information.".to_string()
            }
        };

        Ok(CompanyOverview {
            overview_text,
            source: OVERVIEW_SOURCE.to_string(),
        })
    }
}

fn combine_snippets(hits: &[SearchHit]) -> String {
    let combined = hits
        .iter()
        .map(|h| h.snippet.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    let combined = combined.trim();

    if combined.is_empty() {
        return "No company information found.".to_string();
    }
    if combined.chars().count() > OVERVIEW_MAX_CHARS {
        let truncated: String = combined.chars().take(OVERVIEW_MAX_CHARS).collect();
        return format!("{truncated}...");
    }
    combined.to_string()
}

/// Titles, target links and snippets from a result page
fn parse_results(html: &str) -> Vec<SearchHit> {
    let (Some(title_re), Some(snippet_re)) = (RESULT_TITLE.as_ref(), RESULT_SNIPPET.as_ref())
    else {
        return Vec::new();
    };

    let titles: Vec<_> = title_re.captures_iter(html).collect();
    titles
        .iter()
        .enumerate()
        .filter_map(|(i, caps)| {
            let whole = caps.get(0)?;
            let end = titles
                .get(i + 1)
                .and_then(|next| next.get(0))
                .map_or(html.len(), |m| m.start());
            let snippet = snippet_re
                .captures(&html[whole.end()..end])
                .and_then(|c| c.get(1))
                .map_or_else(String::new, |m| clean_text(m.as_str()));

            let title = clean_text(caps.get(2)?.as_str());
            if title.is_empty() {
                return None;
            }
            Some(SearchHit {
                title,
                link: resolve_link(&decode_entities(caps.get(1)?.as_str())),
                snippet,
            })
        })
        .collect()
}

/// Follow DuckDuckGo's `/l/?uddg=` redirect wrapper to the real URL
fn resolve_link(href: &str) -> String {
    let absolute = if href.starts_with("//") {
        format!("https:{href}")
    } else {
        href.to_string()
    };

    Url::parse(&absolute)
        .ok()
        .and_then(|url| {
            url.query_pairs()
                .find(|(key, _)| key == "uddg")
                .map(|(_, target)| target.into_owned())
        })
        .unwrap_or(absolute)
}

fn clean_text(fragment: &str) -> String {
    let stripped = TAG
        .as_ref()
        .map_or_else(|| fragment.to_string(), |re| re.replace_all(fragment, "").into_owned());
    decode_entities(&stripped)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn decode_entities(text: &str) -> String {
    text.replace("&quot;", "\"")
        .replace("&#x27;", "'")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}
