//! Target price and time horizon

use super::contains_any_word;
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

/// Sentinel for a target price or horizon that the prose never states
pub const NOT_SPECIFIED: &str = "Not specified";

/// `$150`, `$1,250.50`, `$150-$180`, `$150 to $180`, `$150–$180`
static PRICE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    const AMOUNT: &str = r"\$\s?(?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d+)?";
    Regex::new(&format!(r"{AMOUNT}(?:\s*(?:-|–|—|to)\s*{AMOUNT})?")).ok()
});

const SHORT_TERM: &[&str] = &[
    "short term",
    "short-term",
    "near term",
    "near-term",
    "3-6 months",
    "6 months",
];
const MEDIUM_TERM: &[&str] = &[
    "medium term",
    "medium-term",
    "6-12 months",
    "12 months",
    "1 year",
];
const LONG_TERM: &[&str] = &[
    "long term",
    "long-term",
    "1+ years",
    "2+ years",
    "next year",
    "multi-year",
    "several years",
];

/// Price or price range, preferring a line that talks about a target price
pub fn extract_target_price(text: &str) -> String {
    let Some(pattern) = PRICE.as_ref() else {
        debug!("Price pattern unavailable");
        return NOT_SPECIFIED.to_string();
    };

    let on_target_line = text
        .lines()
        .filter(|line| {
            let lower = line.to_lowercase();
            lower.contains("target") && lower.contains("price")
        })
        .find_map(|line| pattern.find(line));

    match on_target_line.or_else(|| pattern.find(text)) {
        Some(m) => m.as_str().trim().to_string(),
        None => {
            debug!("No target price found");
            NOT_SPECIFIED.to_string()
        }
    }
}

/// Horizon bucket by keyword, checked short then medium then long
pub fn extract_time_horizon(text: &str) -> String {
    let buckets: [(&[&str], &str); 3] = [
        (SHORT_TERM, "Short-term (3-6 months)"),
        (MEDIUM_TERM, "Medium-term (6-12 months)"),
        (LONG_TERM, "Long-term (1+ years)"),
    ];

    buckets
        .iter()
        .find(|(keywords, _)| contains_any_word(text, keywords))
        .map_or_else(
            || {
                debug!("No time horizon found");
                NOT_SPECIFIED.to_string()
            },
            |(_, bucket)| (*bucket).to_string(),
        )
}
