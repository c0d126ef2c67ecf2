//! Ordered lists of highlighted statements

use tracing::debug;

/// Placeholder returned when no insight could be recovered
pub const INSIGHT_PLACEHOLDER: &str = "Key insights analysis completed";

/// Words that mark a sentence as an insight
pub const INSIGHT_KEYWORDS: &[&str] = &["Key", "Important", "Critical", "Notable"];

/// Words that mark a sentence as a decision factor
const FACTOR_KEYWORDS: &[&str] = &["Key", "Primary", "Main", "Factor"];

const BULLET_GLYPHS: &[char] = &['-', '•', '*', '→', '▶', '►', '➤', '‣'];

/// Fragments of the recommendation template that are never factors
const SCAFFOLDING: &[&str] = &[
    "buy/hold/sell",
    "recommendation:",
    "target price range:",
    "investment time horizon:",
    "reasoning",
    "risk assessment",
    "investment strategy",
    "monitoring points",
    "alternative scenarios",
];

const MIN_BULLET_LEN: usize = 10;
const MIN_KEYWORD_LEAD_LEN: usize = 20;
const MIN_SENTENCE_LEN: usize = 30;
const MIN_HIGHLIGHT_LEN: usize = 20;

/// Accept `trimmed` as a list item under one of the three rules
fn accept_item(trimmed: &str, keywords: &[&str]) -> Option<String> {
    let len = trimmed.chars().count();

    // `**` opens bold text, not a bullet
    if trimmed.starts_with(BULLET_GLYPHS) && !trimmed.starts_with("**") {
        if len <= MIN_BULLET_LEN {
            return None;
        }
        let cleaned = trimmed
            .trim_start_matches(|c: char| BULLET_GLYPHS.contains(&c) || c.is_whitespace())
            .trim_end_matches('*')
            .trim();
        return (!cleaned.is_empty()).then(|| cleaned.to_string());
    }

    if len > MIN_KEYWORD_LEAD_LEN && keywords.iter().any(|k| trimmed.starts_with(k)) {
        return Some(trimmed.to_string());
    }

    let lower = trimmed.to_lowercase();
    if len > MIN_SENTENCE_LEN
        && trimmed.ends_with('.')
        && keywords.iter().any(|k| lower.contains(&k.to_lowercase()))
    {
        return Some(trimmed.to_string());
    }

    None
}

/// Up to `max_items` emphasised statements
///
/// A line qualifies when it is a bullet, when it opens with an emphasis keyword,
/// or when it is a full sentence mentioning one. Without any match the result is
/// the single [`INSIGHT_PLACEHOLDER`]. A zero `max_items` yields an empty list.
pub fn extract_bulleted_list(text: &str, max_items: usize) -> Vec<String> {
    if max_items == 0 {
        return Vec::new();
    }

    let items: Vec<String> = text
        .lines()
        .filter_map(|line| accept_item(line.trim(), INSIGHT_KEYWORDS))
        .take(max_items)
        .collect();

    if items.is_empty() {
        debug!("No bulleted insights found, using placeholder");
        return vec![INSIGHT_PLACEHOLDER.to_string()];
    }
    items
}

fn is_scaffolding(trimmed: &str) -> bool {
    let lower = trimmed.to_lowercase();
    SCAFFOLDING.iter().any(|s| lower.contains(s))
        || trimmed.ends_with("**")
        || (trimmed.starts_with("**") && trimmed.contains(':'))
}

/// Up to five decision factors; empty when none qualify
///
/// Same acceptance rules as [`extract_bulleted_list`], with template headings
/// and the label enumeration filtered out first.
pub fn extract_key_factors(text: &str) -> Vec<String> {
    let factors: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|line| !is_scaffolding(line))
        .filter_map(|line| accept_item(line, FACTOR_KEYWORDS))
        .take(5)
        .collect();

    if factors.is_empty() {
        debug!("No key factors found");
    }
    factors
}

/// Bullet or numbered-list prefix, if any
fn list_prefix_len(trimmed: &str) -> Option<usize> {
    if trimmed.starts_with(['-', '•', '*']) {
        return Some(0);
    }

    let digits = trimmed.chars().take_while(char::is_ascii_digit).count();
    let rest = &trimmed[digits..];
    (digits > 0 && (rest.starts_with('.') || rest.starts_with(')'))).then_some(digits + 1)
}

/// Up to `max_items` notable lines; may be empty
///
/// List items keep their text without the bullet or number. Any other line
/// longer than twenty characters that is not a heading also counts.
pub fn extract_highlights(text: &str, max_items: usize) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| match list_prefix_len(line) {
            Some(skip) => {
                let item = line[skip..]
                    .trim_start_matches(['-', '•', '*', ' '])
                    .trim_end_matches('*')
                    .trim();
                (!item.is_empty()).then(|| item.to_string())
            }
            None if line.chars().count() > MIN_HIGHLIGHT_LEN && !line.starts_with('#') => {
                Some(line.to_string())
            }
            None => None,
        })
        .take(max_items)
        .collect()
}
