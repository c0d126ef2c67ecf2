//! Heuristic extraction of structured fields from generated prose
//!
//! Every function here is total: it never returns an error and never panics on
//! odd input. When nothing usable is found it falls back to a documented default
//! and logs the fallback at `debug`.

mod labels;
mod lists;
mod price;
mod sections;

pub use labels::{ClassLabel, Confidence, Recommendation, extract_classification_label, extract_confidence};
pub use lists::{
    INSIGHT_KEYWORDS, INSIGHT_PLACEHOLDER, extract_bulleted_list, extract_highlights,
    extract_key_factors,
};
pub use price::{NOT_SPECIFIED, extract_target_price, extract_time_horizon};
pub use sections::{
    RecommendationSection, SectionKey, SynthesisSection, extract_section, extract_sections,
};

/// True when `phrase` occurs in `haystack` on word boundaries, ignoring case
pub(crate) fn contains_word(haystack: &str, phrase: &str) -> bool {
    let haystack = haystack.to_lowercase();
    let phrase = phrase.to_lowercase();
    if phrase.is_empty() {
        return false;
    }

    haystack.match_indices(&phrase).any(|(start, matched)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + matched.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

/// True when any of `phrases` occurs in `haystack` on word boundaries
pub(crate) fn contains_any_word(haystack: &str, phrases: &[&str]) -> bool {
    phrases.iter().any(|p| contains_word(haystack, p))
}

/// Drop markdown emphasis so `**BUY**` reads as `BUY`
pub(crate) fn strip_emphasis(line: &str) -> String {
    line.chars().filter(|c| !matches!(c, '*' | '_' | '`')).collect()
}
