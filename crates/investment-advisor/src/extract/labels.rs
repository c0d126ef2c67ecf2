//! Closed-set labels: recommendation and confidence

use super::{contains_word, strip_emphasis};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// A label drawn from a small closed set
pub trait ClassLabel: Copy + Eq + 'static {
    /// Every label, in the order they are usually enumerated
    const ALL: &'static [Self];

    /// Canonical spelling
    fn as_str(self) -> &'static str;
}

/// Investment recommendation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Recommendation {
    Buy,
    #[default]
    Hold,
    Sell,
}

impl ClassLabel for Recommendation {
    const ALL: &'static [Self] = &[Self::Buy, Self::Hold, Self::Sell];

    fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Hold => "HOLD",
            Self::Sell => "SELL",
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Confidence attached to a recommendation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Confidence {
    High,
    #[default]
    Medium,
    Low,
}

impl ClassLabel for Confidence {
    const ALL: &'static [Self] = &[Self::High, Self::Medium, Self::Low];

    fn as_str(self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }
}

impl Confidence {
    fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::High => &["high"],
            Self::Medium => &["medium", "moderate"],
            Self::Low => &["low"],
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// True for lines that spell out the whole label set, e.g. `BUY/HOLD/SELL`
fn is_enumeration<L: ClassLabel>(line: &str) -> bool {
    let enumeration = L::ALL
        .iter()
        .map(|l| l.as_str().to_lowercase())
        .collect::<Vec<_>>()
        .join("/");
    line.to_lowercase().replace(' ', "").contains(&enumeration)
}

/// The only label of `L` mentioned in `text`, if exactly one is
fn sole_label<L: ClassLabel>(text: &str) -> Option<L> {
    let mut found = L::ALL.iter().copied().filter(|l| contains_word(text, l.as_str()));
    match (found.next(), found.next()) {
        (Some(label), None) => Some(label),
        _ => None,
    }
}

fn phrase_pattern<L: ClassLabel>() -> Option<Regex> {
    let alternatives = L::ALL
        .iter()
        .map(|l| regex::escape(l.as_str()))
        .collect::<Vec<_>>()
        .join("|");

    Regex::new(&format!(
        r"(?i)\b(?:recommend(?:s|ed)?\s+an?\s+|recommendation\s*:\s*)({alternatives})\b"
    ))
    .ok()
}

fn phrase_label<L: ClassLabel>(pattern: &Regex, text: &str) -> Option<L> {
    let matched = pattern.captures(text)?.get(1)?.as_str();
    L::ALL
        .iter()
        .copied()
        .find(|l| l.as_str().eq_ignore_ascii_case(matched))
}

/// Recover a label from free-form prose
///
/// Tried in order, first hit wins:
/// 1. a line saying "recommend a X" or "recommendation: X"
/// 2. a bold line naming exactly one label
/// 3. the same phrase split across lines
/// 4. exactly one label mentioned anywhere
///
/// Lines that spell out the full label set are ignored throughout. Falls back
/// to `default`.
pub fn extract_classification_label<L: ClassLabel>(text: &str, default: L) -> L {
    let lines: Vec<&str> = text.lines().filter(|l| !is_enumeration::<L>(l)).collect();

    let pattern = phrase_pattern::<L>();
    if pattern.is_none() {
        debug!("Label phrase pattern failed to compile, skipping phrase passes");
    }

    if let Some(pattern) = &pattern {
        if let Some(label) = lines
            .iter()
            .find_map(|line| phrase_label(pattern, &strip_emphasis(line)))
        {
            return label;
        }
    }

    if let Some(label) = lines
        .iter()
        .filter(|line| line.contains("**"))
        .find_map(|line| sole_label(&strip_emphasis(line)))
    {
        return label;
    }

    let joined = strip_emphasis(&lines.join(" "));
    if let Some(label) = pattern.as_ref().and_then(|p| phrase_label(p, &joined)) {
        return label;
    }

    if let Some(label) = sole_label(&joined) {
        return label;
    }

    debug!("No label found, defaulting to {}", default.as_str());
    default
}

/// Confidence level stated in the prose, `Medium` when unclear
///
/// A line such as "Confidence Level: High" is taken first. After that the
/// usual phrasings ("high confidence", "strong conviction", "some confidence")
/// are checked from strongest to weakest.
pub fn extract_confidence(text: &str) -> Confidence {
    let labeled = text
        .lines()
        .map(strip_emphasis)
        .filter(|line| contains_word(line, "confidence") && !is_enumeration::<Confidence>(line))
        .find_map(|line| {
            let mut found = Confidence::ALL
                .iter()
                .copied()
                .filter(|c| c.aliases().iter().any(|a| contains_word(&line, a)));
            match (found.next(), found.next()) {
                (Some(level), None) => Some(level),
                _ => None,
            }
        });

    if let Some(level) = labeled {
        return level;
    }

    let lower = text.to_lowercase();
    let phrases: &[(&str, Confidence)] = &[
        ("high confidence", Confidence::High),
        ("medium confidence", Confidence::Medium),
        ("low confidence", Confidence::Low),
        ("very confident", Confidence::High),
        ("strong conviction", Confidence::High),
        ("moderate confidence", Confidence::Medium),
        ("some confidence", Confidence::Medium),
    ];

    phrases
        .iter()
        .find(|(phrase, _)| lower.contains(phrase))
        .map_or_else(
            || {
                debug!("No confidence level found, defaulting to Medium");
                Confidence::default()
            },
            |(_, level)| *level,
        )
}
