//! Human-readable reports built from a finished run

mod markdown;

pub use markdown::{MarkdownReportAssembler, render_analysis, render_recommendation};

use crate::config::AdvisorConfig;
use crate::error::Result;
use crate::pipeline::PipelineRun;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Turns the final state of a run into reports
pub trait ReportAssembler: Send + Sync {
    fn assemble(&self, run: &PipelineRun) -> Result<GeneratedReports>;
}

/// Files written for one run; both empty for a failed run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GeneratedReports {
    pub analysis: Option<PathBuf>,
    pub recommendation: Option<PathBuf>,
}

impl GeneratedReports {
    pub fn is_empty(&self) -> bool {
        self.analysis.is_none() && self.recommendation.is_none()
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.analysis
            .iter()
            .chain(self.recommendation.iter())
            .map(PathBuf::as_path)
    }
}

/// Reports already on disk for one symbol, newest first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReportListing {
    pub analysis: Vec<PathBuf>,
    pub recommendation: Vec<PathBuf>,
}

impl ReportListing {
    pub fn is_empty(&self) -> bool {
        self.analysis.is_empty() && self.recommendation.is_empty()
    }
}

pub(crate) fn analysis_file_name(symbol: &str, timestamp: &str) -> String {
    format!("{symbol}_Analysis_{timestamp}.md")
}

pub(crate) fn recommendation_file_name(symbol: &str, timestamp: &str) -> String {
    format!("{symbol}_Recommendation_{timestamp}.md")
}

/// Existing analysis and recommendation reports for `symbol`
///
/// Missing directories count as no reports.
pub fn find_reports(config: &AdvisorConfig, symbol: &str) -> Result<ReportListing> {
    let symbol = symbol.trim().to_uppercase();
    Ok(ReportListing {
        analysis: list_matching(&config.analysis_dir(), &format!("{symbol}_Analysis_"))?,
        recommendation: list_matching(
            &config.recommendation_dir(),
            &format!("{symbol}_Recommendation_"),
        )?,
    })
}

fn list_matching(dir: &Path, prefix: &str) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut found = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let matches = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(prefix) && n.ends_with(".md"));
        if matches {
            found.push(path);
        }
    }

    // Timestamps in the names sort chronologically
    found.sort_unstable_by(|a, b| b.cmp(a));
    Ok(found)
}
