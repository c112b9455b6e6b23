//! Read-only view shapes derived from [`DashboardState`]. Nothing here
//! mutates the store; a renderer calls these once per pass.

use chrono::{DateTime, Utc};
use shared::{
    domain::{AnalysisId, RepositoryId},
    protocol::AnalysisResult,
};

use crate::{selection::ComparisonSelection, store::DashboardState};

pub const NO_RESULTS_MESSAGE: &str = "No analysis results available yet for this repository.";
pub const NO_REPOSITORIES_MESSAGE: &str = "No repositories analyzed yet.";
pub const LOADING_INDICATOR: &str = "Loading...";
pub const NOT_AVAILABLE: &str = "N/A";

pub const COMPARISON_ROWS: [&str; 4] = ["Summary", "Files", "Commits", "Languages"];

/// The collection is newest-first, so the latest analysis is its head.
pub fn latest_result(results: &[AnalysisResult]) -> Option<&AnalysisResult> {
    results.first()
}

/// One `"<language>: <count> files"` line per language.
///
/// The order is whatever the language map yields. Callers must not rely on
/// it.
pub fn language_breakdown(result: &AnalysisResult) -> Vec<String> {
    result
        .languages
        .iter()
        .map(|(language, count)| format!("{language}: {count} files"))
        .collect()
}

fn count_text(count: Option<u64>) -> String {
    count.map_or_else(|| NOT_AVAILABLE.to_string(), |n| n.to_string())
}

fn text_or_na(text: &Option<String>) -> String {
    match text.as_deref() {
        Some(text) if !text.trim().is_empty() => text.to_string(),
        _ => NOT_AVAILABLE.to_string(),
    }
}

fn analyzed_on(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatestResultCard {
    pub analysis_id: AnalysisId,
    pub summary: String,
    pub narrative: String,
    pub files: String,
    pub commits: String,
    pub open_issues: String,
    pub open_pull_requests: String,
    pub contributors: String,
    pub languages: Vec<String>,
    pub analyzed_on: String,
}

impl LatestResultCard {
    pub fn from_result(result: &AnalysisResult) -> Self {
        let contributors = if result.contributors.is_empty() {
            NOT_AVAILABLE.to_string()
        } else {
            result.contributors.join(", ")
        };
        Self {
            analysis_id: result.id,
            summary: text_or_na(&result.summary),
            narrative: text_or_na(&result.narrative),
            files: count_text(result.file_count),
            commits: count_text(result.commit_count),
            open_issues: count_text(result.open_issues_count),
            open_pull_requests: count_text(result.open_pull_requests_count),
            contributors,
            languages: language_breakdown(result),
            analyzed_on: analyzed_on(result.created_at),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonColumn {
    pub analysis_id: AnalysisId,
    /// Analysis date, `YYYY-MM-DD`.
    pub header: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonRow {
    pub label: &'static str,
    /// One cell per column; a cell may span several lines (languages).
    pub cells: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonTable {
    pub columns: Vec<ComparisonColumn>,
    pub rows: Vec<ComparisonRow>,
}

impl ComparisonTable {
    pub fn column_ids(&self) -> Vec<AnalysisId> {
        self.columns.iter().map(|column| column.analysis_id).collect()
    }
}

/// Side-by-side table of the selected analyses, or `None` while fewer than
/// two are selected.
///
/// Columns follow the order of `results`, not the order in which analyses
/// were selected.
pub fn comparison(
    results: &[AnalysisResult],
    selection: &ComparisonSelection,
) -> Option<ComparisonTable> {
    if !selection.is_comparable() {
        return None;
    }
    let selected: Vec<&AnalysisResult> = results
        .iter()
        .filter(|result| selection.contains(result.id))
        .collect();

    let columns = selected
        .iter()
        .map(|result| ComparisonColumn {
            analysis_id: result.id,
            header: result.created_at.format("%Y-%m-%d").to_string(),
        })
        .collect();

    let rows = COMPARISON_ROWS
        .iter()
        .map(|&label| ComparisonRow {
            label,
            cells: selected
                .iter()
                .map(|result| match label {
                    "Summary" => vec![text_or_na(&result.summary)],
                    "Files" => vec![count_text(result.file_count)],
                    "Commits" => vec![count_text(result.commit_count)],
                    _ => language_breakdown(result),
                })
                .collect(),
        })
        .collect();

    Some(ComparisonTable { columns, rows })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub analysis_id: AnalysisId,
    pub analyzed_on: String,
    pub checked: bool,
}

/// The pick list for comparison. Hidden (`None`) with one analysis or
/// fewer, since there is nothing to compare.
pub fn history(state: &DashboardState) -> Option<Vec<HistoryEntry>> {
    if state.analysis_results.len() <= 1 {
        return None;
    }
    Some(
        state
            .analysis_results
            .iter()
            .map(|result| HistoryEntry {
                analysis_id: result.id,
                analyzed_on: analyzed_on(result.created_at),
                checked: state.comparison.contains(result.id),
            })
            .collect(),
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryRow {
    pub id: RepositoryId,
    pub name: String,
    pub url: String,
    pub status: String,
    pub selected: bool,
}

pub fn repository_rows(state: &DashboardState) -> Vec<RepositoryRow> {
    let active = state.active_repository_id();
    state
        .repositories
        .iter()
        .map(|repo| RepositoryRow {
            id: repo.id,
            name: repo.name.clone(),
            url: repo.url.clone(),
            status: repo.status.to_string(),
            selected: active == Some(repo.id),
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Banner {
    pub message: Option<String>,
    pub error: Option<String>,
    pub loading: bool,
}

pub fn banner(state: &DashboardState) -> Banner {
    let non_empty = |text: &str| (!text.is_empty()).then(|| text.to_string());
    Banner {
        message: non_empty(&state.message),
        error: non_empty(&state.error),
        loading: state.is_loading,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisPanel {
    /// No repository is active.
    Hidden,
    Empty {
        repository_name: String,
    },
    Results {
        repository_name: String,
        latest: LatestResultCard,
        history: Option<Vec<HistoryEntry>>,
        comparison: Option<ComparisonTable>,
    },
}

pub fn analysis_panel(state: &DashboardState) -> AnalysisPanel {
    let Some(repository) = state.selected_repository.as_ref() else {
        return AnalysisPanel::Hidden;
    };
    let repository_name = repository.name.clone();
    match latest_result(&state.analysis_results) {
        None => AnalysisPanel::Empty { repository_name },
        Some(latest) => AnalysisPanel::Results {
            repository_name,
            latest: LatestResultCard::from_result(latest),
            history: history(state),
            comparison: comparison(&state.analysis_results, &state.comparison),
        },
    }
}

#[cfg(test)]
#[path = "tests/projection_tests.rs"]
mod tests;
