use std::fmt::Write as _;

use client_core::{
    projection::{
        analysis_panel, banner, repository_rows, AnalysisPanel, ComparisonTable,
        HistoryEntry, LatestResultCard, LOADING_INDICATOR, NO_REPOSITORIES_MESSAGE,
        NO_RESULTS_MESSAGE,
    },
    DashboardState,
};

pub fn render(state: &DashboardState) -> String {
    let mut out = String::new();
    let _ = write_view(&mut out, state);
    out
}

fn write_view(out: &mut String, state: &DashboardState) -> std::fmt::Result {
    writeln!(out, "==== Repository Analysis Dashboard ====")?;

    let banner = banner(state);
    if let Some(message) = banner.message {
        writeln!(out, "[ok] {message}")?;
    }
    if let Some(error) = banner.error {
        writeln!(out, "[error] {error}")?;
    }
    if banner.loading {
        writeln!(out, "{LOADING_INDICATOR}")?;
    }

    writeln!(out, "\nAnalyzed Repositories")?;
    let rows = repository_rows(state);
    if rows.is_empty() {
        writeln!(out, "  {NO_REPOSITORIES_MESSAGE}")?;
    }
    for row in rows {
        let marker = if row.selected { '>' } else { ' ' };
        writeln!(
            out,
            "{marker} #{} {} ({}) - Status: {}",
            row.id, row.name, row.url, row.status
        )?;
    }

    match analysis_panel(state) {
        AnalysisPanel::Hidden => {}
        AnalysisPanel::Empty { repository_name } => {
            writeln!(out, "\nAnalysis Results for {repository_name}")?;
            writeln!(out, "  {NO_RESULTS_MESSAGE}")?;
        }
        AnalysisPanel::Results {
            repository_name,
            latest,
            history,
            comparison,
        } => {
            writeln!(out, "\nAnalysis Results for {repository_name}")?;
            write_latest(out, &latest)?;
            if let Some(entries) = history {
                write_history(out, &entries)?;
            }
            if let Some(table) = comparison {
                write_comparison(out, &table)?;
            }
        }
    }
    Ok(())
}

fn write_latest(out: &mut String, card: &LatestResultCard) -> std::fmt::Result {
    writeln!(out, "  Summary (Latest): {}", card.summary)?;
    writeln!(out, "  Narrative (Latest): {}", card.narrative)?;
    writeln!(out, "  Files: {}", card.files)?;
    writeln!(out, "  Commits: {}", card.commits)?;
    writeln!(out, "  Open Issues: {}", card.open_issues)?;
    writeln!(out, "  Open Pull Requests: {}", card.open_pull_requests)?;
    writeln!(out, "  Contributors: {}", card.contributors)?;
    writeln!(out, "  Languages:")?;
    for line in &card.languages {
        writeln!(out, "    - {line}")?;
    }
    writeln!(out, "  Analyzed on: {}", card.analyzed_on)
}

fn write_history(out: &mut String, entries: &[HistoryEntry]) -> std::fmt::Result {
    writeln!(out, "\n  Analysis History (select up to 2 to compare)")?;
    for entry in entries {
        let check = if entry.checked { 'x' } else { ' ' };
        writeln!(
            out,
            "  [{check}] #{} Analyzed on: {}",
            entry.analysis_id, entry.analyzed_on
        )?;
    }
    Ok(())
}

fn write_comparison(out: &mut String, table: &ComparisonTable) -> std::fmt::Result {
    writeln!(out, "\n  Comparison")?;
    let headers: Vec<&str> = table.columns.iter().map(|c| c.header.as_str()).collect();
    writeln!(out, "  {:<10} | {}", "Metric", headers.join(" | "))?;
    for row in &table.rows {
        let cells: Vec<String> = row.cells.iter().map(|lines| lines.join(", ")).collect();
        writeln!(out, "  {:<10} | {}", row.label, cells.join(" | "))?;
    }
    Ok(())
}
