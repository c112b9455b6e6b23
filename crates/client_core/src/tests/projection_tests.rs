use super::*;
use std::collections::HashMap;

use chrono::TimeZone;
use shared::{domain::RepositoryStatus, protocol::Repository};

fn analysis(id: i64, day: u32) -> AnalysisResult {
    AnalysisResult {
        id: AnalysisId(id),
        repository_id: Some(RepositoryId(1)),
        summary: Some(format!("summary {id}")),
        narrative: Some(format!("narrative {id}")),
        file_count: Some(id as u64 * 10),
        commit_count: Some(id as u64),
        open_issues_count: Some(2),
        open_pull_requests_count: None,
        contributors: vec!["alice".to_string(), "bob".to_string()],
        languages: HashMap::from([("Rust".to_string(), 7), ("TOML".to_string(), 2)]),
        tech_stack: Vec::new(),
        total_lines: None,
        report_url: None,
        status: None,
        created_at: Utc
            .with_ymd_and_hms(2024, 3, day, 12, 30, 0)
            .single()
            .expect("timestamp"),
    }
}

fn repository(id: i64) -> Repository {
    Repository {
        id: RepositoryId(id),
        name: format!("repo-{id}"),
        url: format!("https://github.com/mock/repo-{id}"),
        status: RepositoryStatus::Processing,
        created_at: None,
        updated_at: None,
    }
}

fn selection(ids: &[i64]) -> ComparisonSelection {
    let mut selection = ComparisonSelection::default();
    for id in ids {
        selection.toggle(AnalysisId(*id));
    }
    selection
}

#[test]
fn latest_is_first_element() {
    let results = vec![analysis(6, 2), analysis(5, 1)];
    assert_eq!(latest_result(&results).map(|r| r.id), Some(AnalysisId(6)));
    assert!(latest_result(&[]).is_none());
}

#[test]
fn comparison_needs_two_selected() {
    let results = vec![analysis(5, 1), analysis(6, 2)];
    assert!(comparison(&results, &selection(&[])).is_none());
    assert!(comparison(&results, &selection(&[5])).is_none());
}

#[test]
fn comparison_columns_follow_collection_order() {
    let results = vec![analysis(5, 1), analysis(6, 2)];

    let table = comparison(&results, &selection(&[6, 5])).expect("comparable");

    assert_eq!(table.column_ids(), vec![AnalysisId(5), AnalysisId(6)]);
    assert_eq!(table.columns[0].header, "2024-03-01");
    assert_eq!(table.columns[1].header, "2024-03-02");
}

#[test]
fn comparison_rows_carry_metrics_per_column() {
    let results = vec![analysis(5, 1), analysis(6, 2)];

    let table = comparison(&results, &selection(&[5, 6])).expect("comparable");

    let labels: Vec<&str> = table.rows.iter().map(|row| row.label).collect();
    assert_eq!(labels, COMPARISON_ROWS.to_vec());
    assert_eq!(
        table.rows[0].cells,
        vec![vec!["summary 5".to_string()], vec!["summary 6".to_string()]]
    );
    assert_eq!(
        table.rows[1].cells,
        vec![vec!["50".to_string()], vec!["60".to_string()]]
    );
    assert_eq!(
        table.rows[2].cells,
        vec![vec!["5".to_string()], vec!["6".to_string()]]
    );

    // Language order is unspecified, compare as sets.
    for cell in &table.rows[3].cells {
        let mut lines = cell.clone();
        lines.sort();
        assert_eq!(lines, vec!["Rust: 7 files", "TOML: 2 files"]);
    }
}

#[test]
fn language_breakdown_is_unordered_lines() {
    let mut lines = language_breakdown(&analysis(1, 1));
    lines.sort();
    assert_eq!(lines, vec!["Rust: 7 files", "TOML: 2 files"]);

    let mut bare = analysis(2, 1);
    bare.languages.clear();
    assert!(language_breakdown(&bare).is_empty());
}

#[test]
fn latest_card_fills_missing_fields_with_placeholder() {
    let mut result = analysis(5, 1);
    result.narrative = None;
    result.contributors.clear();

    let card = LatestResultCard::from_result(&result);

    assert_eq!(card.summary, "summary 5");
    assert_eq!(card.narrative, NOT_AVAILABLE);
    assert_eq!(card.files, "50");
    assert_eq!(card.open_issues, "2");
    assert_eq!(card.open_pull_requests, NOT_AVAILABLE);
    assert_eq!(card.contributors, NOT_AVAILABLE);
    assert_eq!(card.analyzed_on, "2024-03-01 12:30:00 UTC");

    let card = LatestResultCard::from_result(&analysis(6, 2));
    assert_eq!(card.contributors, "alice, bob");
}

#[test]
fn history_hidden_until_there_is_something_to_compare() {
    let mut state = DashboardState {
        analysis_results: vec![analysis(5, 1)],
        ..DashboardState::default()
    };
    assert!(history(&state).is_none());

    state.analysis_results.push(analysis(4, 1));
    state.comparison.toggle(AnalysisId(4));
    let entries = history(&state).expect("history shown");

    assert_eq!(entries.len(), 2);
    assert!(!entries[0].checked);
    assert!(entries[1].checked);
}

#[test]
fn repository_rows_mark_active_repository() {
    let state = DashboardState {
        repositories: vec![repository(1), repository(2)],
        selected_repository: Some(repository(2)),
        ..DashboardState::default()
    };

    let rows = repository_rows(&state);

    assert_eq!(rows.len(), 2);
    assert!(!rows[0].selected);
    assert!(rows[1].selected);
    assert_eq!(rows[1].status, "processing");
    assert!(repository_rows(&DashboardState::default()).is_empty());
}

#[test]
fn banner_shows_only_present_messages() {
    let state = DashboardState {
        error: "Error: Invalid GitHub URL".to_string(),
        is_loading: true,
        ..DashboardState::default()
    };

    assert_eq!(
        banner(&state),
        Banner {
            message: None,
            error: Some("Error: Invalid GitHub URL".to_string()),
            loading: true,
        }
    );
    assert_eq!(banner(&DashboardState::default()), Banner::default());
}

#[test]
fn analysis_panel_follows_selection_and_results() {
    let mut state = DashboardState::default();
    assert_eq!(analysis_panel(&state), AnalysisPanel::Hidden);

    state.selected_repository = Some(repository(1));
    assert_eq!(
        analysis_panel(&state),
        AnalysisPanel::Empty {
            repository_name: "repo-1".to_string()
        }
    );

    state.analysis_results = vec![analysis(6, 2), analysis(5, 1)];
    state.comparison.toggle(AnalysisId(5));
    state.comparison.toggle(AnalysisId(6));
    match analysis_panel(&state) {
        AnalysisPanel::Results {
            latest,
            history,
            comparison,
            ..
        } => {
            assert_eq!(latest.analysis_id, AnalysisId(6));
            assert_eq!(history.map(|entries| entries.len()), Some(2));
            assert_eq!(
                comparison.map(|table| table.column_ids()),
                Some(vec![AnalysisId(6), AnalysisId(5)])
            );
        }
        other => panic!("unexpected panel: {other:?}"),
    }
}
