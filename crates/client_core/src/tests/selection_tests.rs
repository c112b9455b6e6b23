use super::*;

#[test]
fn toggle_adds_then_removes() {
    let mut selection = ComparisonSelection::default();
    let before = selection.clone();

    assert_eq!(selection.toggle(AnalysisId(5)), ToggleOutcome::Added);
    assert!(selection.contains(AnalysisId(5)));
    assert_eq!(selection.toggle(AnalysisId(5)), ToggleOutcome::Removed);

    assert_eq!(selection, before);
}

#[test]
fn toggle_is_its_own_inverse_with_other_members_present() {
    let mut selection = ComparisonSelection::default();
    selection.toggle(AnalysisId(1));
    let before = selection.clone();

    selection.toggle(AnalysisId(2));
    selection.toggle(AnalysisId(2));

    assert_eq!(selection, before);
}

#[test]
fn third_member_is_silently_ignored() {
    let mut selection = ComparisonSelection::default();
    selection.toggle(AnalysisId(1));
    selection.toggle(AnalysisId(2));

    let outcome = selection.toggle(AnalysisId(3));

    assert_eq!(outcome, ToggleOutcome::AtCapacity);
    assert!(!outcome.changed());
    assert_eq!(selection.ids(), &[AnalysisId(1), AnalysisId(2)]);
}

#[test]
fn removal_at_capacity_is_allowed() {
    let mut selection = ComparisonSelection::default();
    selection.toggle(AnalysisId(1));
    selection.toggle(AnalysisId(2));

    assert_eq!(selection.toggle(AnalysisId(1)), ToggleOutcome::Removed);
    assert_eq!(selection.toggle(AnalysisId(3)), ToggleOutcome::Added);
    assert_eq!(selection.ids(), &[AnalysisId(2), AnalysisId(3)]);
}

#[test]
fn never_exceeds_capacity_over_long_toggle_sequences() {
    let mut selection = ComparisonSelection::default();
    // Deterministic pseudo-random walk over a small id space.
    let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
    for _ in 0..2_000 {
        seed ^= seed << 13;
        seed ^= seed >> 7;
        seed ^= seed << 17;
        selection.toggle(AnalysisId((seed % 7) as i64));
        assert!(selection.len() <= MAX_COMPARISON);
    }
}

#[test]
fn comparable_only_with_two_members() {
    let mut selection = ComparisonSelection::default();
    assert!(!selection.is_comparable());
    selection.toggle(AnalysisId(1));
    assert!(!selection.is_comparable());
    selection.toggle(AnalysisId(2));
    assert!(selection.is_comparable());
    selection.clear();
    assert!(selection.is_empty());
}
