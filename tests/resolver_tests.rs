use flow_anchor::source::document::ElementId;
use flow_anchor::source::index::ElementOccurrence;
use flow_anchor::source::resolver::{resolve, MatchKind};

fn occurrence(n: usize, line: u32, column: u32) -> ElementOccurrence {
    ElementOccurrence {
        element: ElementId(n),
        tag: "div".into(),
        line,
        column,
        existing_id: None,
        has_dynamic_id: false,
        component: None,
        component_chain: Vec::new(),
    }
}

/// One occurrence on each of lines 4, 5 and 6.
fn three_lines() -> Vec<ElementOccurrence> {
    vec![occurrence(0, 4, 2), occurrence(1, 5, 4), occurrence(2, 6, 4)]
}

#[test]
fn exact_match_wins() {
    let index = vec![occurrence(0, 5, 2), occurrence(1, 5, 10)];
    let (found, kind) = resolve(&index, 5, Some(10)).unwrap();
    assert_eq!(found.element, ElementId(1));
    assert_eq!(kind, MatchKind::Exact);
}

#[test]
fn sole_occurrence_on_line_absorbs_column_drift() {
    let index = three_lines();
    let (found, kind) = resolve(&index, 5, Some(999)).unwrap();
    assert_eq!(found.line, 5);
    assert_eq!(kind, MatchKind::SoleOnLine);
}

#[test]
fn nearest_line_when_past_the_end() {
    let index = three_lines();
    let (found, kind) = resolve(&index, 10, Some(0)).unwrap();
    assert_eq!(found.line, 6);
    assert_eq!(kind, MatchKind::Nearest { distance: 4 });
}

#[test]
fn ties_go_to_the_first_encountered() {
    let index = vec![occurrence(0, 3, 0), occurrence(1, 7, 0)];
    let (found, _) = resolve(&index, 5, Some(0)).unwrap();
    assert_eq!(found.element, ElementId(0));
}

#[test]
fn several_on_line_without_exact_falls_back_to_distance() {
    let index = vec![occurrence(0, 5, 2), occurrence(1, 5, 10), occurrence(2, 6, 0)];
    let (found, kind) = resolve(&index, 5, Some(7)).unwrap();
    assert_eq!(found.element, ElementId(0));
    assert_eq!(kind, MatchKind::Nearest { distance: 0 });
}

#[test]
fn missing_column_means_no_column_constraint() {
    let index = vec![occurrence(0, 5, 0), occurrence(1, 8, 0)];
    let (found, kind) = resolve(&index, 8, None).unwrap();
    assert_eq!(found.element, ElementId(1));
    assert_eq!(kind, MatchKind::SoleOnLine);
}

#[test]
fn column_zero_is_a_real_column() {
    let index = vec![occurrence(0, 5, 0), occurrence(1, 5, 6)];
    let (found, kind) = resolve(&index, 5, Some(0)).unwrap();
    assert_eq!(found.element, ElementId(0));
    assert_eq!(kind, MatchKind::Exact);
}

#[test]
fn empty_index_resolves_nothing() {
    assert!(resolve(&[], 1, Some(0)).is_none());
}
