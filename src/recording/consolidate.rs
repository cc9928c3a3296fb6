use crate::recording::interaction_model::{InteractionKind, InteractionRecord};

/// Collapse a raw interaction stream into its semantic actions.
///
/// Single pass, order preserving:
/// - a run of consecutive input/change events on the same selector keeps only
///   the last one (it carries the final value)
/// - a click immediately followed by an input on the same selector is a focus
///   click and is dropped
pub fn consolidate(interactions: &[InteractionRecord]) -> Vec<InteractionRecord> {
    let mut out = Vec::with_capacity(interactions.len());
    let mut i = 0;

    while i < interactions.len() {
        let current = &interactions[i];

        if current.kind.is_value_entry() {
            let run_end = value_run_end(interactions, i);
            out.push(interactions[run_end].clone());
            i = run_end + 1;
            continue;
        }

        if current.kind == InteractionKind::Click && is_focus_click(interactions, i) {
            i += 1;
            continue;
        }

        out.push(current.clone());
        i += 1;
    }

    out
}

/// Index of the last event in the input/change run starting at `start`.
fn value_run_end(interactions: &[InteractionRecord], start: usize) -> usize {
    let head = &interactions[start];
    let mut end = start;
    while let Some(next) = interactions.get(end + 1) {
        if next.kind.is_value_entry() && next.same_target(head) {
            end += 1;
        } else {
            break;
        }
    }
    end
}

fn is_focus_click(interactions: &[InteractionRecord], index: usize) -> bool {
    match interactions.get(index + 1) {
        Some(next) => {
            next.kind == InteractionKind::Input && next.same_target(&interactions[index])
        }
        None => false,
    }
}
