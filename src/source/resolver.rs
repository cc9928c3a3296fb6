use crate::source::index::ElementOccurrence;

/// How an occurrence was matched to a recorded position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// Same line and column
    Exact,
    /// Only candidate on the recorded line
    SoleOnLine,
    /// Closest line
    Nearest { distance: u32 },
}

/// Map a recorded (line, column) to at most one element occurrence.
///
/// Captured columns drift by a character or two when upstream tooling
/// normalizes attribute order, so matching falls back in order:
/// 1. exact (line, column)
/// 2. the single occurrence on that line
/// 3. minimum absolute line distance, first encountered on ties
///
/// A `None` column skips step 1.
pub fn resolve<'i>(
    occurrences: &'i [ElementOccurrence],
    line: u32,
    column: Option<u32>,
) -> Option<(&'i ElementOccurrence, MatchKind)> {
    if let Some(column) = column {
        if let Some(exact) = occurrences
            .iter()
            .find(|o| o.line == line && o.column == column)
        {
            return Some((exact, MatchKind::Exact));
        }
    }

    let mut on_line = occurrences.iter().filter(|o| o.line == line);
    if let (Some(only), None) = (on_line.next(), on_line.next()) {
        return Some((only, MatchKind::SoleOnLine));
    }

    // min_by_key keeps the first minimum
    occurrences
        .iter()
        .min_by_key(|o| o.line.abs_diff(line))
        .map(|o| {
            (
                o,
                MatchKind::Nearest {
                    distance: o.line.abs_diff(line),
                },
            )
        })
}
