use similar::{ChangeTag, TextDiff};

/// Unified diff between two versions of a file, with `a/` and `b/` headers.
///
/// Empty when the texts are identical.
pub fn unified_diff(path: &str, original: &str, modified: &str) -> String {
    if original == modified {
        return String::new();
    }
    TextDiff::from_lines(original, modified)
        .unified_diff()
        .context_radius(3)
        .header(&format!("a/{}", path), &format!("b/{}", path))
        .to_string()
}

/// (lines added, lines removed)
pub fn line_stats(original: &str, modified: &str) -> (usize, usize) {
    let diff = TextDiff::from_lines(original, modified);
    diff.iter_all_changes()
        .fold((0, 0), |(added, removed), change| match change.tag() {
            ChangeTag::Insert => (added + 1, removed),
            ChangeTag::Delete => (added, removed + 1),
            ChangeTag::Equal => (added, removed),
        })
}
