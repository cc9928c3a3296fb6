use crate::insertion::backup::RollbackReport;
use crate::insertion::diff::line_stats;
use crate::insertion::planner::EditPlan;
use crate::pipeline::processor::{ApplyReport, ProcessReport};

// ============================================================================
// Console reporter: formatted terminal output
// ============================================================================

/// Format a processing run for terminal output.
///
/// Produces output like:
/// ```text
/// === Session: Login flow (s-1) ===
///
/// ✓ src/pages/LoginPage.tsx  3 inserted, 0 skipped (+3 -3)
///
/// Tests:
///   tests/e2e/pages/login-page.spec.ts  'Login flow': 4 interactions across home page
///
/// [ERROR] syntax error in src/pages/Broken.tsx: Unexpected token
///
/// === Results: 3 inserted, 1 test file, 0 warnings, 1 errors ===
/// ```
pub fn format_process_report(report: &ProcessReport) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "=== Session: {} ({}) ===\n\n",
        report.session_name, report.session_id
    ));

    for change in &report.changes {
        let (added, removed) = line_stats(&change.original, &change.modified);
        let marker = if change.skipped.is_empty() {
            "\u{2713}"
        } else {
            "!"
        };
        out.push_str(&format!(
            "{} {}  {} inserted, {} skipped (+{} -{})\n",
            marker,
            change.display_path,
            change.inserted,
            change.skipped.len(),
            added,
            removed
        ));
        for skip in &change.skipped {
            out.push_str(&format!(
                "    [SKIP] {} at {}:{}: {}\n",
                skip.edit.identifier, skip.edit.line, skip.edit.column, skip.reason
            ));
        }
    }

    if !report.tests.is_empty() {
        out.push_str("\nTests:\n");
        for test in &report.tests {
            out.push_str(&format!("  {}  {}\n", test.path.display(), test.description));
        }
    }

    push_messages(&mut out, "WARN", &report.warnings);
    push_messages(&mut out, "ERROR", &report.errors);

    out.push_str(&format!(
        "\n=== Results: {} inserted, {} test {}, {} warnings, {} errors ===\n",
        report.total_inserted(),
        report.tests.len(),
        plural(report.tests.len(), "file", "files"),
        report.warnings.len(),
        report.errors.len()
    ));

    out
}

/// Format edit plans as a dry-run listing.
pub fn format_plans(plans: &[EditPlan]) -> String {
    let mut out = String::new();

    for plan in plans {
        out.push_str(&format!("=== Plan: {} ===\n", plan.file_path.display()));
        for edit in &plan.edits {
            out.push_str(&format!(
                "  + {}:{} <{}> {}",
                edit.line, edit.column, edit.expected_tag, edit.identifier
            ));
            if let Some(component) = &edit.component {
                out.push_str(&format!("  ({})", component));
            }
            out.push('\n');
        }
        for (anchor, identifier) in &plan.reused {
            out.push_str(&format!("  = {} already has {}\n", anchor, identifier));
        }
        for skip in &plan.skips {
            out.push_str(&format!(
                "  - #{} {}: {}\n",
                skip.interaction, skip.selector, skip.reason
            ));
        }
        out.push('\n');
    }

    if plans.is_empty() {
        out.push_str("No files to plan.\n");
    }
    out
}

/// Concatenated unified diffs plus the scripts that would be written.
pub fn format_preview(report: &ProcessReport) -> String {
    let mut out = String::new();

    for change in report.changes.iter().filter(|c| c.is_modified()) {
        out.push_str(&change.diff);
        if !change.diff.ends_with('\n') {
            out.push('\n');
        }
    }

    for test in &report.tests {
        out.push_str(&format!("would write {}\n", test.path.display()));
    }

    push_messages(&mut out, "WARN", &report.warnings);
    push_messages(&mut out, "ERROR", &report.errors);
    out
}

pub fn format_apply_report(report: &ApplyReport) -> String {
    let mut out = String::new();

    for path in &report.written {
        out.push_str(&format!("\u{2713} wrote {}\n", path.display()));
    }
    for record in &report.backups {
        out.push_str(&format!(
            "  backup {} -> {}\n",
            record.original.display(),
            record.backup.display()
        ));
    }
    for path in &report.tests_written {
        out.push_str(&format!("\u{2713} test {}\n", path.display()));
    }
    push_messages(&mut out, "ERROR", &report.errors);

    out.push_str(&format!(
        "\n=== Applied: {} source {}, {} test {}, {} errors ===\n",
        report.written.len(),
        plural(report.written.len(), "file", "files"),
        report.tests_written.len(),
        plural(report.tests_written.len(), "file", "files"),
        report.errors.len()
    ));
    out
}

pub fn format_rollback_report(report: &RollbackReport) -> String {
    let mut out = String::new();
    for path in &report.restored {
        out.push_str(&format!("\u{2713} restored {}\n", path.display()));
    }
    for error in &report.errors {
        out.push_str(&format!("\u{2717} {}\n", error));
    }
    out
}

fn push_messages(out: &mut String, label: &str, messages: &[String]) {
    if messages.is_empty() {
        return;
    }
    out.push('\n');
    for message in messages {
        out.push_str(&format!("[{}] {}\n", label, message));
    }
}

fn plural<'a>(n: usize, one: &'a str, many: &'a str) -> &'a str {
    if n == 1 { one } else { many }
}
