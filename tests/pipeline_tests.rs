use std::fs;
use std::path::{Path, PathBuf};

use flow_anchor::error::EngineError;
use flow_anchor::naming::NamingStrategy;
use flow_anchor::pipeline::processor::{ProcessConfig, SessionProcessor};
use flow_anchor::recording::interaction_model::InteractionRecord;
use flow_anchor::recording::session::SessionStatus;
use flow_anchor::trace::logger::RunJournal;

mod common;
use crate::common::fixtures::{
    anchored, click, login_interactions, navigate, page, session_with, BASE_URL, LOGIN_FILE,
    LOGIN_PAGE,
};

fn project() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join(LOGIN_FILE);
    fs::create_dir_all(file.parent().unwrap()).unwrap();
    fs::write(&file, LOGIN_PAGE).unwrap();
    dir
}

fn processor(root: &Path) -> SessionProcessor {
    SessionProcessor::new(ProcessConfig {
        strategy: NamingStrategy::ComponentAction,
        project_root: root.to_path_buf(),
        base_url: BASE_URL.to_string(),
        ..ProcessConfig::default()
    })
}

// ============================================================================
// End to end: login flow
// ============================================================================

#[test]
fn login_session_inserts_identifiers_and_generates_script() {
    let dir = project();
    let session = session_with("Login flow", login_interactions(LOGIN_FILE));
    let report = processor(dir.path()).process(&session).unwrap();

    assert!(report.errors.is_empty(), "{:?}", report.errors);
    assert_eq!(report.changes.len(), 1);
    let change = &report.changes[0];
    assert_eq!(change.inserted, 3);
    for id in [
        "login-page-email-input",
        "login-page-password-input",
        "login-page-submit-button",
    ] {
        assert!(
            change.modified.contains(&format!("data-testid=\"{}\"", id)),
            "missing {}",
            id
        );
    }
    assert!(change
        .modified
        .contains("<input type=\"email\" name=\"email\" data-testid=\"login-page-email-input\" />"));
    assert!(change.diff.contains("+++ b/src/pages/LoginPage.tsx"));

    assert_eq!(report.tests.len(), 1);
    let test = &report.tests[0];
    assert_eq!(test.path, PathBuf::from("tests/e2e/pages/login-page.spec.ts"));

    let script = &test.content;
    let goto = script.find("await page.goto('/');").unwrap();
    let email = script
        .find("await page.getByTestId('login-page-email-input').fill('user@example.com');")
        .unwrap();
    let password = script
        .find("await page.getByTestId('login-page-password-input').fill('password123');")
        .unwrap();
    let submit = script
        .find("await page.getByTestId('login-page-submit-button').click();")
        .unwrap();
    let dashboard = script
        .find(r"await expect(page).toHaveURL(/\/dashboard/);")
        .unwrap();
    assert!(goto < email && email < password && password < submit && submit < dashboard);
    assert_eq!(script.matches(r"toHaveURL(/\/dashboard/)").count(), 1);
}

#[test]
fn processing_does_not_touch_disk() {
    let dir = project();
    let session = session_with("Login flow", login_interactions(LOGIN_FILE));
    processor(dir.path()).process(&session).unwrap();

    assert_eq!(fs::read_to_string(dir.path().join(LOGIN_FILE)).unwrap(), LOGIN_PAGE);
    assert!(!dir.path().join("tests").exists());
}

#[test]
fn apply_writes_sources_backups_and_scripts_then_rollback_restores() {
    let dir = project();
    let proc = processor(dir.path());
    let session = session_with("Login flow", login_interactions(LOGIN_FILE));
    let report = proc.process(&session).unwrap();

    let applied = proc.apply(&report, true);
    assert!(applied.is_clean(), "{:?}", applied.errors);
    assert_eq!(applied.written, vec![dir.path().join(LOGIN_FILE)]);
    assert_eq!(applied.backups.len(), 1);
    assert_eq!(
        applied.backups[0].backup,
        dir.path().join(".flow-anchor/backups").join(LOGIN_FILE)
    );

    let source = fs::read_to_string(dir.path().join(LOGIN_FILE)).unwrap();
    assert_eq!(source, report.changes[0].modified);
    let script_path = dir.path().join("tests/e2e/pages/login-page.spec.ts");
    assert_eq!(fs::read_to_string(&script_path).unwrap(), report.tests[0].content);

    let restored = proc.rollback(&[applied.backups[0].backup.clone()]);
    assert!(restored.is_clean());
    assert_eq!(fs::read_to_string(dir.path().join(LOGIN_FILE)).unwrap(), LOGIN_PAGE);
}

#[test]
fn second_run_reuses_identifiers_and_inserts_nothing() {
    let dir = project();
    let proc = processor(dir.path());
    let session = session_with("Login flow", login_interactions(LOGIN_FILE));

    let first = proc.process(&session).unwrap();
    proc.apply(&first, false);

    let second = proc.process(&session).unwrap();
    assert_eq!(second.total_inserted(), 0);
    assert!(!second.changes[0].is_modified());
    assert_eq!(
        second
            .identifiers
            .get("src/pages/LoginPage.tsx:8:6")
            .map(String::as_str),
        Some("login-page-submit-button")
    );
    assert_eq!(second.tests[0].content, first.tests[0].content);
}

#[test]
fn apply_refuses_stale_preview() {
    let dir = project();
    let proc = processor(dir.path());
    let session = session_with("Login flow", login_interactions(LOGIN_FILE));
    let report = proc.process(&session).unwrap();

    let file = dir.path().join(LOGIN_FILE);
    fs::write(&file, format!("// edited\n{}", LOGIN_PAGE)).unwrap();

    let applied = proc.apply(&report, true);
    assert!(applied.written.is_empty());
    assert!(applied.backups.is_empty());
    assert_eq!(applied.errors.len(), 1);
    assert!(applied.errors[0].contains("changed on disk"));
    assert!(fs::read_to_string(&file).unwrap().starts_with("// edited"));
}

#[test]
fn tests_only_leaves_sources_alone() {
    let dir = project();
    let session = session_with("Login flow", login_interactions(LOGIN_FILE));
    let report = processor(dir.path()).process_tests_only(&session).unwrap();

    assert!(report.changes.is_empty());
    assert!(report.identifiers.is_empty());
    assert!(report.tests[0].content.contains("page.getByText('Submit').click()"));
}

// ============================================================================
// Identifiers across files
// ============================================================================

fn page_component(name: &str, label: &str) -> String {
    format!(
        "export function {}() {{\n  return (\n    <div id=\"root\">\n      <button>{}</button>\n    </div>\n  );\n}}\n",
        name, label
    )
}

fn button_click(file: &str, path: &str, label: &str) -> InteractionRecord {
    let mut r = anchored(click("#root > button"), file, 4, Some(6));
    r.url = page(path);
    r.target.text = Some(label.to_string());
    r
}

#[test]
fn shared_selector_on_two_pages_keeps_each_pages_identifier() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("src")).unwrap();
    fs::write(dir.path().join("src/Login.tsx"), page_component("Login", "Sign in")).unwrap();
    fs::write(dir.path().join("src/Dash.tsx"), page_component("Dash", "Logout")).unwrap();

    let session = session_with(
        "Sign in and out",
        vec![
            navigate("/"),
            button_click("src/Login.tsx", "/", "Sign in"),
            navigate("/dashboard"),
            button_click("src/Dash.tsx", "/dashboard", "Logout"),
        ],
    );
    let report = processor(dir.path()).process(&session).unwrap();
    assert!(report.errors.is_empty(), "{:?}", report.errors);

    let id_in = |file: &str| {
        report
            .plans
            .iter()
            .find(|p| p.file_path == Path::new(file))
            .map(|p| p.edits[0].identifier.clone())
            .unwrap()
    };
    let login_id = id_in("src/Login.tsx");
    let dash_id = id_in("src/Dash.tsx");
    assert_ne!(login_id, dash_id);

    let script_for = |name: &str| {
        report
            .tests
            .iter()
            .find(|t| t.path == PathBuf::from("tests/e2e").join(name))
            .map(|t| t.content.clone())
            .unwrap()
    };
    let login_script = script_for("login.spec.ts");
    let dash_script = script_for("dash.spec.ts");

    assert!(login_script.contains(&format!("page.getByTestId('{}').click()", login_id)));
    assert!(!login_script.contains(&dash_id));
    assert!(dash_script.contains(&format!("page.getByTestId('{}').click()", dash_id)));
    assert!(!dash_script.contains(&login_id));
}

// ============================================================================
// Project roots
// ============================================================================

#[test]
fn absolute_anchor_under_relative_root_applies() {
    let cwd = std::env::current_dir().unwrap();
    let dir = tempfile::tempdir_in(&cwd).unwrap();
    let file = dir.path().join(LOGIN_FILE);
    fs::create_dir_all(file.parent().unwrap()).unwrap();
    fs::write(&file, LOGIN_PAGE).unwrap();

    let relative_root = dir.path().strip_prefix(&cwd).unwrap().to_path_buf();
    assert!(relative_root.is_relative());
    let proc = processor(&relative_root);

    let absolute_anchor = file.to_str().unwrap().to_string();
    let session = session_with("Login flow", login_interactions(&absolute_anchor));
    let report = proc.process(&session).unwrap();
    assert_eq!(
        report.tests[0].path,
        PathBuf::from("tests/e2e/pages/login-page.spec.ts")
    );

    let applied = proc.apply(&report, true);
    assert!(applied.is_clean(), "{:?}", applied.errors);
    assert_eq!(applied.written, vec![file.clone()]);
    assert_eq!(
        applied.backups[0].backup,
        dir.path().join(".flow-anchor/backups").join(LOGIN_FILE)
    );
    assert_eq!(fs::read_to_string(&file).unwrap(), report.changes[0].modified);
    assert_eq!(
        fs::read_to_string(&applied.backups[0].backup).unwrap(),
        LOGIN_PAGE
    );
}

// ============================================================================
// Per-item failures
// ============================================================================

#[test]
fn broken_file_is_an_error_but_other_files_continue() {
    let dir = project();
    let broken = dir.path().join("src/Broken.jsx");
    fs::write(&broken, "export const Broken = () => <div>;\n").unwrap();

    let mut interactions = login_interactions(LOGIN_FILE);
    interactions.insert(1, anchored(click("#broken"), "src/Broken.jsx", 1, Some(29)));
    let session = session_with("Mixed", interactions);

    let report = processor(dir.path()).process(&session).unwrap();
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].contains("syntax error"));
    assert_eq!(report.changes.len(), 1);
    assert_eq!(report.changes[0].inserted, 3);
    assert!(!report.tests.is_empty());
}

#[test]
fn missing_file_is_a_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let session = session_with("Gone", vec![anchored(click("#x"), "src/Gone.jsx", 1, Some(0))]);
    let report = processor(dir.path()).process(&session).unwrap();
    assert!(report.errors[0].contains("failed to read"));
    assert_eq!(report.tests.len(), 1);
}

#[test]
fn unanchored_interactions_warn_and_use_fallback_selectors() {
    let dir = tempfile::tempdir().unwrap();
    let session = session_with("Loose", vec![click("#free"), navigate("/next")]);
    let report = processor(dir.path()).process(&session).unwrap();

    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].contains("#free"));
    assert!(report.tests[0].content.contains("page.locator('#free').click()"));
}

#[test]
fn empty_session_generates_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let session = session_with("Empty", Vec::new());
    let err = processor(dir.path()).process(&session).unwrap_err();
    assert!(matches!(err, EngineError::NoTestsGenerated));
}

#[test]
fn live_session_is_processed_with_a_warning() {
    let dir = project();
    let mut session = session_with("Login flow", login_interactions(LOGIN_FILE));
    session.status = SessionStatus::Recording;
    let report = processor(dir.path()).process(&session).unwrap();
    assert!(report.warnings.iter().any(|w| w.contains("still recording")));
}

#[test]
fn journal_records_one_line_per_event() {
    let dir = project();
    let journal_path = dir.path().join("logs/run.jsonl");
    let proc = processor(dir.path()).with_journal(RunJournal::open(&journal_path));
    let session = session_with("Login flow", login_interactions(LOGIN_FILE));
    proc.process(&session).unwrap();

    let journal = fs::read_to_string(&journal_path).unwrap();
    let events: Vec<serde_json::Value> = journal
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    let stages: Vec<&str> = events.iter().map(|e| e["stage"].as_str().unwrap()).collect();
    assert_eq!(stages, vec!["plan", "execute", "generate"]);
    assert_eq!(events[1]["inserted"], 3);
    assert_eq!(events[2]["generated"], 1);
}
