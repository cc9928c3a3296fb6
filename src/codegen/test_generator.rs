use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};

use serde::Serialize;
use url::Url;

use crate::codegen::assertion_rules::{infer_assertions, AssertionKind, InferredAssertion};
use crate::codegen::selector::{choose_locator, known_identifier, quote, Locator, AnchorIds};
use crate::naming::strategy::to_segment;
use crate::naming::UsedNames;
use crate::recording::flow_grouper::{url_path, FlowGroup};
use crate::recording::interaction_model::{InteractionKind, InteractionRecord};

/// Indentation of statements inside the test body
const BODY: &str = "  ";

/// Keys worth replaying; everything else is typing noise already captured by fills.
const REPLAYED_KEYS: &[&str] = &["Enter", "Escape", "Tab"];

// ============================================================================
// Generator configuration and output
// ============================================================================

#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Same-origin URLs are rendered as paths relative to this
    pub base_url: String,
    pub project_root: PathBuf,
    pub source_dir: PathBuf,
    pub test_dir: PathBuf,
}

/// A generated test script. Output only; written once per run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedTestFile {
    pub path: PathBuf,
    pub content: String,
    pub description: String,
}

// ============================================================================
// Test generation
// ============================================================================

/// Generate Playwright test scripts for a grouped session.
///
/// When every group shares at most one source file the whole session becomes
/// one script; otherwise each group gets its own.
pub fn generate_tests(
    session_name: &str,
    groups: &[FlowGroup],
    ids: &AnchorIds,
    config: &GeneratorConfig,
) -> Vec<GeneratedTestFile> {
    let hints: BTreeSet<&str> = groups
        .iter()
        .filter_map(|g| g.source_file_hint.as_deref())
        .collect();

    let mut taken = UsedNames::new();

    if hints.len() <= 1 {
        let interactions: Vec<InteractionRecord> = groups
            .iter()
            .flat_map(|g| g.interactions.iter().cloned())
            .collect();
        let title = if session_name.trim().is_empty() {
            groups.first().map(|g| g.name.clone()).unwrap_or_default()
        } else {
            session_name.to_string()
        };
        let hint = hints.iter().next().copied();
        let page_names: Vec<&str> = groups.iter().map(|g| g.name.as_str()).collect();

        return generate_script(&title, hint, &interactions, ids, config, &mut taken)
            .map(|(path, content)| GeneratedTestFile {
                path,
                content,
                description: format!(
                    "'{}': {} interactions across {}",
                    title,
                    interactions.len(),
                    page_names.join(", ")
                ),
            })
            .into_iter()
            .collect();
    }

    groups
        .iter()
        .filter_map(|group| {
            let title = format!("{} - {}", session_name, group.name);
            generate_script(
                &title,
                group.source_file_hint.as_deref(),
                &group.interactions,
                ids,
                config,
                &mut taken,
            )
            .map(|(path, content)| GeneratedTestFile {
                path,
                content,
                description: format!(
                    "'{}': {} interactions on {}",
                    title,
                    group.interactions.len(),
                    group.name
                ),
            })
        })
        .collect()
}

fn generate_script(
    title: &str,
    source_hint: Option<&str>,
    interactions: &[InteractionRecord],
    ids: &AnchorIds,
    config: &GeneratorConfig,
    taken: &mut UsedNames,
) -> Option<(PathBuf, String)> {
    let first = interactions.first()?;
    let path = match source_hint {
        Some(hint) => test_path_for_source(hint, config),
        None => test_path_for_name(title, config),
    };
    let path = unique_path(&path, taken);

    Some((path, render_script(title, interactions, ids, &config.base_url, &first.url)))
}

/// Render one script: initial navigation, then an action and its inferred
/// assertions per interaction.
pub fn render_script(
    title: &str,
    interactions: &[InteractionRecord],
    ids: &AnchorIds,
    base_url: &str,
    start_url: &str,
) -> String {
    let body = BODY;
    let mut out = String::new();
    out.push_str("import { test, expect } from '@playwright/test';\n\n");
    out.push_str(&format!("test({}, async ({{ page }}) => {{\n", quote(title)));
    out.push_str(&format!(
        "{}await page.goto({});\n",
        body,
        quote(&display_url(base_url, start_url))
    ));

    let mut last_assertion: Option<String> = None;

    for (index, interaction) in interactions.iter().enumerate() {
        // The initial goto already covers a leading navigation.
        if index == 0 && interaction.kind == InteractionKind::Navigation {
            continue;
        }

        let identifier = known_identifier(interaction, ids);
        let locator = choose_locator(&interaction.target, identifier.as_deref());

        let Some(statement) = action_statement(interaction, &locator, base_url) else {
            continue;
        };
        if !statement.starts_with("//") {
            last_assertion = None;
        }
        out.push_str(&format!("{}{}\n", body, statement));

        for assertion in infer_assertions(interactions, index, ids) {
            let line = assertion_statement(&assertion, &locator);
            if assertion.confidence.is_executable() {
                if last_assertion.as_deref() == Some(line.as_str()) {
                    continue;
                }
                last_assertion = Some(line.clone());
            }
            out.push_str(&format!("{}{}\n", body, line));
        }
    }

    out.push_str("});\n");
    out
}

/// Statement replaying one interaction. `None` drops it from the script.
fn action_statement(interaction: &InteractionRecord, locator: &Locator, base_url: &str) -> Option<String> {
    let target = locator.render();
    match interaction.kind {
        InteractionKind::Click => Some(format!("await {}.click();", target)),
        InteractionKind::DoubleClick => Some(format!("await {}.dblclick();", target)),
        InteractionKind::Input | InteractionKind::Change => {
            let value = interaction.value.as_deref().filter(|v| !v.is_empty())?;
            Some(format!("await {}.fill({});", target, quote(value)))
        }
        InteractionKind::Submit => {
            Some("// form submitted (performed by the submit control above)".to_string())
        }
        InteractionKind::KeyPress => {
            let key = interaction.key.as_deref()?;
            REPLAYED_KEYS
                .contains(&key)
                .then(|| format!("await page.keyboard.press({});", quote(key)))
        }
        InteractionKind::Navigation => Some(format!(
            "// navigated to {}",
            display_url(base_url, &interaction.url)
        )),
        other => Some(format!(
            "// {} on {} is not replayed",
            other.as_str(),
            single_line(&interaction.target.selector)
        )),
    }
}

fn assertion_statement(assertion: &InferredAssertion, locator: &Locator) -> String {
    let code = match &assertion.kind {
        AssertionKind::UrlContains { expected } => {
            format!("await expect(page).toHaveURL({});", url_pattern(expected))
        }
        AssertionKind::NetworkIdle => "await page.waitForLoadState('networkidle');".to_string(),
        AssertionKind::ElementVisible { identifier } => format!(
            "await expect({}).toBeVisible();",
            Locator::TestId(identifier.clone()).render()
        ),
        AssertionKind::HasValue { value } => {
            format!("await expect({}).toHaveValue({});", locator.render(), quote(value))
        }
    };

    if assertion.confidence.is_executable() {
        code
    } else {
        format!(
            "// TODO ({} confidence, {}): {}",
            assertion.confidence.as_str(),
            assertion.rule,
            code
        )
    }
}

// ============================================================================
// URLs and paths
// ============================================================================

/// Path form of `url` when it shares an origin with `base_url`, else `url` as is.
pub fn display_url(base_url: &str, url: &str) -> String {
    if !is_same_origin(base_url, url) {
        return url.to_string();
    }
    match Url::parse(url) {
        Ok(parsed) => {
            let mut path = parsed.path().to_string();
            if let Some(query) = parsed.query() {
                path.push('?');
                path.push_str(query);
            }
            if let Some(fragment) = parsed.fragment() {
                path.push('#');
                path.push_str(fragment);
            }
            path
        }
        Err(_) => url_path(url),
    }
}

/// Whether two absolute URLs share scheme, host and port.
pub fn is_same_origin(base: &str, candidate: &str) -> bool {
    match (Url::parse(base), Url::parse(candidate)) {
        (Ok(a), Ok(b)) => a.origin() == b.origin(),
        _ => false,
    }
}

/// `src/pages/LoginPage.tsx` maps to `<test_dir>/pages/login-page.spec.ts`.
pub fn test_path_for_source(source_file: &str, config: &GeneratorConfig) -> PathBuf {
    let source = clean(Path::new(source_file));
    // Relative anchors are already project relative; absolute ones are
    // compared against the absolute project root.
    let root = if source.is_absolute() {
        std::path::absolute(&config.project_root)
            .map(|root| clean(&root))
            .unwrap_or_else(|_| clean(&config.project_root))
    } else {
        clean(&config.project_root)
    };
    let source_dir = clean(&config.source_dir);

    let mut rel = source.strip_prefix(&root).map(Path::to_path_buf).unwrap_or(source.clone());
    if let Ok(inner) = rel.strip_prefix(&source_dir) {
        rel = inner.to_path_buf();
    }
    if rel.is_absolute() {
        rel = rel.file_name().map(PathBuf::from).unwrap_or_default();
    }

    let stem = rel
        .file_stem()
        .and_then(|s| s.to_str())
        .map(|s| to_segment(s, 80))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "flow".to_string());

    let parent: PathBuf = rel
        .parent()
        .map(|p| {
            p.components()
                .filter(|c| matches!(c, Component::Normal(_)))
                .collect()
        })
        .unwrap_or_default();

    config.test_dir.join(parent).join(format!("{}.spec.ts", stem))
}

/// `"Login flow - dashboard page"` maps to `<test_dir>/login-flow-dashboard-page.spec.ts`.
pub fn test_path_for_name(name: &str, config: &GeneratorConfig) -> PathBuf {
    let stem = to_segment(name, 80);
    let stem = if stem.is_empty() { "session".to_string() } else { stem };
    config.test_dir.join(format!("{}.spec.ts", stem))
}

fn unique_path(path: &Path, taken: &mut UsedNames) -> PathBuf {
    let key = path.to_string_lossy().to_string();
    if taken.insert(&key) {
        return path.to_path_buf();
    }

    let stem = path
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(|n| n.strip_suffix(".spec.ts"))
        .unwrap_or("flow")
        .to_string();
    let parent = path.parent().map(Path::to_path_buf).unwrap_or_default();

    let mut n = 2;
    loop {
        let candidate = parent.join(format!("{}-{}.spec.ts", stem, n));
        if taken.insert(&candidate.to_string_lossy()) {
            return candidate;
        }
        n += 1;
    }
}

fn clean(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

/// Regex literal matching any URL that contains `fragment`.
fn url_pattern(fragment: &str) -> String {
    let mut out = String::with_capacity(fragment.len() + 2);
    out.push('/');
    for c in fragment.chars() {
        if matches!(
            c,
            '\\' | '/' | '.' | '*' | '+' | '?' | '^' | '$' | '{' | '}' | '(' | ')' | '|' | '[' | ']'
        ) {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('/');
    out
}

fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
