use std::fmt;

use serde::{Deserialize, Serialize};

use crate::recording::interaction_model::{SourceAnchor, TargetElement};

const SEGMENT_CAP: usize = 30;
const LABEL_CAP: usize = 40;
const HIERARCHY_DEPTH: usize = 3;

/// Input types that name the action on their own.
const INPUT_TYPE_ACTIONS: &[&str] = &["submit", "email", "password", "search"];

/// Verbs recognized in visible text, checked in this order.
const TEXT_ACTIONS: &[&str] = &[
    "submit", "login", "logout", "save", "delete", "cancel", "close", "open", "search", "add",
    "edit", "create", "remove",
];

/// Identifier naming strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum NamingStrategy {
    /// `<component>-<action>-<tag>`
    #[default]
    ComponentAction,
    /// `<outer>-<inner>-<element>`
    Hierarchical,
    /// `<label>-<tag>`
    Descriptive,
}

impl fmt::Display for NamingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NamingStrategy::ComponentAction => "component-action",
            NamingStrategy::Hierarchical => "hierarchical",
            NamingStrategy::Descriptive => "descriptive",
        })
    }
}

/// Everything a strategy may look at.
#[derive(Debug, Clone, Copy)]
pub struct NameRequest<'a> {
    pub target: &'a TargetElement,
    pub anchor: Option<&'a SourceAnchor>,
    pub action_hint: Option<&'a str>,
    /// Interaction timestamp, only used when every segment comes out empty
    pub timestamp: u64,
}

impl NamingStrategy {
    /// Derive an identifier. Pure: identical requests give identical names.
    pub fn name(self, request: &NameRequest) -> String {
        let segments = match self {
            NamingStrategy::ComponentAction => component_action_segments(request),
            NamingStrategy::Hierarchical => hierarchical_segments(request),
            NamingStrategy::Descriptive => descriptive_segments(request),
        };

        let joined = segments
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("-");

        if joined.is_empty() {
            format!("element-{}", request.timestamp)
        } else {
            joined
        }
    }
}

// ============================================================================
// Strategies
// ============================================================================

fn component_action_segments(request: &NameRequest) -> Vec<String> {
    let component = request
        .anchor
        .and_then(|a| a.component_name.as_deref())
        .map(|c| to_segment(c, SEGMENT_CAP))
        .unwrap_or_default();

    let action = match request.action_hint {
        Some(hint) => to_segment(hint, SEGMENT_CAP),
        None => infer_action(request.target).unwrap_or_default(),
    };

    let tag = to_segment(&request.target.tag_name, SEGMENT_CAP);

    vec![component, action, tag]
}

fn hierarchical_segments(request: &NameRequest) -> Vec<String> {
    let mut segments: Vec<String> = match request.anchor {
        Some(anchor) if !anchor.component_chain.is_empty() => {
            let chain = &anchor.component_chain;
            let skip = chain.len().saturating_sub(HIERARCHY_DEPTH);
            chain[skip..]
                .iter()
                .map(|c| to_segment(c, SEGMENT_CAP))
                .collect()
        }
        Some(anchor) => anchor
            .component_name
            .iter()
            .map(|c| to_segment(c, SEGMENT_CAP))
            .collect(),
        None => Vec::new(),
    };

    let target = request.target;
    let element = first_present(&[
        target.label.as_deref(),
        target.text.as_deref(),
        target.placeholder.as_deref(),
    ])
    .map(|s| to_segment(s, SEGMENT_CAP))
    .filter(|s| !s.is_empty())
    .unwrap_or_else(|| to_segment(&target.tag_name, SEGMENT_CAP));

    segments.push(element);
    segments
}

fn descriptive_segments(request: &NameRequest) -> Vec<String> {
    let target = request.target;
    let description = first_present(&[
        target.label.as_deref(),
        target.text.as_deref(),
        target.placeholder.as_deref(),
        target.inner_text.as_deref(),
    ])
    .map(|s| to_segment(s, LABEL_CAP))
    .unwrap_or_default();

    vec![description, to_segment(&target.tag_name, SEGMENT_CAP)]
}

/// Action verb for an element, from the strongest signal available.
pub fn infer_action(target: &TargetElement) -> Option<String> {
    let input_type = target.input_type();

    if target.tag_name.eq_ignore_ascii_case("input") {
        if let Some(t) = input_type.as_deref() {
            if INPUT_TYPE_ACTIONS.contains(&t) {
                return Some(t.to_string());
            }
        }
    }

    if let Some(text) = target.text.as_deref() {
        let lowered = text.to_lowercase();
        let words: Vec<&str> = lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();
        if let Some(keyword) = TEXT_ACTIONS.iter().find(|k| words.contains(*k)) {
            return Some(keyword.to_string());
        }
    }

    if input_type.as_deref() == Some("submit") {
        return Some("submit".to_string());
    }

    target
        .label
        .as_deref()
        .map(|label| to_segment(label, SEGMENT_CAP))
        .filter(|s| !s.is_empty())
}

// ============================================================================
// Segment normalization
// ============================================================================

/// Lowercase, hyphenate word boundaries, drop everything but `[a-z0-9-]`,
/// and cap the length.
///
/// `"LoginPage"` becomes `"login-page"`, `"HTMLInput"` becomes `"html-input"`.
pub fn to_segment(raw: &str, cap: usize) -> String {
    let chars: Vec<char> = raw.trim().chars().collect();
    let mut out = String::with_capacity(chars.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower)
            {
                out.push('-');
            }
        }

        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if c.is_whitespace() || matches!(c, '-' | '_' | '.' | ':' | '/') {
            out.push('-');
        }
    }

    let collapsed = out
        .split('-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-");

    let capped: String = collapsed.chars().take(cap).collect();
    capped.trim_end_matches('-').to_string()
}

fn first_present<'a>(candidates: &[Option<&'a str>]) -> Option<&'a str> {
    candidates
        .iter()
        .flatten()
        .copied()
        .map(str::trim)
        .find(|s| !s.is_empty())
}
