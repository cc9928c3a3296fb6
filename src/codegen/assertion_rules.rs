use serde::Serialize;

use crate::codegen::selector::{known_identifier, AnchorIds};
use crate::recording::flow_grouper::url_path;
use crate::recording::interaction_model::{InteractionKind, InteractionRecord};

// ============================================================================
// Assertion model
// ============================================================================

/// Only `High` is emitted as executable code; the rest become review comments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    pub fn as_str(self) -> &'static str {
        match self {
            Confidence::High => "high",
            Confidence::Medium => "medium",
            Confidence::Low => "low",
        }
    }

    pub fn is_executable(self) -> bool {
        self == Confidence::High
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AssertionKind {
    /// Current URL contains the path
    UrlContains { expected: String },
    /// Wait for network activity to settle
    NetworkIdle,
    /// Element with this identifier is visible
    ElementVisible { identifier: String },
    /// The current interaction's element holds this value
    HasValue { value: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InferredAssertion {
    pub kind: AssertionKind,
    pub confidence: Confidence,
    /// Name of the rule that produced it
    pub rule: &'static str,
}

// ============================================================================
// Rule table
// ============================================================================

/// Sliding window around the interaction being annotated.
#[derive(Debug, Clone, Copy)]
pub struct Window<'a> {
    pub previous: Option<&'a InteractionRecord>,
    pub current: &'a InteractionRecord,
    pub next: Option<&'a InteractionRecord>,
    pub ids: &'a AnchorIds,
}

impl<'a> Window<'a> {
    pub fn at(interactions: &'a [InteractionRecord], index: usize, ids: &'a AnchorIds) -> Option<Self> {
        let current = interactions.get(index)?;
        Some(Self {
            previous: index.checked_sub(1).and_then(|i| interactions.get(i)),
            current,
            next: interactions.get(index + 1),
            ids,
        })
    }
}

/// One inference rule: when `infer` matches, emit its assertion at `confidence`.
pub struct AssertionRule {
    pub name: &'static str,
    pub confidence: Confidence,
    pub infer: fn(&Window) -> Option<AssertionKind>,
}

/// Rules in evaluation order.
pub const RULES: &[AssertionRule] = &[
    AssertionRule {
        name: "click-then-navigation",
        confidence: Confidence::High,
        infer: click_then_navigation,
    },
    AssertionRule {
        name: "navigation",
        confidence: Confidence::High,
        infer: navigation,
    },
    AssertionRule {
        name: "submit-network-idle",
        confidence: Confidence::High,
        infer: submit_network_idle,
    },
    AssertionRule {
        name: "submit-url-change",
        confidence: Confidence::High,
        infer: submit_url_change,
    },
    AssertionRule {
        name: "click-reveals-identified",
        confidence: Confidence::Medium,
        infer: click_reveals_identified,
    },
    AssertionRule {
        name: "input-value",
        confidence: Confidence::Low,
        infer: input_value,
    },
];

/// Evaluate every rule against the interaction at `index`.
pub fn infer_assertions(
    interactions: &[InteractionRecord],
    index: usize,
    ids: &AnchorIds,
) -> Vec<InferredAssertion> {
    let Some(window) = Window::at(interactions, index, ids) else {
        return Vec::new();
    };
    evaluate(RULES, &window)
}

/// Evaluate an arbitrary rule table; exposed for testing rules in isolation.
pub fn evaluate(rules: &[AssertionRule], window: &Window) -> Vec<InferredAssertion> {
    rules
        .iter()
        .filter_map(|rule| {
            (rule.infer)(window).map(|kind| InferredAssertion {
                kind,
                confidence: rule.confidence,
                rule: rule.name,
            })
        })
        .collect()
}

// ============================================================================
// Predicates
// ============================================================================

fn is_click(kind: InteractionKind) -> bool {
    matches!(kind, InteractionKind::Click | InteractionKind::DoubleClick)
}

fn click_then_navigation(w: &Window) -> Option<AssertionKind> {
    let next = w.next?;
    (is_click(w.current.kind) && next.kind == InteractionKind::Navigation).then(|| {
        AssertionKind::UrlContains {
            expected: url_path(&next.url),
        }
    })
}

fn navigation(w: &Window) -> Option<AssertionKind> {
    (w.current.kind == InteractionKind::Navigation).then(|| AssertionKind::UrlContains {
        expected: url_path(&w.current.url),
    })
}

fn submit_network_idle(w: &Window) -> Option<AssertionKind> {
    (w.current.kind == InteractionKind::Submit).then_some(AssertionKind::NetworkIdle)
}

fn submit_url_change(w: &Window) -> Option<AssertionKind> {
    let next = w.next?;
    (w.current.kind == InteractionKind::Submit && next.url != w.current.url).then(|| {
        AssertionKind::UrlContains {
            expected: url_path(&next.url),
        }
    })
}

fn click_reveals_identified(w: &Window) -> Option<AssertionKind> {
    let next = w.next?;
    if !is_click(w.current.kind) || next.kind == InteractionKind::Navigation {
        return None;
    }
    known_identifier(next, w.ids).map(|identifier| AssertionKind::ElementVisible { identifier })
}

fn input_value(w: &Window) -> Option<AssertionKind> {
    if !w.current.kind.is_value_entry() {
        return None;
    }
    w.current
        .value
        .as_deref()
        .filter(|v| !v.is_empty())
        .map(|v| AssertionKind::HasValue {
            value: v.to_string(),
        })
}
