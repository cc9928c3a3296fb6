use std::collections::BTreeMap;

use crate::recording::interaction_model::{InteractionRecord, TargetElement};

/// Visible text longer than this is not used as a locator.
pub const MAX_TEXT_LOCATOR_LEN: usize = 40;

/// anchor key (`file:line:column`) -> identifier, merged from every file's edit plan
pub type AnchorIds = BTreeMap<String, String>;

/// How a generated statement finds its element, strongest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    TestId(String),
    Role { role: String, name: String },
    Text(String),
    ElementId(String),
    Css(String),
}

impl Locator {
    /// Playwright expression for this locator.
    pub fn render(&self) -> String {
        match self {
            Locator::TestId(id) => format!("page.getByTestId({})", quote(id)),
            Locator::Role { role, name } => format!(
                "page.getByRole({}, {{ name: {} }})",
                quote(role),
                quote(name)
            ),
            Locator::Text(text) => format!("page.getByText({})", quote(text)),
            Locator::ElementId(id) => format!("page.locator({})", quote(&format!("#{}", id))),
            Locator::Css(css) => format!("page.locator({})", quote(css)),
        }
    }
}

/// Identifier known for an interaction's target: captured from the DOM or
/// planned for the interaction's own source anchor.
pub fn known_identifier(interaction: &InteractionRecord, ids: &AnchorIds) -> Option<String> {
    interaction
        .target
        .test_id
        .clone()
        .filter(|id| !id.is_empty())
        .or_else(|| {
            interaction
                .anchor_key()
                .and_then(|key| ids.get(&key).cloned())
        })
}

/// Pick a locator by priority: identifier, role + label, short visible text,
/// `id` attribute, raw positional selector.
pub fn choose_locator(target: &TargetElement, identifier: Option<&str>) -> Locator {
    if let Some(id) = identifier.filter(|id| !id.is_empty()) {
        return Locator::TestId(id.to_string());
    }

    if let (Some(role), Some(label)) = (non_empty(&target.role), non_empty(&target.label)) {
        return Locator::Role {
            role: role.to_string(),
            name: label.to_string(),
        };
    }

    if let Some(text) = non_empty(&target.text) {
        if text.chars().count() <= MAX_TEXT_LOCATOR_LEN {
            return Locator::Text(text.to_string());
        }
    }

    if let Some(id) = target.attribute("id").map(str::trim).filter(|id| !id.is_empty()) {
        return Locator::ElementId(id.to_string());
    }

    Locator::Css(target.selector.clone())
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Single-quoted TypeScript string literal.
pub fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out.push('\'');
    out
}
