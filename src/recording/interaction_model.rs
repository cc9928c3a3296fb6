use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ============================================================================
// Interaction records (captured externally, consumed read-only)
// ============================================================================

/// One captured user action.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InteractionRecord {
    pub kind: InteractionKind,

    /// Capture time in milliseconds since the Unix epoch
    pub timestamp: u64,

    /// Page URL at the time of the interaction
    pub url: String,

    /// Navigation events may omit it
    #[serde(default)]
    pub target: TargetElement,

    /// Typed value for input/change events
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    /// Key name for key-press events (e.g. "Enter")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    /// Location of the element's opening tag in source, when the capture layer
    /// could resolve one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceAnchor>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum InteractionKind {
    Click,
    #[serde(alias = "dblclick")]
    DoubleClick,
    Input,
    Change,
    Submit,
    #[serde(alias = "keypress", alias = "keydown")]
    KeyPress,
    #[serde(alias = "navigate")]
    Navigation,
    Hover,
    Scroll,
    Focus,
    Blur,
    #[serde(other)]
    Other,
}

impl InteractionKind {
    /// Input and change events both carry a field's current value.
    pub fn is_value_entry(self) -> bool {
        matches!(self, InteractionKind::Input | InteractionKind::Change)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            InteractionKind::Click => "click",
            InteractionKind::DoubleClick => "double-click",
            InteractionKind::Input => "input",
            InteractionKind::Change => "change",
            InteractionKind::Submit => "submit",
            InteractionKind::KeyPress => "key-press",
            InteractionKind::Navigation => "navigation",
            InteractionKind::Hover => "hover",
            InteractionKind::Scroll => "scroll",
            InteractionKind::Focus => "focus",
            InteractionKind::Blur => "blur",
            InteractionKind::Other => "other",
        }
    }
}

/// Descriptor of the element an interaction targeted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct TargetElement {
    /// Lowercase tag name, e.g. "button"
    #[serde(default)]
    pub tag_name: String,

    /// Positional CSS-like selector, e.g. "form > input:nth-of-type(2)"
    #[serde(default)]
    pub selector: String,

    /// Identifier attribute already present in the DOM
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_id: Option<String>,

    /// Accessible label (aria-label or associated <label>)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// ARIA role, explicit or implicit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,

    /// Visible text as rendered
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Raw innerText, may include hidden descendants
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inner_text: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

impl TargetElement {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// `type` attribute, lowercased.
    pub fn input_type(&self) -> Option<String> {
        self.attribute("type").map(|t| t.trim().to_lowercase())
    }
}

/// Link from an interaction to the markup that produced its target.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SourceAnchor {
    pub file_path: String,

    /// 1-based line of the opening tag
    pub line: u32,

    /// 0-based column of the opening tag. `None` means the capture layer
    /// could not determine one.
    #[serde(default)]
    pub column: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_name: Option<String>,

    /// Enclosing component names, outermost first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub component_chain: Vec<String>,
}

impl SourceAnchor {
    /// `file:line:column`, with `*` for an unknown column. Identifies the
    /// markup position across files, unlike a DOM selector.
    pub fn key(&self) -> String {
        match self.column {
            Some(column) => format!("{}:{}:{}", self.file_path, self.line, column),
            None => format!("{}:{}:*", self.file_path, self.line),
        }
    }
}

impl InteractionRecord {
    /// Source position key, if the interaction carries a source anchor.
    pub fn anchor_key(&self) -> Option<String> {
        self.source.as_ref().map(SourceAnchor::key)
    }

    /// Anchor file path, if the interaction carries a source anchor.
    pub fn source_file(&self) -> Option<&str> {
        self.source.as_ref().map(|s| s.file_path.as_str())
    }

    /// Whether this interaction and `other` target the same element selector.
    pub fn same_target(&self, other: &InteractionRecord) -> bool {
        self.target.selector == other.target.selector
    }
}
