use serde::Serialize;
use url::Url;

use crate::recording::interaction_model::{InteractionKind, InteractionRecord};

/// A navigation-bounded slice of a session: one logical page segment.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FlowGroup {
    /// Human-readable name, e.g. "home page" or "dashboard page"
    pub name: String,

    /// URL the group was opened at
    pub base_url: String,

    /// First source file seen among the group's interactions
    pub source_file_hint: Option<String>,

    pub interactions: Vec<InteractionRecord>,
}

impl FlowGroup {
    fn open(url: &str) -> Self {
        Self {
            name: page_name(url),
            base_url: url.to_string(),
            source_file_hint: None,
            interactions: Vec::new(),
        }
    }

    fn push(&mut self, interaction: &InteractionRecord) {
        if self.source_file_hint.is_none() {
            if let Some(file) = interaction.source_file() {
                self.source_file_hint = Some(file.to_string());
            }
        }
        self.interactions.push(interaction.clone());
    }

    pub fn is_empty(&self) -> bool {
        self.interactions.is_empty()
    }
}

/// Partition a (consolidated) interaction sequence into flow groups.
///
/// The first group opens at `start_url`. A navigation to a URL different from
/// the open group's base closes it and opens a new group, which receives the
/// navigation event as its first interaction. Empty groups are never emitted.
pub fn group_flows(start_url: &str, interactions: &[InteractionRecord]) -> Vec<FlowGroup> {
    let initial = if start_url.is_empty() {
        interactions.first().map(|i| i.url.as_str()).unwrap_or("/")
    } else {
        start_url
    };

    let mut groups = Vec::new();
    let mut current = FlowGroup::open(initial);

    for interaction in interactions {
        if interaction.kind == InteractionKind::Navigation
            && !same_page(&interaction.url, &current.base_url)
        {
            let closed = std::mem::replace(&mut current, FlowGroup::open(&interaction.url));
            if !closed.is_empty() {
                groups.push(closed);
            }
        }
        current.push(interaction);
    }

    if !current.is_empty() {
        groups.push(current);
    }

    groups
}

/// Group name derived from a URL path: "/" is the home page.
pub fn page_name(url: &str) -> String {
    let path = url_path(url);
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        "home page".to_string()
    } else {
        format!("{} page", trimmed)
    }
}

/// Path component of an absolute or path-only URL.
pub fn url_path(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => {
            let without_query = url.split(['?', '#']).next().unwrap_or("");
            if without_query.is_empty() {
                "/".to_string()
            } else {
                without_query.to_string()
            }
        }
    }
}

fn same_page(a: &str, b: &str) -> bool {
    a.trim_end_matches('/') == b.trim_end_matches('/')
}
