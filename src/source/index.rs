use serde::Serialize;

use crate::source::document::{ComponentDecl, ElementId, SourceDocument};

/// One markup element as seen by the resolver and planner.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElementOccurrence {
    pub element: ElementId,
    pub tag: String,
    /// 1-based
    pub line: u32,
    /// 0-based
    pub column: u32,
    /// Value of the identifier attribute, when the element already carries one
    pub existing_id: Option<String>,
    /// True when the identifier attribute is present but not a string literal
    pub has_dynamic_id: bool,
    pub component: Option<String>,
    /// Enclosing components, outermost first
    pub component_chain: Vec<String>,
}

/// Components and element occurrences of one file, rebuilt on every parse.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ComponentIndex {
    pub components: Vec<ComponentDecl>,
    pub occurrences: Vec<ElementOccurrence>,
}

impl ComponentIndex {
    /// Walk the document once, reading identifier values from `attribute`.
    pub fn build(document: &SourceDocument, attribute: &str) -> Self {
        let occurrences = document
            .elements()
            .iter()
            .map(|node| {
                let existing_id = node.attribute_value(attribute).map(str::to_string);
                let has_dynamic_id = existing_id.is_none() && node.attribute(attribute).is_some();
                ElementOccurrence {
                    element: node.id,
                    tag: node.tag.clone(),
                    line: node.line,
                    column: node.column,
                    existing_id,
                    has_dynamic_id,
                    component: node.component.clone(),
                    component_chain: node.component_chain.clone(),
                }
            })
            .collect();

        Self {
            components: document.components().to_vec(),
            occurrences,
        }
    }

    /// Identifier values already present in the file.
    pub fn existing_ids(&self) -> impl Iterator<Item = &str> {
        self.occurrences
            .iter()
            .filter_map(|o| o.existing_id.as_deref())
    }

    /// Innermost declared component whose span contains `line`.
    pub fn component_at_line(&self, line: u32) -> Option<&ComponentDecl> {
        self.components
            .iter()
            .filter(|c| c.start_line <= line && line <= c.end_line)
            .min_by_key(|c| c.end_line - c.start_line)
    }

    pub fn is_empty(&self) -> bool {
        self.occurrences.is_empty()
    }
}
