use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::naming::{NameRequest, NamingStrategy, UsedNames};
use crate::recording::interaction_model::{InteractionKind, InteractionRecord, SourceAnchor};
use crate::source::document::ElementId;
use crate::source::index::ComponentIndex;
use crate::source::resolver::resolve;

// ============================================================================
// Edit plan model
// ============================================================================

/// One planned attribute insertion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Edit {
    pub file_path: PathBuf,
    /// 1-based line of the opening tag
    pub line: u32,
    /// 0-based column of the opening tag
    pub column: u32,
    pub identifier: String,
    /// Tag expected at the position; `*` accepts any
    pub expected_tag: String,
    pub component: Option<String>,
}

/// Why an interaction or edit produced no insertion.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// Interaction carries no source anchor
    NoAnchor,
    /// Anchor did not map to any element
    Unresolved { line: u32, column: Option<u32> },
    /// Identifier is already used elsewhere in the file
    DuplicateIdentifier { identifier: String },
    /// Another interaction already planned an edit for this element
    AlreadyPlanned { identifier: String },
    /// Element already carries the attribute (value unknown when dynamic)
    PreExisting { identifier: Option<String> },
    /// Element at the position is not the expected tag
    TagMismatch { expected: String, found: String },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoAnchor => write!(f, "no source anchor"),
            SkipReason::Unresolved { line, column } => match column {
                Some(c) => write!(f, "no element near {}:{}", line, c),
                None => write!(f, "no element near line {}", line),
            },
            SkipReason::DuplicateIdentifier { identifier } => {
                write!(f, "identifier '{}' already used in file", identifier)
            }
            SkipReason::AlreadyPlanned { identifier } => {
                write!(f, "element already planned as '{}'", identifier)
            }
            SkipReason::PreExisting { identifier: Some(id) } => {
                write!(f, "element already has identifier '{}'", id)
            }
            SkipReason::PreExisting { identifier: None } => {
                write!(f, "element already has a dynamic identifier")
            }
            SkipReason::TagMismatch { expected, found } => {
                write!(f, "expected <{}> but found <{}>", expected, found)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanSkip {
    /// Index of the interaction in the processed sequence
    pub interaction: usize,
    pub selector: String,
    pub reason: SkipReason,
}

/// Edits for one file plus everything that was skipped along the way.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EditPlan {
    pub file_path: PathBuf,
    pub edits: Vec<Edit>,
    pub skips: Vec<PlanSkip>,
    /// anchor key -> identifier already present in source
    pub reused: BTreeMap<String, String>,
    /// anchor key -> identifier this plan inserts
    pub assigned: BTreeMap<String, String>,
}

impl EditPlan {
    pub fn new(file_path: &Path) -> Self {
        Self {
            file_path: file_path.to_path_buf(),
            ..Self::default()
        }
    }

    /// Identifier the generated script should use for `interaction`.
    pub fn identifier_for(&self, interaction: &InteractionRecord) -> Option<&str> {
        let key = interaction.anchor_key()?;
        self.assigned
            .get(&key)
            .or_else(|| self.reused.get(&key))
            .map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }
}

// ============================================================================
// Planner
// ============================================================================

/// Plan identifier insertions for the interactions anchored in one file.
///
/// `interactions` pairs each record with its index in the processed sequence.
/// Unresolvable interactions are recorded as skips; they never abort the plan.
pub fn plan_file(
    file_path: &Path,
    index: &ComponentIndex,
    interactions: &[(usize, &InteractionRecord)],
    strategy: NamingStrategy,
) -> EditPlan {
    let mut plan = EditPlan::new(file_path);
    let mut used = UsedNames::seeded(index.existing_ids());
    let mut planned: HashMap<ElementId, String> = HashMap::new();

    for &(position, interaction) in interactions {
        let selector = interaction.target.selector.clone();
        let skip = |reason| PlanSkip {
            interaction: position,
            selector: selector.clone(),
            reason,
        };

        let Some(anchor) = interaction.source.as_ref() else {
            plan.skips.push(skip(SkipReason::NoAnchor));
            continue;
        };

        let Some((occurrence, match_kind)) = resolve(&index.occurrences, anchor.line, anchor.column)
        else {
            plan.skips.push(skip(SkipReason::Unresolved {
                line: anchor.line,
                column: anchor.column,
            }));
            continue;
        };
        let key = anchor.key();
        debug!(
            selector = %selector,
            line = occurrence.line,
            column = occurrence.column,
            ?match_kind,
            "resolved anchor"
        );

        if let Some(existing) = &occurrence.existing_id {
            plan.reused.insert(key, existing.clone());
            continue;
        }
        if occurrence.has_dynamic_id {
            plan.skips.push(skip(SkipReason::PreExisting { identifier: None }));
            continue;
        }

        if let Some(identifier) = planned.get(&occurrence.element) {
            plan.assigned.insert(key, identifier.clone());
            plan.skips.push(skip(SkipReason::AlreadyPlanned {
                identifier: identifier.clone(),
            }));
            continue;
        }

        let identifier = match interaction.target.test_id.as_deref() {
            // The DOM already knows this element by an identifier that the
            // source does not spell out; keep it verbatim or not at all.
            Some(dom_id) => {
                if !used.insert(dom_id) {
                    plan.skips.push(skip(SkipReason::DuplicateIdentifier {
                        identifier: dom_id.to_string(),
                    }));
                    continue;
                }
                dom_id.to_string()
            }
            None => {
                let naming_anchor = enrich_anchor(
                    anchor,
                    occurrence.component.as_deref(),
                    &occurrence.component_chain,
                );
                let mut target = interaction.target.clone();
                if target.tag_name.is_empty() {
                    target.tag_name = occurrence.tag.to_lowercase();
                }
                let candidate = strategy.name(&NameRequest {
                    target: &target,
                    anchor: Some(&naming_anchor),
                    action_hint: action_hint(interaction.kind),
                    timestamp: interaction.timestamp,
                });
                used.claim(&candidate)
            }
        };

        planned.insert(occurrence.element, identifier.clone());
        plan.assigned.insert(key, identifier.clone());
        plan.edits.push(Edit {
            file_path: file_path.to_path_buf(),
            line: occurrence.line,
            column: occurrence.column,
            identifier,
            expected_tag: occurrence.tag.clone(),
            component: occurrence.component.clone(),
        });
    }

    plan
}

fn action_hint(kind: InteractionKind) -> Option<&'static str> {
    match kind {
        InteractionKind::Submit => Some("submit"),
        _ => None,
    }
}

/// Fill component context the capture layer left out from what the source says.
fn enrich_anchor(anchor: &SourceAnchor, component: Option<&str>, chain: &[String]) -> SourceAnchor {
    let mut enriched = anchor.clone();
    if enriched.component_name.is_none() {
        enriched.component_name = component.map(str::to_string);
    }
    if enriched.component_chain.is_empty() {
        enriched.component_chain = chain.to_vec();
    }
    enriched
}
