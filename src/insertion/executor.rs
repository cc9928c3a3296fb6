use serde::Serialize;
use tracing::{debug, warn};

use crate::insertion::planner::{Edit, SkipReason};
use crate::naming::UsedNames;
use crate::source::document::SourceDocument;

/// An edit the executor declined to apply.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionSkip {
    pub edit: Edit,
    pub reason: SkipReason,
}

/// Result of applying an edit plan to one document.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionOutcome {
    /// Printed document after all applied insertions
    pub text: String,
    pub inserted: usize,
    pub skipped: Vec<ExecutionSkip>,
}

/// Apply `edits` to `document`, inserting `attribute="<identifier>"` on each
/// targeted opening tag.
///
/// Edits run in descending (line, column) order. Each edit fails on its own;
/// one unresolved edit never stops the batch.
pub fn execute(document: &mut SourceDocument, edits: &[Edit], attribute: &str) -> ExecutionOutcome {
    let mut taken = UsedNames::seeded(
        document
            .elements()
            .iter()
            .filter_map(|e| e.attribute_value(attribute)),
    );

    let mut ordered: Vec<&Edit> = edits.iter().collect();
    ordered.sort_by(|a, b| b.line.cmp(&a.line).then(b.column.cmp(&a.column)));

    let mut inserted = 0;
    let mut skipped = Vec::new();

    for edit in ordered {
        match apply_one(document, edit, attribute, &taken) {
            Ok(()) => {
                taken.insert(&edit.identifier);
                inserted += 1;
                debug!(
                    identifier = %edit.identifier,
                    line = edit.line,
                    column = edit.column,
                    "inserted identifier"
                );
            }
            Err(reason) => {
                warn!(
                    file = %edit.file_path.display(),
                    identifier = %edit.identifier,
                    %reason,
                    "skipped edit"
                );
                skipped.push(ExecutionSkip {
                    edit: edit.clone(),
                    reason,
                });
            }
        }
    }

    ExecutionOutcome {
        text: document.print(),
        inserted,
        skipped,
    }
}

fn apply_one(
    document: &mut SourceDocument,
    edit: &Edit,
    attribute: &str,
    taken: &UsedNames,
) -> Result<(), SkipReason> {
    let node = document
        .element_at(edit.line, edit.column)
        .ok_or(SkipReason::Unresolved {
            line: edit.line,
            column: Some(edit.column),
        })?;

    if edit.expected_tag != "*" && node.tag != edit.expected_tag {
        return Err(SkipReason::TagMismatch {
            expected: edit.expected_tag.clone(),
            found: node.tag.clone(),
        });
    }

    if node.attribute(attribute).is_some() {
        return Err(SkipReason::PreExisting {
            identifier: node.attribute_value(attribute).map(str::to_string),
        });
    }

    if taken.contains(&edit.identifier) {
        return Err(SkipReason::DuplicateIdentifier {
            identifier: edit.identifier.clone(),
        });
    }

    let id = node.id;
    document
        .insert_attribute(id, attribute, &edit.identifier)
        .map(|_| ())
        .ok_or(SkipReason::Unresolved {
            line: edit.line,
            column: Some(edit.column),
        })
}
