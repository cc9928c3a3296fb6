use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::codegen::selector::AnchorIds;
use crate::codegen::test_generator::{generate_tests, GeneratedTestFile, GeneratorConfig};
use crate::error::{EngineError, EngineResult};
use crate::insertion::backup::{text_fingerprint, BackupRecord, BackupStore, RollbackReport};
use crate::insertion::diff::unified_diff;
use crate::insertion::executor::{execute, ExecutionSkip};
use crate::insertion::planner::{plan_file, EditPlan, PlanSkip, SkipReason};
use crate::naming::NamingStrategy;
use crate::recording::consolidate::consolidate;
use crate::recording::flow_grouper::group_flows;
use crate::recording::interaction_model::{InteractionKind, InteractionRecord};
use crate::recording::session::Session;
use crate::source::document::SourceDocument;
use crate::source::index::ComponentIndex;
use crate::trace::logger::RunJournal;
use crate::trace::trace::{RunEvent, RunStage};

// ============================================================================
// Configuration
// ============================================================================

#[derive(Debug, Clone)]
pub struct ProcessConfig {
    pub strategy: NamingStrategy,
    /// Attribute carrying identifiers in markup
    pub attribute: String,
    pub project_root: PathBuf,
    pub source_dir: PathBuf,
    pub test_dir: PathBuf,
    pub backup_dir: PathBuf,
    pub base_url: String,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            strategy: NamingStrategy::default(),
            attribute: "data-testid".to_string(),
            project_root: PathBuf::from("."),
            source_dir: PathBuf::from("src"),
            test_dir: PathBuf::from("tests/e2e"),
            backup_dir: PathBuf::from(".flow-anchor/backups"),
            base_url: "http://localhost:3000".to_string(),
        }
    }
}

impl ProcessConfig {
    fn generator_config(&self) -> GeneratorConfig {
        GeneratorConfig {
            base_url: self.base_url.clone(),
            project_root: self.project_root.clone(),
            source_dir: self.source_dir.clone(),
            test_dir: self.test_dir.clone(),
        }
    }

    /// Anchors are absolute or relative to the project root.
    pub fn resolve_path(&self, file: &Path) -> PathBuf {
        if file.is_absolute() {
            file.to_path_buf()
        } else {
            self.project_root.join(file)
        }
    }

    pub fn backup_store(&self) -> BackupStore {
        BackupStore::new(&self.project_root, &self.backup_dir)
    }
}

// ============================================================================
// Reports
// ============================================================================

/// Original and modified text of one source file, ready to preview or apply.
#[derive(Debug, Clone, Serialize)]
pub struct FileChange {
    /// Path as given by the interaction anchors
    pub display_path: String,
    /// Path on disk
    pub path: PathBuf,
    pub original: String,
    pub modified: String,
    pub diff: String,
    /// SHA-1 of `original`, checked again before writing
    pub fingerprint: String,
    pub inserted: usize,
    pub skipped: Vec<ExecutionSkip>,
}

impl FileChange {
    pub fn is_modified(&self) -> bool {
        self.original != self.modified
    }
}

/// Everything one processing run produced. Nothing has been written yet.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProcessReport {
    pub session_id: String,
    pub session_name: String,
    pub plans: Vec<EditPlan>,
    pub changes: Vec<FileChange>,
    /// anchor key -> identifier used by the generated scripts
    pub identifiers: AnchorIds,
    pub tests: Vec<GeneratedTestFile>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl ProcessReport {
    pub fn total_inserted(&self) -> usize {
        self.changes.iter().map(|c| c.inserted).sum()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ApplyReport {
    /// Source files overwritten
    pub written: Vec<PathBuf>,
    pub backups: Vec<BackupRecord>,
    pub tests_written: Vec<PathBuf>,
    pub errors: Vec<String>,
}

impl ApplyReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

// ============================================================================
// Session processor
// ============================================================================

/// Turns a recorded session into source edits and test scripts.
pub struct SessionProcessor {
    config: ProcessConfig,
    journal: RunJournal,
}

impl SessionProcessor {
    pub fn new(config: ProcessConfig) -> Self {
        Self {
            config,
            journal: RunJournal::disabled(),
        }
    }

    pub fn with_journal(mut self, journal: RunJournal) -> Self {
        self.journal = journal;
        self
    }

    pub fn config(&self) -> &ProcessConfig {
        &self.config
    }

    /// Plan and execute source edits, then generate test scripts.
    ///
    /// Per-file and per-interaction problems land in `warnings`/`errors`. Fails
    /// only when no test file was generated and no error explains why.
    pub fn process(&self, session: &Session) -> EngineResult<ProcessReport> {
        self.run(session, true)
    }

    /// Generate test scripts using only identifiers already present in source.
    pub fn process_tests_only(&self, session: &Session) -> EngineResult<ProcessReport> {
        self.run(session, false)
    }

    fn run(&self, session: &Session, edit_sources: bool) -> EngineResult<ProcessReport> {
        let mut report = ProcessReport {
            session_id: session.id.clone(),
            session_name: session.name.clone(),
            ..ProcessReport::default()
        };

        if session.is_live() {
            report.warnings.push(format!(
                "session '{}' is still {}; processing a snapshot of {} interactions",
                session.name,
                session.status,
                session.interactions.len()
            ));
        }

        // Interactions appended after this point are not part of the run.
        let interactions: Vec<InteractionRecord> = session.interactions.clone();

        let (by_file, unanchored) = group_by_file(&interactions);
        for (position, interaction) in unanchored {
            report.warnings.push(
                EngineError::AnchorUnresolved {
                    selector: interaction.target.selector.clone(),
                    reason: format!("interaction {} has no source anchor", position),
                }
                .to_string(),
            );
        }

        for (file, batch) in &by_file {
            self.process_file(session, file, batch, edit_sources, &mut report);
        }

        report.identifiers = collect_identifiers(&report, edit_sources);

        let consolidated = consolidate(&interactions);
        let start_url = session
            .initial_url()
            .map(str::to_string)
            .unwrap_or_else(|| self.config.base_url.clone());
        let groups = group_flows(&start_url, &consolidated);
        debug!(
            raw = interactions.len(),
            consolidated = consolidated.len(),
            groups = groups.len(),
            "grouped interactions"
        );

        report.tests = generate_tests(
            &session.name,
            &groups,
            &report.identifiers,
            &self.config.generator_config(),
        );
        self.journal.log(
            &RunEvent::now(&session.id, RunStage::Generate).with_generated(report.tests.len()),
        );

        info!(
            session = %session.id,
            files = report.changes.len(),
            inserted = report.total_inserted(),
            tests = report.tests.len(),
            warnings = report.warnings.len(),
            errors = report.errors.len(),
            "processed session"
        );

        if report.tests.is_empty() && report.errors.is_empty() {
            self.journal.log(
                &RunEvent::now(&session.id, RunStage::Summary)
                    .with_message(EngineError::NoTestsGenerated),
            );
            return Err(EngineError::NoTestsGenerated);
        }
        Ok(report)
    }

    fn process_file(
        &self,
        session: &Session,
        file: &str,
        batch: &[(usize, &InteractionRecord)],
        edit_sources: bool,
        report: &mut ProcessReport,
    ) {
        let path = self.config.resolve_path(Path::new(file));

        let document = fs::read_to_string(&path)
            .map_err(|source| EngineError::ReadFailure {
                path: path.clone(),
                source,
            })
            .and_then(|text| SourceDocument::parse(&path, &text));
        let mut document = match document {
            Ok(doc) => doc,
            Err(e) => {
                warn!(file = %path.display(), error = %e, "skipping file");
                self.journal.log(
                    &RunEvent::now(&session.id, RunStage::Parse)
                        .with_file(&path)
                        .with_message(&e),
                );
                report.errors.push(e.to_string());
                return;
            }
        };

        let index = ComponentIndex::build(&document, &self.config.attribute);
        let plan = plan_file(Path::new(file), &index, batch, self.config.strategy);
        for skip in &plan.skips {
            if let Some(message) = plan_warning(&path, skip) {
                report.warnings.push(message);
            }
        }
        self.journal.log(
            &RunEvent::now(&session.id, RunStage::Plan)
                .with_file(&path)
                .with_counts(plan.edits.len(), plan.skips.len()),
        );

        if edit_sources {
            let outcome = execute(&mut document, &plan.edits, &self.config.attribute);
            for skip in &outcome.skipped {
                report
                    .warnings
                    .push(format!("{}: skipped '{}': {}", file, skip.edit.identifier, skip.reason));
            }
            self.journal.log(
                &RunEvent::now(&session.id, RunStage::Execute)
                    .with_file(&path)
                    .with_counts(outcome.inserted, outcome.skipped.len()),
            );
            info!(file = %path.display(), inserted = outcome.inserted, skipped = outcome.skipped.len(), "executed plan");

            let original = document.original().to_string();
            report.changes.push(FileChange {
                display_path: file.to_string(),
                path: path.clone(),
                diff: unified_diff(file, &original, &outcome.text),
                fingerprint: text_fingerprint(&original),
                original,
                modified: outcome.text,
                inserted: outcome.inserted,
                skipped: outcome.skipped,
            });
        }

        report.plans.push(plan);
    }

    /// Write the previewed changes: back up, overwrite sources, write scripts.
    ///
    /// A file that changed on disk since `report` was computed is left alone.
    pub fn apply(&self, report: &ProcessReport, backups_enabled: bool) -> ApplyReport {
        let store = self.config.backup_store();
        let mut applied = ApplyReport::default();

        for change in report.changes.iter().filter(|c| c.is_modified()) {
            match self.apply_change(&store, change, backups_enabled) {
                Ok(backup) => {
                    applied.written.push(change.path.clone());
                    applied.backups.extend(backup);
                    self.journal.log(
                        &RunEvent::now(&report.session_id, RunStage::Apply)
                            .with_file(&change.path)
                            .with_counts(change.inserted, change.skipped.len()),
                    );
                }
                Err(e) => {
                    warn!(file = %change.path.display(), error = %e, "change not applied");
                    self.journal.log(
                        &RunEvent::now(&report.session_id, RunStage::Apply)
                            .with_file(&change.path)
                            .with_message(&e),
                    );
                    applied.errors.push(e.to_string());
                }
            }
        }

        for test in &report.tests {
            let path = self.config.resolve_path(&test.path);
            match write_file(&path, &test.content) {
                Ok(()) => {
                    info!(path = %path.display(), "wrote test script");
                    applied.tests_written.push(path);
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "test script not written");
                    applied.errors.push(e.to_string());
                }
            }
        }

        applied
    }

    fn apply_change(
        &self,
        store: &BackupStore,
        change: &FileChange,
        backups_enabled: bool,
    ) -> EngineResult<Option<BackupRecord>> {
        let current = fs::read_to_string(&change.path).map_err(|source| EngineError::ReadFailure {
            path: change.path.clone(),
            source,
        })?;
        if text_fingerprint(&current) != change.fingerprint {
            return Err(EngineError::StalePreview {
                path: change.path.clone(),
            });
        }

        let backup = if backups_enabled {
            Some(store.backup(&change.path)?)
        } else {
            None
        };

        fs::write(&change.path, &change.modified).map_err(|source| EngineError::WriteFailure {
            path: change.path.clone(),
            source,
        })?;
        info!(file = %change.path.display(), inserted = change.inserted, "wrote source file");
        Ok(backup)
    }

    /// Restore each backup over its original. Every path is attempted.
    pub fn rollback(&self, backups: &[PathBuf]) -> RollbackReport {
        let report = self.config.backup_store().rollback(backups);
        self.journal.log(
            &RunEvent::now("-", RunStage::Rollback)
                .with_counts(report.restored.len(), report.errors.len()),
        );
        report
    }
}

// ============================================================================
// Helpers
// ============================================================================

type FileBatches<'a> = BTreeMap<String, Vec<(usize, &'a InteractionRecord)>>;

/// Split element interactions by anchored source file, keeping sequence
/// positions. Navigations target no element and are left out.
fn group_by_file(
    interactions: &[InteractionRecord],
) -> (FileBatches<'_>, Vec<(usize, &InteractionRecord)>) {
    let mut by_file: FileBatches<'_> = BTreeMap::new();
    let mut unanchored = Vec::new();

    for (position, interaction) in interactions.iter().enumerate() {
        if interaction.kind == InteractionKind::Navigation {
            continue;
        }
        match interaction.source_file() {
            Some(file) => by_file
                .entry(file.to_string())
                .or_default()
                .push((position, interaction)),
            None => unanchored.push((position, interaction)),
        }
    }
    (by_file, unanchored)
}

fn plan_warning(path: &Path, skip: &PlanSkip) -> Option<String> {
    let message = match &skip.reason {
        SkipReason::AlreadyPlanned { .. } => return None,
        SkipReason::NoAnchor | SkipReason::Unresolved { .. } => EngineError::AnchorUnresolved {
            selector: skip.selector.clone(),
            reason: skip.reason.to_string(),
        }
        .to_string(),
        SkipReason::DuplicateIdentifier { identifier } => EngineError::DuplicateIdentifier {
            path: path.to_path_buf(),
            identifier: identifier.clone(),
        }
        .to_string(),
        other => format!("{}: '{}' skipped: {}", path.display(), skip.selector, other),
    };
    Some(message)
}

/// Identifiers the scripts may rely on. Assigned identifiers count only when
/// their insertion actually happened in that file.
fn collect_identifiers(report: &ProcessReport, edit_sources: bool) -> AnchorIds {
    let mut ids = AnchorIds::new();
    for plan in &report.plans {
        ids.extend(plan.reused.iter().map(|(key, id)| (key.clone(), id.clone())));
        if !edit_sources {
            continue;
        }

        let rejected: BTreeSet<&str> = report
            .changes
            .iter()
            .filter(|c| Path::new(&c.display_path) == plan.file_path)
            .flat_map(|c| c.skipped.iter().map(|s| s.edit.identifier.as_str()))
            .collect();
        ids.extend(
            plan.assigned
                .iter()
                .filter(|(_, id)| !rejected.contains(id.as_str()))
                .map(|(key, id)| (key.clone(), id.clone())),
        );
    }
    ids
}

fn write_file(path: &Path, content: &str) -> EngineResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| EngineError::WriteFailure {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, content).map_err(|source| EngineError::WriteFailure {
        path: path.to_path_buf(),
        source,
    })
}
