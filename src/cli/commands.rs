use std::path::{Path, PathBuf};

use crate::cli::config::PlanFormat;
use crate::error::EngineError;
use crate::pipeline::processor::SessionProcessor;
use crate::recording::session::Session;
use crate::report::console::{
    format_apply_report, format_plans, format_preview, format_process_report,
    format_rollback_report,
};

// ============================================================================
// plan subcommand
// ============================================================================

/// Print the edit plans for a session. Returns whether the run was error-free.
pub fn cmd_plan(
    processor: &SessionProcessor,
    session_path: &Path,
    format: PlanFormat,
) -> Result<bool, Box<dyn std::error::Error>> {
    let session = load_session(session_path)?;
    let report = processor.process(&session)?;

    match format {
        PlanFormat::Json => println!("{}", serde_json::to_string_pretty(&report.plans)?),
        PlanFormat::Console => {
            print!("{}", format_plans(&report.plans));
            for error in &report.errors {
                eprintln!("[ERROR] {}", error);
            }
        }
    }

    Ok(report.errors.is_empty())
}

// ============================================================================
// preview subcommand
// ============================================================================

pub fn cmd_preview(
    processor: &SessionProcessor,
    session_path: &Path,
) -> Result<bool, Box<dyn std::error::Error>> {
    let session = load_session(session_path)?;
    let report = processor.process(&session)?;

    print!("{}", format_preview(&report));
    Ok(report.errors.is_empty())
}

// ============================================================================
// apply subcommand
// ============================================================================

pub fn cmd_apply(
    processor: &SessionProcessor,
    session_path: &Path,
    backups_enabled: bool,
) -> Result<bool, Box<dyn std::error::Error>> {
    let session = load_session(session_path)?;
    let report = processor.process(&session)?;
    print!("{}", format_process_report(&report));

    let applied = processor.apply(&report, backups_enabled);
    print!("{}", format_apply_report(&applied));

    Ok(report.errors.is_empty() && applied.is_clean())
}

// ============================================================================
// generate subcommand
// ============================================================================

pub fn cmd_generate(
    processor: &SessionProcessor,
    session_path: &Path,
) -> Result<bool, Box<dyn std::error::Error>> {
    let session = load_session(session_path)?;
    let mut report = processor.process_tests_only(&session)?;
    // Sources stay untouched; only scripts are written.
    report.changes.clear();

    let applied = processor.apply(&report, false);
    print!("{}", format_apply_report(&applied));

    Ok(report.errors.is_empty() && applied.is_clean())
}

// ============================================================================
// rollback subcommand
// ============================================================================

pub fn cmd_rollback(
    processor: &SessionProcessor,
    backups: &[PathBuf],
) -> Result<bool, Box<dyn std::error::Error>> {
    let report = processor.rollback(backups);
    print!("{}", format_rollback_report(&report));
    Ok(report.is_clean())
}

// ============================================================================
// Helpers
// ============================================================================

/// Load a recorded session from its JSON wire format.
pub fn load_session(path: &Path) -> Result<Session, EngineError> {
    let content = std::fs::read_to_string(path).map_err(|source| EngineError::ReadFailure {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|e| EngineError::Config {
        message: format!("invalid session file {}: {}", path.display(), e),
    })
}
