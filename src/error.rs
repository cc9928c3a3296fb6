use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the interaction-to-code engine.
///
/// Almost every variant is per-item: the pipeline records it against one file,
/// interaction, or backup path and keeps going. `NoTestsGenerated` is the only
/// condition surfaced to the caller as a failed run.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Source file is not valid markup-bearing source; the whole file is skipped.
    #[error("syntax error in {}: {message}", path.display())]
    Syntax { path: PathBuf, message: String },

    /// Source file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    ReadFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Interaction could not be mapped to an element position.
    #[error("anchor unresolved for '{selector}': {reason}")]
    AnchorUnresolved { selector: String, reason: String },

    /// Planned identifier already exists in the file.
    #[error("identifier '{identifier}' already present in {}", path.display())]
    DuplicateIdentifier { path: PathBuf, identifier: String },

    /// I/O failure while writing a source file, backup, or test script.
    #[error("failed to write {}: {source}", path.display())]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File on disk no longer matches the text the preview was computed from.
    #[error("{} changed on disk since preview; refusing to overwrite", path.display())]
    StalePreview { path: PathBuf },

    /// Rollback target missing or unreadable.
    #[error("cannot restore {}: {reason}", path.display())]
    RestoreError { path: PathBuf, reason: String },

    /// Session lifecycle event not allowed in the current state.
    #[error("invalid session transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    /// Malformed session or configuration input.
    #[error("configuration error: {message}")]
    Config { message: String },

    #[error("no test files were generated")]
    NoTestsGenerated,
}

pub type EngineResult<T> = Result<T, EngineError>;
