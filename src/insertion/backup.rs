use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use crate::error::{EngineError, EngineResult};

/// A saved pre-modification copy of a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackupRecord {
    pub original: PathBuf,
    pub backup: PathBuf,
}

/// Outcome of restoring a list of backups. Every path is attempted.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RollbackReport {
    pub restored: Vec<PathBuf>,
    pub errors: Vec<String>,
}

impl RollbackReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Mirrors project files under a dedicated backup root.
///
/// `<project_root>/src/pages/Login.tsx` is backed up to
/// `<backup_root>/src/pages/Login.tsx`, and rollback inverts the mapping.
#[derive(Debug, Clone)]
pub struct BackupStore {
    project_root: PathBuf,
    backup_root: PathBuf,
}

impl BackupStore {
    /// A relative `backup_root` is taken relative to `project_root`; a relative
    /// `project_root` is taken relative to the working directory.
    pub fn new(project_root: &Path, backup_root: &Path) -> Self {
        let backup_root = if backup_root.is_absolute() {
            backup_root.to_path_buf()
        } else {
            project_root.join(backup_root)
        };
        Self {
            project_root: absolute_path(project_root),
            backup_root: absolute_path(&backup_root),
        }
    }

    pub fn backup_root(&self) -> &Path {
        &self.backup_root
    }

    pub fn backup_path_for(&self, original: &Path) -> Option<PathBuf> {
        relative_under(original, &self.project_root, true).map(|rel| self.backup_root.join(rel))
    }

    pub fn original_path_for(&self, backup: &Path) -> Option<PathBuf> {
        relative_under(backup, &self.backup_root, false).map(|rel| self.project_root.join(rel))
    }

    /// Copy `original` into the backup tree, creating directories as needed.
    pub fn backup(&self, original: &Path) -> EngineResult<BackupRecord> {
        let backup = self.backup_path_for(original).ok_or_else(|| EngineError::WriteFailure {
            path: original.to_path_buf(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "file is outside the project root"),
        })?;

        if let Some(parent) = backup.parent() {
            fs::create_dir_all(parent).map_err(|source| EngineError::WriteFailure {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::copy(original, &backup).map_err(|source| EngineError::WriteFailure {
            path: backup.clone(),
            source,
        })?;

        info!(original = %original.display(), backup = %backup.display(), "backed up file");
        Ok(BackupRecord {
            original: original.to_path_buf(),
            backup,
        })
    }

    /// Copy one backup over its original.
    pub fn restore(&self, backup: &Path) -> EngineResult<PathBuf> {
        let original = self
            .original_path_for(backup)
            .ok_or_else(|| EngineError::RestoreError {
                path: backup.to_path_buf(),
                reason: "not inside the backup directory".into(),
            })?;

        if !backup.is_file() {
            return Err(EngineError::RestoreError {
                path: backup.to_path_buf(),
                reason: "backup file is missing".into(),
            });
        }

        if let Some(parent) = original.parent() {
            fs::create_dir_all(parent).map_err(|e| EngineError::RestoreError {
                path: backup.to_path_buf(),
                reason: e.to_string(),
            })?;
        }
        fs::copy(backup, &original).map_err(|e| EngineError::RestoreError {
            path: backup.to_path_buf(),
            reason: e.to_string(),
        })?;

        info!(backup = %backup.display(), original = %original.display(), "restored file");
        Ok(original)
    }

    /// Restore each backup independently; partial success is allowed.
    pub fn rollback(&self, backups: &[PathBuf]) -> RollbackReport {
        let mut report = RollbackReport::default();
        for backup in backups {
            match self.restore(backup) {
                Ok(original) => report.restored.push(original),
                Err(e) => {
                    warn!(error = %e, "rollback failed");
                    report.errors.push(e.to_string());
                }
            }
        }
        report
    }
}

/// `path` relative to `root` (an absolute path), with `.` components dropped.
/// A relative `path` is first looked up from the working directory; with
/// `accept_relative`, one outside `root` is taken as already relative to it.
/// Paths escaping `root` are rejected.
fn relative_under(path: &Path, root: &Path, accept_relative: bool) -> Option<PathBuf> {
    let clean_path = strip_cur_dir(path);

    let rel = match absolute_path(&clean_path).strip_prefix(root) {
        Ok(rel) => rel.to_path_buf(),
        Err(_) if accept_relative && clean_path.is_relative() => clean_path,
        Err(_) => return None,
    };

    let escapes = rel
        .components()
        .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)));
    if escapes || rel.as_os_str().is_empty() {
        None
    } else {
        Some(rel)
    }
}

fn strip_cur_dir(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

/// Lexically absolute form of `path`; symlinks are left alone.
fn absolute_path(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    strip_cur_dir(&absolute)
}

/// SHA-1 of a file's text, used to detect changes between preview and apply.
pub fn text_fingerprint(text: &str) -> String {
    use sha1::{Digest, Sha1};

    let mut hasher = Sha1::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}
