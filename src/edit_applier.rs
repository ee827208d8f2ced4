//!
//! Applies a fix plan to the files it targets. Each file is handled as one
//! unit: read, snapshot to a `.bak` sibling, rewrite. The batch is not
//! transactional across files — on a mid-batch failure, files already
//! processed stay fixed and backed up, unprocessed files stay untouched, and
//! the error reports how far the batch got.

use crate::fix_planner::FixEdit;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApplyError {
    #[error("{file}: {source} ({applied} edits in earlier files were already applied)")]
    Io {
        file: PathBuf,
        source: std::io::Error,
        applied: usize,
    },
    #[error("{file}:{line}: edit targets a line outside the file ({len} lines)")]
    LineOutOfRange {
        file: PathBuf,
        line: usize,
        len: usize,
        applied: usize,
    },
    #[error("{file}:{line}: file changed since the plan was made; re-run the planner")]
    StaleLine {
        file: PathBuf,
        line: usize,
        applied: usize,
    },
}

impl ApplyError {
    /// Edits persisted to earlier files before the failure.
    pub fn applied_before_failure(&self) -> usize {
        match self {
            ApplyError::Io { applied, .. }
            | ApplyError::LineOutOfRange { applied, .. }
            | ApplyError::StaleLine { applied, .. } => *applied,
        }
    }
}

/// Result of a successful batch application.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ApplyReport {
    pub applied: usize,
    pub files: Vec<PathBuf>,
}

fn backup_path(file: &Path) -> PathBuf {
    let mut name = file.file_name().unwrap_or_default().to_os_string();
    name.push(".bak");
    file.with_file_name(name)
}

/// Apply all edits, grouped per file in first-appearance order.
///
/// For each file the current content is read once, edits are applied to the
/// in-memory line array by descending line number (edits only ever rewrite a
/// line in place, so descending order is a safety margin rather than a
/// necessity), and a verbatim backup of the pre-edit content is written to a
/// `.bak` sibling before the rewritten content is persisted.
pub fn apply_fixes(project_root: &Path, fixes: &[FixEdit]) -> Result<ApplyReport, ApplyError> {
    let mut by_file: Vec<(PathBuf, Vec<&FixEdit>)> = Vec::new();
    for fix in fixes {
        match by_file.iter_mut().find(|(f, _)| *f == fix.file) {
            Some((_, group)) => group.push(fix),
            None => by_file.push((fix.file.clone(), vec![fix])),
        }
    }

    let mut applied = 0usize;
    let mut files = Vec::new();

    for (file, mut group) in by_file {
        let path = if file.is_absolute() {
            file.clone()
        } else {
            project_root.join(&file)
        };

        let original = fs::read_to_string(&path).map_err(|source| ApplyError::Io {
            file: file.clone(),
            source,
            applied,
        })?;
        let ending = if original.contains("\r\n") { "\r\n" } else { "\n" };
        let had_trailing_newline = original.ends_with('\n');
        let mut lines: Vec<String> = original.lines().map(|l| l.to_string()).collect();

        group.sort_by(|a, b| b.line_start.cmp(&a.line_start));
        for fix in &group {
            let idx = fix
                .line_start
                .checked_sub(1)
                .filter(|i| *i < lines.len())
                .ok_or_else(|| ApplyError::LineOutOfRange {
                    file: file.clone(),
                    line: fix.line_start,
                    len: lines.len(),
                    applied,
                })?;
            if lines[idx] != fix.before {
                return Err(ApplyError::StaleLine {
                    file: file.clone(),
                    line: fix.line_start,
                    applied,
                });
            }
            lines[idx] = fix.after.clone();
        }

        let mut rewritten = lines.join(ending);
        if had_trailing_newline {
            rewritten.push_str(ending);
        }

        // The snapshot must be on disk before the rewrite is persisted.
        let backup = backup_path(&path);
        fs::write(&backup, &original).map_err(|source| ApplyError::Io {
            file: file.clone(),
            source,
            applied,
        })?;
        fs::write(&path, &rewritten).map_err(|source| ApplyError::Io {
            file: file.clone(),
            source,
            applied,
        })?;

        log::debug!("applied {} edits to {}", group.len(), file.display());
        applied += group.len();
        files.push(file);
    }

    Ok(ApplyReport { applied, files })
}
