//!
//! Thin shell around the external document compiler. We only ever care about
//! its stderr text: the exit status is recorded but never treated as an
//! error in itself, since the diagnostics extractor works on whatever the
//! process printed.

use crate::diagnostics::{parse_compiler_output, Diagnostic};
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },
}

/// How to invoke the compiler. The target file is appended as the final
/// argument.
#[derive(Debug, Clone, PartialEq)]
pub struct CompilerInvocation {
    pub command: String,
    pub args: Vec<String>,
}

impl Default for CompilerInvocation {
    fn default() -> Self {
        Self {
            command: "review-compile".to_string(),
            args: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompileOutcome {
    pub file: PathBuf,
    /// Whether the process exited with status zero. Diagnostics are parsed
    /// either way.
    pub success: bool,
    pub diagnostics: Vec<Diagnostic>,
}

/// Compile one file and parse whatever stderr it produced, attributing
/// unlocated warnings to the compiled file.
pub fn compile_file(
    invocation: &CompilerInvocation,
    root: &Path,
    file: &Path,
) -> Result<CompileOutcome, CompileError> {
    let output = Command::new(&invocation.command)
        .args(&invocation.args)
        .arg(file)
        .current_dir(root)
        .output()
        .map_err(|source| CompileError::Spawn {
            command: invocation.command.clone(),
            source,
        })?;

    let stderr = String::from_utf8_lossy(&output.stderr);
    let fallback = file.to_string_lossy();
    let diagnostics = parse_compiler_output(&stderr, Some(fallback.as_ref()));
    log::debug!(
        "{}: compiler exited {:?}, {} diagnostics",
        file.display(),
        output.status.code(),
        diagnostics.len()
    );

    Ok(CompileOutcome {
        file: file.to_path_buf(),
        success: output.status.success(),
        diagnostics,
    })
}
