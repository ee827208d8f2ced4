//!
//! Best-effort extraction of structured warnings from the external compiler's
//! free-text stderr. This is not a diagnostic grammar: only the patterns we
//! know how to attribute are modeled, everything else is ignored.

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

/// `<file>:<line>: `//' seen ...: "<detail>"` — an invalid block-start line
/// rejected by the compiler.
static INVALID_BLOCK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^(.+?):(\d+):\s*(?:error:\s*)?`//' seen[^:]*:\s*"(.*)"\s*$"#).unwrap());

/// Warning-marker symbol some compiler frontends prepend to each line.
const WARNING_MARKER: char = '\u{26a0}'; // ⚠

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A structured warning extracted from compiler output. A missing file/line
/// means the diagnostic could not be attributed precisely and fell back to
/// the document under compilation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub file: Option<String>,
    pub line: Option<usize>,
    pub severity: Severity,
    pub message: String,
}

/// Parse compiler stderr into diagnostics, line by line.
///
/// The compiler's own exit status is irrelevant here; callers hand over the
/// stderr text regardless. `fallback_file` attributes diagnostics whose
/// message does not carry a location of its own. Unrecognized lines are
/// skipped.
pub fn parse_compiler_output(stderr: &str, fallback_file: Option<&str>) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    for raw in stderr.lines() {
        let line = raw.trim_start_matches(WARNING_MARKER).trim_start();

        if let Some(caps) = INVALID_BLOCK_REGEX.captures(line) {
            let file = caps.get(1).unwrap().as_str().to_string();
            let line_no = caps.get(2).unwrap().as_str().parse::<usize>().ok();
            let detail = caps.get(3).unwrap().as_str();
            diagnostics.push(Diagnostic {
                file: Some(file),
                line: line_no,
                severity: Severity::Warning,
                message: format!("Invalid block start '//': {detail}"),
            });
            continue;
        }

        // The upstream message for this case does not reliably carry a line
        // or the offending ID, so attribution falls back to the file under
        // compilation; precise locations come from the fix planner instead.
        if line.to_lowercase().contains("warning: duplicate id:") {
            diagnostics.push(Diagnostic {
                file: fallback_file.map(|f| f.to_string()),
                line: None,
                severity: Severity::Warning,
                message: "Duplicate/empty ID detected".to_string(),
            });
        }
    }

    diagnostics
}
