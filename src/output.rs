//!
//! Output formatting for scan reports, fix plans, apply results and compiler
//! diagnostics. Three formats: a colored human-readable default, a concise
//! one-line-per-finding format, and JSON for tooling.

use crate::diagnostics::Diagnostic;
use crate::edit_applier::ApplyReport;
use crate::fix_planner::FixPlan;
use crate::project::ScanReport;
use colored::Colorize;

pub trait OutputFormatter {
    fn format_violations(&self, report: &ScanReport) -> String;
    fn format_plan(&self, plan: &FixPlan) -> String;
    fn format_apply(&self, report: &ApplyReport) -> String;
    fn format_diagnostics(&self, diagnostics: &[Diagnostic]) -> String;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Concise,
    Json,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "text" | "full" => Ok(OutputFormat::Text),
            "concise" => Ok(OutputFormat::Concise),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown output format: {s}")),
        }
    }

    pub fn create_formatter(&self) -> Box<dyn OutputFormatter> {
        match self {
            OutputFormat::Text => Box::new(TextFormatter),
            OutputFormat::Concise => Box::new(ConciseFormatter),
            OutputFormat::Json => Box::new(JsonFormatter),
        }
    }
}

pub struct TextFormatter;

impl OutputFormatter for TextFormatter {
    fn format_violations(&self, report: &ScanReport) -> String {
        let mut out = String::new();
        for v in &report.violations {
            out.push_str(&format!(
                "{}:{}: unknown {} tag {}\n    {}\n",
                v.file.display(),
                v.line,
                v.kind,
                format!("'{}'", v.name).yellow(),
                v.snippet.dimmed(),
            ));
        }
        for e in &report.errors {
            out.push_str(&format!(
                "{}: {} {}\n",
                e.file.display(),
                "read error:".red(),
                e.error
            ));
        }
        if report.is_clean() {
            out.push_str(&format!("{}\n", "No tag violations found.".green()));
        } else {
            out.push_str(&format!(
                "Found {} violation(s) in total.\n",
                report.violations.len()
            ));
        }
        out
    }

    fn format_plan(&self, plan: &FixPlan) -> String {
        let mut out = String::new();
        for fix in &plan.fixes {
            out.push_str(&format!(
                "{}:{}: {} ID\n  {}\n  {}\n",
                fix.file.display(),
                fix.line_start,
                fix.reason,
                format!("- {}", fix.before).red(),
                format!("+ {}", fix.after).green(),
            ));
        }
        out.push_str(&format!("{} fix(es) planned.\n", plan.count));
        out
    }

    fn format_apply(&self, report: &ApplyReport) -> String {
        format!(
            "{} edit(s) applied to {} file(s); backups written alongside.\n",
            report.applied,
            report.files.len()
        )
    }

    fn format_diagnostics(&self, diagnostics: &[Diagnostic]) -> String {
        let mut out = String::new();
        for d in diagnostics {
            let location = match (&d.file, d.line) {
                (Some(file), Some(line)) => format!("{file}:{line}"),
                (Some(file), None) => file.clone(),
                _ => "<unknown>".to_string(),
            };
            out.push_str(&format!(
                "{location}: {}: {}\n",
                d.severity.to_string().yellow(),
                d.message
            ));
        }
        if diagnostics.is_empty() {
            out.push_str("No diagnostics.\n");
        }
        out
    }
}

pub struct ConciseFormatter;

impl OutputFormatter for ConciseFormatter {
    fn format_violations(&self, report: &ScanReport) -> String {
        let mut out = String::new();
        for v in &report.violations {
            out.push_str(&format!(
                "{}:{}: unknown {} tag '{}'\n",
                v.file.display(),
                v.line,
                v.kind,
                v.name
            ));
        }
        for e in &report.errors {
            out.push_str(&format!("{}: read error: {}\n", e.file.display(), e.error));
        }
        out
    }

    fn format_plan(&self, plan: &FixPlan) -> String {
        let mut out = String::new();
        for fix in &plan.fixes {
            out.push_str(&format!(
                "{}:{}: {}: {}\n",
                fix.file.display(),
                fix.line_start,
                fix.reason,
                fix.after
            ));
        }
        out
    }

    fn format_apply(&self, report: &ApplyReport) -> String {
        format!("applied {}\n", report.applied)
    }

    fn format_diagnostics(&self, diagnostics: &[Diagnostic]) -> String {
        let mut out = String::new();
        for d in diagnostics {
            out.push_str(&format!(
                "{}:{}: {}: {}\n",
                d.file.as_deref().unwrap_or("-"),
                d.line.map(|l| l.to_string()).unwrap_or_else(|| "-".to_string()),
                d.severity,
                d.message
            ));
        }
        out
    }
}

pub struct JsonFormatter;

impl OutputFormatter for JsonFormatter {
    fn format_violations(&self, report: &ScanReport) -> String {
        serde_json::to_string_pretty(report).unwrap_or_else(|_| "{}".to_string())
    }

    fn format_plan(&self, plan: &FixPlan) -> String {
        serde_json::to_string_pretty(plan).unwrap_or_else(|_| "{}".to_string())
    }

    fn format_apply(&self, report: &ApplyReport) -> String {
        serde_json::json!({ "applied": report.applied, "files": report.files }).to_string()
    }

    fn format_diagnostics(&self, diagnostics: &[Diagnostic]) -> String {
        serde_json::to_string_pretty(diagnostics).unwrap_or_else(|_| "[]".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Severity;
    use crate::fix_planner::{FixEdit, FixReason};
    use crate::project::ReadError;
    use crate::tag_scanner::{TagKind, TagOccurrence};
    use std::path::PathBuf;

    fn sample_report() -> ScanReport {
        ScanReport {
            violations: vec![TagOccurrence {
                file: PathBuf::from("ch01.re"),
                line: 4,
                kind: TagKind::Block,
                name: "badtag".to_string(),
                snippet: "//badtag{".to_string(),
            }],
            errors: vec![ReadError {
                file: PathBuf::from("gone.re"),
                error: "No such file or directory".to_string(),
            }],
        }
    }

    #[test]
    fn test_concise_violations() {
        let out = ConciseFormatter.format_violations(&sample_report());
        assert!(out.contains("ch01.re:4: unknown block tag 'badtag'"));
        assert!(out.contains("gone.re: read error:"));
    }

    #[test]
    fn test_json_violations_shape() {
        let out = JsonFormatter.format_violations(&sample_report());
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["violations"][0]["kind"], "block");
        assert_eq!(value["violations"][0]["line"], 4);
        assert_eq!(value["errors"][0]["file"], "gone.re");
    }

    #[test]
    fn test_json_plan_shape() {
        let plan = FixPlan::new(vec![FixEdit {
            file: PathBuf::from("ch01.re"),
            line_start: 2,
            line_end: 2,
            before: "//list{".to_string(),
            after: "//list[id=ch01-list-001]{".to_string(),
            reason: FixReason::Empty,
        }]);
        let out = JsonFormatter.format_plan(&plan);
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["count"], 1);
        assert_eq!(value["fixes"][0]["reason"], "empty");
        assert_eq!(value["fixes"][0]["line_start"], 2);
    }

    #[test]
    fn test_diagnostics_formatting_handles_missing_location() {
        let diags = vec![Diagnostic {
            file: None,
            line: None,
            severity: Severity::Warning,
            message: "Duplicate/empty ID detected".to_string(),
        }];
        let out = ConciseFormatter.format_diagnostics(&diags);
        assert_eq!(out, "-:-: warning: Duplicate/empty ID detected\n");
        let text = TextFormatter.format_diagnostics(&diags);
        assert!(text.contains("<unknown>"));
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!(OutputFormat::from_str("JSON").unwrap(), OutputFormat::Json);
        assert_eq!(OutputFormat::from_str("full").unwrap(), OutputFormat::Text);
        assert!(OutputFormat::from_str("xml").is_err());
    }
}
