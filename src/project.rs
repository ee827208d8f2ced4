//!
//! Project-level orchestration: runs the tag scan and the fix planner over
//! the catalog's (or the caller's) file list. Scanning is read-only and runs
//! per file independently; planning threads one shared [`UsedIdSet`] through
//! every document in order, so it stays sequential.

use crate::allowlist::Allowlist;
use crate::fix_planner::{plan, FixPlan};
use crate::id_collector::{collect_used_ids, UsedIdSet};
use crate::tag_scanner::{scan_tags, TagOccurrence};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// A document that could not be read. Recorded in the report instead of
/// aborting the batch: one unreadable file never stops the scan of the rest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadError {
    pub file: PathBuf,
    pub error: String,
}

/// The outcome of a tag-allowlist scan across a set of files.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScanReport {
    pub violations: Vec<TagOccurrence>,
    pub errors: Vec<ReadError>,
}

impl ScanReport {
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty() && self.errors.is_empty()
    }
}

fn scan_one(root: &Path, file: &Path, allowlist: &Allowlist) -> Result<Vec<TagOccurrence>, ReadError> {
    let text = fs::read_to_string(root.join(file)).map_err(|e| ReadError {
        file: file.to_path_buf(),
        error: e.to_string(),
    })?;
    Ok(scan_tags(file, &text)
        .into_iter()
        .filter(|occ| allowlist.is_violation(occ))
        .collect())
}

/// Scan `files` (relative to `root`) for tags absent from the allowlist.
/// Files are independent here, so the read phase fans out across them when
/// the `parallel` feature is enabled; result order follows the input order
/// either way.
pub fn check_files(root: &Path, files: &[PathBuf], allowlist: &Allowlist) -> ScanReport {
    #[cfg(feature = "parallel")]
    let results: Vec<Result<Vec<TagOccurrence>, ReadError>> = files
        .par_iter()
        .map(|file| scan_one(root, file, allowlist))
        .collect();
    #[cfg(not(feature = "parallel"))]
    let results: Vec<Result<Vec<TagOccurrence>, ReadError>> =
        files.iter().map(|file| scan_one(root, file, allowlist)).collect();

    let mut report = ScanReport::default();
    for result in results {
        match result {
            Ok(occurrences) => report.violations.extend(occurrences),
            Err(error) => report.errors.push(error),
        }
    }
    report
}

fn mint_prefix(file: &Path, fixed: Option<&str>) -> String {
    match fixed {
        Some(prefix) if !prefix.is_empty() => prefix.to_string(),
        _ => file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "doc".to_string()),
    }
}

/// Plan ID fixes for `scope`, with cross-file uniqueness against the rest of
/// the project.
///
/// `rest` names the project files outside the plan scope; their IDs are
/// collected up front so a minted ID can never collide with one assigned
/// elsewhere. Scope files are then planned in catalog order against the one
/// shared [`UsedIdSet`] — first occurrence of a value keeps it, later ones
/// are the duplicates. Planning performs no writes.
pub fn plan_project(
    root: &Path,
    scope: &[PathBuf],
    rest: &[PathBuf],
    fixed_prefix: Option<&str>,
) -> FixPlan {
    let mut used = UsedIdSet::new();

    for file in rest {
        match fs::read_to_string(root.join(file)) {
            Ok(text) => collect_used_ids(&text, &mut used),
            Err(e) => log::warn!("skipping {} during ID collection: {e}", file.display()),
        }
    }

    let mut fixes = Vec::new();
    for file in scope {
        let text = match fs::read_to_string(root.join(file)) {
            Ok(text) => text,
            Err(e) => {
                log::warn!("skipping {} during planning: {e}", file.display());
                continue;
            }
        };
        let prefix = mint_prefix(file, fixed_prefix);
        fixes.extend(plan(file, &text, &mut used, &prefix));
    }

    FixPlan::new(fixes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_check_files_reports_violations_and_read_errors() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("good.re"), "//list{\n//}\nText @<code>{x}.\n").unwrap();
        fs::write(root.join("bad.re"), "//badtag{\n//}\n@<mystery>{y}\n").unwrap();

        let files = vec![
            PathBuf::from("good.re"),
            PathBuf::from("missing.re"),
            PathBuf::from("bad.re"),
        ];
        let report = check_files(root, &files, &Allowlist::default());

        assert_eq!(report.violations.len(), 2);
        assert!(report.violations.iter().any(|v| v.name == "badtag"));
        assert!(report.violations.iter().any(|v| v.name == "mystery"));
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].file, PathBuf::from("missing.re"));
        assert!(!report.is_clean());
    }

    #[test]
    fn test_check_files_clean_project() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("ok.re"), "plain text\n").unwrap();
        let report = check_files(dir.path(), &[PathBuf::from("ok.re")], &Allowlist::default());
        assert!(report.is_clean());
    }

    #[test]
    fn test_plan_project_threads_used_ids_across_files() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("a.re"), "//list[id=intro]{\n//}\n").unwrap();
        fs::write(root.join("b.re"), "//list[id=intro]{\n//}\n").unwrap();

        let scope = vec![PathBuf::from("a.re"), PathBuf::from("b.re")];
        let plan = plan_project(root, &scope, &[], None);

        // a.re owns "intro"; b.re's copy is the duplicate.
        assert_eq!(plan.count, 1);
        assert_eq!(plan.fixes[0].file, PathBuf::from("b.re"));
        assert_eq!(plan.fixes[0].after, "//list[id=b-list-001]{");
    }

    #[test]
    fn test_plan_project_collects_ids_from_rest_of_catalog() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("other.re"), "//table[id=a-list-001]{\n//}\n").unwrap();
        fs::write(root.join("a.re"), "//list{\n//}\n").unwrap();

        let plan = plan_project(
            root,
            &[PathBuf::from("a.re")],
            &[PathBuf::from("other.re")],
            None,
        );
        // The minted ID probes past the one already taken elsewhere.
        assert_eq!(plan.fixes[0].after, "//list[id=a-list-002]{");
    }

    #[test]
    fn test_plan_project_fixed_prefix_overrides_file_stem() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("ch9.re"), "//quote{\n//}\n").unwrap();
        let plan = plan_project(root, &[PathBuf::from("ch9.re")], &[], Some("book"));
        assert_eq!(plan.fixes[0].after, "//quote[id=book-quote-001]{");
    }

    #[test]
    fn test_plan_project_skips_unreadable_files() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("a.re"), "//list{\n//}\n").unwrap();
        let scope = vec![PathBuf::from("gone.re"), PathBuf::from("a.re")];
        let plan = plan_project(root, &scope, &[], None);
        assert_eq!(plan.count, 1);
        assert_eq!(plan.fixes[0].file, PathBuf::from("a.re"));
    }
}
