//!
//! revlint: a validator and ID auto-fixer for Re:VIEW-style book sources.
//!
//! The library splits the work into small, independently usable pieces: tag
//! recognition ([`tag_scanner`]), the allowlist check ([`allowlist`]),
//! collection of assigned IDs ([`id_collector`]), planning of collision-free
//! ID fixes ([`fix_planner`]), applying a plan with backups
//! ([`edit_applier`]), and parsing the external compiler's stderr
//! ([`diagnostics`]). Planning is always side-effect free; only
//! [`edit_applier::apply_fixes`] mutates files.

pub mod allowlist;
pub mod catalog;
pub mod compiler;
pub mod config;
pub mod diagnostics;
pub mod edit_applier;
pub mod exit_codes;
pub mod fix_planner;
pub mod id_collector;
pub mod output;
pub mod project;
pub mod tag_scanner;

pub use allowlist::Allowlist;
pub use catalog::Catalog;
pub use diagnostics::{parse_compiler_output, Diagnostic};
pub use edit_applier::{apply_fixes, ApplyError, ApplyReport};
pub use fix_planner::{plan, FixEdit, FixPlan, FixReason};
pub use id_collector::{collect_used_ids, UsedIdSet};
pub use project::{check_files, plan_project, ScanReport};
pub use tag_scanner::{scan_tags, TagKind, TagOccurrence};
