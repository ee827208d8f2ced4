/// Exit codes for revlint.
///
/// They let CI distinguish "the sources have findings" from "the tool itself
/// failed".
/// Success - no violations, nothing left to fix
pub const SUCCESS: i32 = 0;

/// Findings - tag violations, pending fixes, or compiler diagnostics
pub const VIOLATIONS_FOUND: i32 = 1;

/// Tool error - configuration, catalog, or I/O failure
pub const TOOL_ERROR: i32 = 2;
