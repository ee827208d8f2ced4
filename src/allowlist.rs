//!
//! Tag allowlist: which block and inline tag names are permitted to appear in
//! project sources. Matching is exact and case-sensitive.

use crate::tag_scanner::{TagKind, TagOccurrence};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The built-in default block tags. Deliberately conservative: it is expected
/// to under-approve tags the downstream compiler actually supports, so that
/// unsupported markup never slips through silently.
const DEFAULT_BLOCKS: &[&str] = &[
    "list", "listnum", "emlist", "emlistnum", "source", "cmd", "image", "figure", "table", "quote",
    "footnote", "note",
];

/// The built-in default inline tags. Same conservative stance as the blocks.
const DEFAULT_INLINE: &[&str] = &[
    "code", "tt", "b", "i", "em", "strong", "kw", "img", "list", "table", "fn", "chap", "chapref",
    "href", "br", "uchar",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allowlist {
    pub blocks: BTreeSet<String>,
    pub inline: BTreeSet<String>,
}

impl Default for Allowlist {
    fn default() -> Self {
        Self {
            blocks: DEFAULT_BLOCKS.iter().map(|s| s.to_string()).collect(),
            inline: DEFAULT_INLINE.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Allowlist {
    pub fn new(blocks: Vec<String>, inline: Vec<String>) -> Self {
        Self {
            blocks: blocks.into_iter().collect(),
            inline: inline.into_iter().collect(),
        }
    }

    /// Whether an occurrence names a tag absent from the allowlist. No
    /// normalization is applied.
    pub fn is_violation(&self, occurrence: &TagOccurrence) -> bool {
        match occurrence.kind {
            TagKind::Block => !self.blocks.contains(&occurrence.name),
            TagKind::Inline => !self.inline.contains(&occurrence.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn occ(kind: TagKind, name: &str) -> TagOccurrence {
        TagOccurrence {
            file: PathBuf::from("ch01.re"),
            line: 1,
            kind,
            name: name.to_string(),
            snippet: String::new(),
        }
    }

    #[test]
    fn test_default_allows_standard_tags() {
        let allow = Allowlist::default();
        assert!(!allow.is_violation(&occ(TagKind::Block, "list")));
        assert!(!allow.is_violation(&occ(TagKind::Inline, "code")));
    }

    #[test]
    fn test_default_rejects_unknown_tags() {
        let allow = Allowlist::default();
        assert!(allow.is_violation(&occ(TagKind::Block, "badtag")));
        assert!(allow.is_violation(&occ(TagKind::Inline, "madeup")));
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        let allow = Allowlist::default();
        assert!(allow.is_violation(&occ(TagKind::Block, "List")));
        assert!(allow.is_violation(&occ(TagKind::Inline, "CODE")));
    }

    #[test]
    fn test_block_and_inline_sets_are_independent() {
        // "footnote" is a default block tag but not a default inline tag.
        let allow = Allowlist::default();
        assert!(!allow.is_violation(&occ(TagKind::Block, "footnote")));
        assert!(allow.is_violation(&occ(TagKind::Inline, "footnote")));
    }

    #[test]
    fn test_explicit_empty_allowlist_flags_everything() {
        // An explicitly supplied empty allowlist never falls back to the
        // built-in default.
        let allow = Allowlist::new(vec![], vec![]);
        assert!(allow.is_violation(&occ(TagKind::Block, "list")));
        assert!(allow.is_violation(&occ(TagKind::Inline, "code")));
    }
}
