//!
//! Collects every identifier already assigned across a project's documents
//! into a single [`UsedIdSet`], the shared state the fix planner mints new
//! IDs against. The set only ever grows within a planning run.

use crate::tag_scanner::{find_id_attr, recognize_block_open, recognize_caption};
use std::collections::HashSet;

/// The set of identifiers in use for one planning run.
///
/// Shared across every document planned in the run: both previously assigned
/// IDs and freshly minted ones live here, so no two entities in the run can
/// ever end up with equal IDs. Never persisted.
#[derive(Debug, Default, Clone)]
pub struct UsedIdSet {
    ids: HashSet<String>,
}

impl UsedIdSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an identifier as taken. Returns false if it was already known.
    pub fn insert(&mut self, id: impl Into<String>) -> bool {
        self.ids.insert(id.into())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Mint a fresh `<prefix>-<role>-<NNN>` identifier, probing the counter
    /// upward from 1 until an unused value is found. The minted value is
    /// reserved immediately so no later slot in the run can receive it again.
    pub fn mint(&mut self, prefix: &str, role: &str) -> String {
        let mut n = 1usize;
        loop {
            let candidate = format!("{prefix}-{role}-{n:03}");
            if !self.ids.contains(&candidate) {
                self.ids.insert(candidate.clone());
                return candidate;
            }
            n += 1;
        }
    }
}

/// Collect every ID assigned in a single document into `used`.
///
/// Collection is deliberately broad: block IDs are taken from any block kind,
/// not just the kinds eligible for fixing, and no block scoping is applied —
/// an ID appearing anywhere must still block reuse. Empty caption IDs are
/// ignored. Document order does not matter; the set carries no ownership.
pub fn collect_used_ids(text: &str, used: &mut UsedIdSet) {
    for line in text.lines() {
        if let Some(caption) = recognize_caption(line) {
            let id = line[caption.id_span.clone()].trim();
            if !id.is_empty() {
                used.insert(id);
            }
            continue;
        }
        if let Some(open) = recognize_block_open(line) {
            if let Some(attrs) = &open.attrs {
                if let Some(id) = find_id_attr(line, attrs) {
                    if !id.value.is_empty() {
                        used.insert(id.value);
                    }
                }
            }
        }
    }
}
