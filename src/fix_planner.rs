//!
//! Plans ID fixes for a single document: walks its lines, decides for every
//! ID slot whether it is empty, duplicated, or unique, and emits the text
//! edits that would resolve the first two cases. Planning never touches the
//! filesystem; applying a plan is a separate step.

use crate::id_collector::UsedIdSet;
use crate::tag_scanner::{find_id_attr, is_block_close, recognize_block_open, recognize_caption};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Block kinds eligible for ID assignment. Referenceable constructs only;
/// any other block kind is skipped even when it carries an `id=` attribute.
pub const ID_BLOCK_KINDS: &[&str] = &[
    "list", "listnum", "image", "figure", "table", "source", "cmd", "quote",
];

/// Role token used when minting IDs for caption slots, so caption-derived IDs
/// are visually distinguishable from block IDs.
pub const CAPTION_ROLE: &str = "caption";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FixReason {
    Empty,
    Duplicate,
}

impl std::fmt::Display for FixReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FixReason::Empty => write!(f, "empty"),
            FixReason::Duplicate => write!(f, "duplicate"),
        }
    }
}

/// A single planned line rewrite. Edits are single-line (`line_end` always
/// equals `line_start`) and carry both the original and rewritten line text,
/// so the applier never has to re-derive positions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FixEdit {
    pub file: PathBuf,
    /// 1-based.
    pub line_start: usize,
    pub line_end: usize,
    pub before: String,
    pub after: String,
    pub reason: FixReason,
}

/// A complete, reviewable fix plan.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FixPlan {
    pub count: usize,
    pub fixes: Vec<FixEdit>,
}

impl FixPlan {
    pub fn new(fixes: Vec<FixEdit>) -> Self {
        Self {
            count: fixes.len(),
            fixes,
        }
    }
}

fn is_id_block_kind(name: &str) -> bool {
    ID_BLOCK_KINDS.contains(&name)
}

/// Rewrite a block-opening line so it carries `id=<id>`, covering the three
/// shapes an ID-less line can take: no bracket segment at all, an empty
/// bracket segment, and a populated segment without an `id=` pair.
fn line_with_inserted_id(line: &str, open: &crate::tag_scanner::BlockOpen, id: &str) -> String {
    match &open.attrs {
        None => format!("{}[id={}]{}", &line[..open.name_end], id, &line[open.name_end..]),
        Some(attrs) => {
            let segment = &line[attrs.clone()];
            if let Some(existing) = find_id_attr(line, attrs) {
                // `id=` is present but its value is empty; fill in the value
                // portion, keeping the quoting style.
                let mut rewritten = line.to_string();
                rewritten.replace_range(existing.value_span, id);
                rewritten
            } else if segment.trim().is_empty() {
                let mut rewritten = line.to_string();
                rewritten.replace_range(attrs.clone(), &format!("id={id}"));
                rewritten
            } else {
                format!("{}, id={}{}", &line[..attrs.end], id, &line[attrs.end..])
            }
        }
    }
}

/// Plan ID fixes for one document.
///
/// `used` is shared, mutable state for the whole planning run: every ID the
/// planner discovers is inserted into it, and every minted ID is reserved in
/// it immediately, so a later slot in this or a subsequent document can never
/// receive an equal value. Pure with respect to the filesystem and
/// deterministic for a given `(text, used-at-call-time, prefix)` triple.
///
/// Lines between a block-opening line and its `//}` close are literal content
/// and produce no slots. A bracketed attribute segment that does not parse is
/// treated as carrying no ID.
pub fn plan(file: &Path, text: &str, used: &mut UsedIdSet, prefix: &str) -> Vec<FixEdit> {
    let mut fixes = Vec::new();
    let mut in_block = false;

    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;

        if in_block {
            if is_block_close(line) {
                in_block = false;
            }
            continue;
        }

        if let Some(caption) = recognize_caption(line) {
            let current = line[caption.id_span.clone()].trim().to_string();
            let decision = decide(&current, used);
            match decision {
                SlotDecision::Keep => {}
                SlotDecision::Fix(reason) => {
                    let minted = used.mint(prefix, CAPTION_ROLE);
                    let mut after = line.to_string();
                    after.replace_range(caption.id_span.clone(), &minted);
                    fixes.push(FixEdit {
                        file: file.to_path_buf(),
                        line_start: line_no,
                        line_end: line_no,
                        before: line.to_string(),
                        after,
                        reason,
                    });
                }
            }
            continue;
        }

        if let Some(open) = recognize_block_open(line) {
            in_block = true;

            let id_attr = open.attrs.as_ref().and_then(|attrs| find_id_attr(line, attrs));

            if !is_id_block_kind(&open.name) {
                // Kind-restricted planning, kind-agnostic bookkeeping: the ID
                // of an ineligible block still blocks reuse.
                if let Some(attr) = id_attr {
                    if !attr.value.is_empty() {
                        used.insert(attr.value);
                    }
                }
                continue;
            }

            match id_attr {
                Some(attr) if !attr.value.is_empty() => {
                    if used.contains(&attr.value) {
                        let minted = used.mint(prefix, &open.name);
                        let mut after = line.to_string();
                        after.replace_range(attr.value_span, &minted);
                        fixes.push(FixEdit {
                            file: file.to_path_buf(),
                            line_start: line_no,
                            line_end: line_no,
                            before: line.to_string(),
                            after,
                            reason: FixReason::Duplicate,
                        });
                    } else {
                        used.insert(attr.value);
                    }
                }
                _ => {
                    let minted = used.mint(prefix, &open.name);
                    fixes.push(FixEdit {
                        file: file.to_path_buf(),
                        line_start: line_no,
                        line_end: line_no,
                        before: line.to_string(),
                        after: line_with_inserted_id(line, &open, &minted),
                        reason: FixReason::Empty,
                    });
                }
            }
        }
    }

    fixes
}

enum SlotDecision {
    Keep,
    Fix(FixReason),
}

fn decide(current: &str, used: &mut UsedIdSet) -> SlotDecision {
    if current.is_empty() {
        SlotDecision::Fix(FixReason::Empty)
    } else if used.contains(current) {
        SlotDecision::Fix(FixReason::Duplicate)
    } else {
        used.insert(current);
        SlotDecision::Keep
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id_collector::collect_used_ids;
    use pretty_assertions::assert_eq;
    use std::path::Path;

    fn plan_text(text: &str) -> (Vec<FixEdit>, UsedIdSet) {
        let mut used = UsedIdSet::new();
        let fixes = plan(Path::new("ch01.re"), text, &mut used, "ch01");
        (fixes, used)
    }

    #[test]
    fn test_missing_bracket_synthesizes_attribute_list() {
        let (fixes, _) = plan_text("//list{\ncode\n//}\n");
        assert_eq!(fixes.len(), 1);
        assert_eq!(fixes[0].reason, FixReason::Empty);
        assert_eq!(fixes[0].before, "//list{");
        assert_eq!(fixes[0].after, "//list[id=ch01-list-001]{");
        assert_eq!(fixes[0].line_start, 1);
        assert_eq!(fixes[0].line_end, 1);
    }

    #[test]
    fn test_empty_bracket_gets_id() {
        let (fixes, _) = plan_text("//image[]{\n//}\n");
        assert_eq!(fixes[0].after, "//image[id=ch01-image-001]{");
    }

    #[test]
    fn test_populated_bracket_appends_id() {
        let (fixes, _) = plan_text("//source[lang=rust]{\nfn main() {}\n//}\n");
        assert_eq!(fixes[0].after, "//source[lang=rust, id=ch01-source-001]{");
    }

    #[test]
    fn test_empty_id_value_is_filled_in_place() {
        let (fixes, _) = plan_text("//table[id=, border=on]{\n//}\n");
        assert_eq!(fixes[0].reason, FixReason::Empty);
        assert_eq!(fixes[0].after, "//table[id=ch01-table-001, border=on]{");
    }

    #[test]
    fn test_duplicate_gets_fresh_id_first_occurrence_kept() {
        let text = "//list[id=intro]{\n//}\n//list[id=intro]{\n//}\n";
        let (fixes, used) = plan_text(text);
        assert_eq!(fixes.len(), 1);
        assert_eq!(fixes[0].line_start, 3);
        assert_eq!(fixes[0].reason, FixReason::Duplicate);
        assert_eq!(fixes[0].after, "//list[id=ch01-list-001]{");
        assert!(used.contains("intro"));
        assert!(used.contains("ch01-list-001"));
    }

    #[test]
    fn test_duplicate_preserves_quoting_style() {
        let text = "//table[id=\"intro\"]{\n//}\n//table[id=\"intro\"]{\n//}\n";
        let (fixes, _) = plan_text(text);
        assert_eq!(fixes.len(), 1);
        assert_eq!(fixes[0].after, "//table[id=\"ch01-table-001\"]{");
    }

    #[test]
    fn test_ineligible_kinds_are_skipped_but_reserve_ids() {
        let text = "//sidebar[id=aside]{\n//}\n//note{\n//}\n";
        let (fixes, used) = plan_text(text);
        // "note" is not an ID-eligible kind: no fix even though it has no ID.
        assert!(fixes.is_empty());
        assert!(used.contains("aside"));
    }

    #[test]
    fn test_mint_avoids_id_of_ineligible_block() {
        let text = "//sidebar[id=ch01-list-001]{\n//}\n//list{\n//}\n";
        let (fixes, _) = plan_text(text);
        assert_eq!(fixes[0].after, "//list[id=ch01-list-002]{");
    }

    #[test]
    fn test_block_bodies_are_literal_content() {
        // The `//list{` inside the source block body is text, not a slot.
        let text = "//source[id=outer]{\n//list{\n//}\n//quote{\n//}\n";
        let (fixes, _) = plan_text(text);
        assert_eq!(fixes.len(), 1);
        assert_eq!(fixes[0].line_start, 4);
        assert_eq!(fixes[0].after, "//quote[id=ch01-quote-001]{");
    }

    #[test]
    fn test_caption_slots_use_caption_role() {
        let text = "//figcaption[]{A figure}\n//figcaption[fig-a]{Another}\n//figcaption[fig-a]{Third}\n";
        let (fixes, used) = plan_text(text);
        assert_eq!(fixes.len(), 2);
        assert_eq!(fixes[0].reason, FixReason::Empty);
        assert_eq!(fixes[0].after, "//figcaption[ch01-caption-001]{A figure}");
        assert_eq!(fixes[1].reason, FixReason::Duplicate);
        assert_eq!(fixes[1].after, "//figcaption[ch01-caption-002]{Third}");
        assert!(used.contains("fig-a"));
    }

    #[test]
    fn test_caption_title_is_untouched() {
        let (fixes, _) = plan_text("//tablecaption[]{Results, part 2 {draft}}\n");
        assert_eq!(fixes[0].after, "//tablecaption[ch01-caption-001]{Results, part 2 {draft}}");
    }

    #[test]
    fn test_malformed_attribute_list_falls_back_to_empty() {
        // Unterminated quote: treated as "no ID present", never an error.
        let (fixes, _) = plan_text("//list[id=\"broken]{\n//}\n");
        assert_eq!(fixes.len(), 1);
        assert_eq!(fixes[0].reason, FixReason::Empty);
        assert_eq!(fixes[0].after, "//list[id=\"broken, id=ch01-list-001]{");
    }

    #[test]
    fn test_plan_is_deterministic() {
        let text = "//list{\n//}\n//figure[id=x]{\n//}\n//figure[id=x]{\n//}\n";
        let (first, _) = plan_text(text);
        let (second, _) = plan_text(text);
        assert_eq!(first, second);
    }

    #[test]
    fn test_fixed_point_after_simulated_apply() {
        let text = "//list[id=intro]{\n//}\n//list[id=intro]{\n//}\n//image{\n//}\n";
        let (fixes, _) = plan_text(text);
        assert_eq!(fixes.len(), 2);

        // Apply the edits in memory.
        let mut lines: Vec<String> = text.lines().map(|l| l.to_string()).collect();
        for fix in &fixes {
            assert_eq!(lines[fix.line_start - 1], fix.before);
            lines[fix.line_start - 1] = fix.after.clone();
        }
        let fixed = lines.join("\n");

        let (again, _) = plan_text(&fixed);
        assert!(again.is_empty(), "fixed document must plan to zero edits: {again:?}");
    }

    #[test]
    fn test_no_collision_invariant_across_documents() {
        let mut used = UsedIdSet::new();
        let a = "//list{\n//}\n//list{\n//}\n";
        let b = "//list{\n//}\n";
        let fixes_a = plan(Path::new("a.re"), a, &mut used, "ch");
        let fixes_b = plan(Path::new("b.re"), b, &mut used, "ch");

        let mut minted: Vec<String> = Vec::new();
        for fix in fixes_a.iter().chain(fixes_b.iter()) {
            let id = fix.after.split("id=").nth(1).unwrap().trim_end_matches("]{").to_string();
            assert!(!minted.contains(&id), "minted ID {id} repeated");
            minted.push(id);
        }
        assert_eq!(minted, vec!["ch-list-001", "ch-list-002", "ch-list-003"]);
    }

    #[test]
    fn test_pre_collected_ids_block_minting() {
        let mut used = UsedIdSet::new();
        collect_used_ids("//list[id=ch01-list-001]{\n//}\n", &mut used);
        let fixes = plan(Path::new("ch01.re"), "//list{\n//}\n", &mut used, "ch01");
        assert_eq!(fixes[0].after, "//list[id=ch01-list-002]{");
    }

    #[test]
    fn test_indentation_is_preserved() {
        let (fixes, _) = plan_text("  //cmd{\n//}\n");
        assert_eq!(fixes[0].after, "  //cmd[id=ch01-cmd-001]{");
    }
}
