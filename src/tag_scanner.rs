//!
//! Line-level recognizers for the Re:VIEW-style markup dialect: block-opening
//! lines, block-close lines, caption macros, and inline tag invocations.
//!
//! This module is deliberately not a parser. Blocks are recognized by their
//! single-line delimiters only, and inline payloads end at the first `}` —
//! nested braces are not supported and payloads containing a literal `}`
//! truncate early. That limitation lives here and nowhere else.

use regex::Regex;
use serde::Serialize;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Matches a block-opening line: `//name[attrs]{`, nothing else on the line.
/// Leading/trailing whitespace is tolerated; the attribute list is optional.
static BLOCK_OPEN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[ \t]*//([A-Za-z0-9_]+)(?:\[(.*)\])?[ \t]*\{[ \t]*$").unwrap());

/// Matches a block-close line: `//}` alone on the line.
static BLOCK_CLOSE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[ \t]*//\}[ \t]*$").unwrap());

/// Matches a caption macro: `//figcaption[id]{Title}`. The macro family is
/// recognized by name suffix; only the bracketed ID argument is ever edited.
static CAPTION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[ \t]*//([A-Za-z0-9_]*caption)\[([^\]]*)\]\{(.*)\}[ \t]*$").unwrap());

/// Matches an inline tag invocation: `@<name>{payload}`. The payload stops at
/// the first closing brace.
static INLINE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@<([A-Za-z0-9_]+)>\{([^}]*)\}").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TagKind {
    Block,
    Inline,
}

impl std::fmt::Display for TagKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TagKind::Block => write!(f, "block"),
            TagKind::Inline => write!(f, "inline"),
        }
    }
}

/// A single recognized tag, block or inline, with enough context to report it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagOccurrence {
    pub file: PathBuf,
    /// 1-based line number.
    pub line: usize,
    pub kind: TagKind,
    pub name: String,
    pub snippet: String,
}

/// A recognized block-opening line. Spans are byte ranges into the original
/// (untrimmed) line, so callers can rewrite the line without re-deriving
/// positions.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockOpen {
    pub name: String,
    /// Byte offset just past the tag name, where a missing `[...]` segment
    /// would be inserted.
    pub name_end: usize,
    /// Byte range of the attribute list contents (between the brackets),
    /// when a bracket segment is present.
    pub attrs: Option<Range<usize>>,
}

/// A recognized caption macro line.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionDecl {
    pub name: String,
    /// Byte range of the bracketed ID argument contents.
    pub id_span: Range<usize>,
}

/// A recognized inline tag invocation within a document's full text.
#[derive(Debug, Clone, PartialEq)]
pub struct InlineTag {
    pub name: String,
    pub payload: String,
    /// Byte range of the whole `@<name>{payload}` match in the input text.
    pub span: Range<usize>,
}

pub fn recognize_block_open(line: &str) -> Option<BlockOpen> {
    let caps = BLOCK_OPEN_REGEX.captures(line)?;
    let name = caps.get(1).unwrap();
    Some(BlockOpen {
        name: name.as_str().to_string(),
        name_end: name.end(),
        attrs: caps.get(2).map(|m| m.range()),
    })
}

pub fn is_block_close(line: &str) -> bool {
    BLOCK_CLOSE_REGEX.is_match(line)
}

pub fn recognize_caption(line: &str) -> Option<CaptionDecl> {
    let caps = CAPTION_REGEX.captures(line)?;
    Some(CaptionDecl {
        name: caps.get(1).unwrap().as_str().to_string(),
        id_span: caps.get(2).unwrap().range(),
    })
}

pub fn recognize_inline(text: &str) -> impl Iterator<Item = InlineTag> + '_ {
    INLINE_REGEX.captures_iter(text).map(|caps| {
        let whole = caps.get(0).unwrap();
        InlineTag {
            name: caps.get(1).unwrap().as_str().to_string(),
            payload: caps.get(2).unwrap().as_str().to_string(),
            span: whole.range(),
        }
    })
}

/// Scan a document's full text for every block and inline tag occurrence, in
/// document order. Pure function of its inputs; block-close lines are not
/// reported.
pub fn scan_tags(file: &Path, text: &str) -> Vec<TagOccurrence> {
    let mut occurrences = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        if let Some(open) = recognize_block_open(line) {
            occurrences.push(TagOccurrence {
                file: file.to_path_buf(),
                line: idx + 1,
                kind: TagKind::Block,
                name: open.name,
                snippet: line.trim().to_string(),
            });
        }
    }

    for tag in recognize_inline(text) {
        let line = text[..tag.span.start].matches('\n').count() + 1;
        occurrences.push(TagOccurrence {
            file: file.to_path_buf(),
            line,
            kind: TagKind::Inline,
            name: tag.name.clone(),
            snippet: text[tag.span.clone()].to_string(),
        });
    }

    occurrences.sort_by_key(|o| o.line);
    occurrences
}

/// The parsed `id=` attribute of a block-opening line, with the byte range of
/// the value (quotes excluded) in the original line.
#[derive(Debug, Clone, PartialEq)]
pub struct IdAttr {
    pub value: String,
    pub quoted: bool,
    pub value_span: Range<usize>,
}

/// Locate the `id=` key/value pair inside a bracketed attribute segment.
///
/// `attrs` is the byte range of the segment within `line`. Unquoted values
/// terminate at a comma or closing bracket; quoted values use double quotes.
/// A segment that does not parse (for example an unterminated quote) is
/// treated as carrying no ID at all.
pub fn find_id_attr(line: &str, attrs: &Range<usize>) -> Option<IdAttr> {
    let segment = &line[attrs.clone()];
    let mut pos = 0usize;

    loop {
        let rest = &segment[pos..];
        let key_off = rest.find("id=")?;
        let abs = pos + key_off;
        // Must be at the start of the segment or right after a separator,
        // so `kind=foo` never matches.
        let at_boundary = segment[..abs]
            .trim_end()
            .chars()
            .next_back()
            .map(|c| c == ',')
            .unwrap_or(true);
        if !at_boundary {
            pos = abs + 3;
            continue;
        }

        let value_off = abs + 3;
        let value_rest = &segment[value_off..];
        if let Some(stripped) = value_rest.strip_prefix('"') {
            // Quoted value; an unterminated quote is malformed and treated as
            // no ID present.
            let end = stripped.find('"')?;
            return Some(IdAttr {
                value: stripped[..end].to_string(),
                quoted: true,
                value_span: attrs.start + value_off + 1..attrs.start + value_off + 1 + end,
            });
        }
        let end = value_rest
            .find(|c| c == ',' || c == ']')
            .unwrap_or(value_rest.len());
        return Some(IdAttr {
            value: value_rest[..end].trim().to_string(),
            quoted: false,
            value_span: attrs.start + value_off..attrs.start + value_off + end,
        });
    }
}
