//!
//! Loads `catalog.yml`, the project manifest enumerating document sources in
//! three ordered groups: `PREDEF`, `CHAPS` and `APPENDIX`. The rest of the
//! tool only ever sees the flattened, ordered list of paths.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse catalog {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yml::Error,
    },
}

/// A `CHAPS` entry is either a plain file name or a one-level part map
/// (`Part title: [ch01.re, ch02.re]`), flattened in document order. The
/// `Mapping` keeps key order as written, so even a malformed multi-key part
/// map flattens in the order the author listed it.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CatalogEntry {
    File(String),
    Part(serde_yml::Mapping),
}

#[derive(Debug, Default, Deserialize)]
struct RawCatalog {
    #[serde(default, rename = "PREDEF")]
    predef: Vec<String>,
    #[serde(default, rename = "CHAPS")]
    chaps: Vec<CatalogEntry>,
    #[serde(default, rename = "APPENDIX")]
    appendix: Vec<String>,
}

/// The flattened manifest: every source file, in book order.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    pub files: Vec<PathBuf>,
}

impl Catalog {
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let text = fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text).map_err(|source| CatalogError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(text: &str) -> Result<Self, serde_yml::Error> {
        let raw: RawCatalog = serde_yml::from_str(text)?;
        let mut files: Vec<PathBuf> = Vec::new();

        files.extend(raw.predef.iter().map(PathBuf::from));
        for entry in &raw.chaps {
            match entry {
                CatalogEntry::File(name) => files.push(PathBuf::from(name)),
                CatalogEntry::Part(part) => {
                    for chapters in part.values() {
                        let names: Vec<String> = serde_yml::from_value(chapters.clone())?;
                        files.extend(names.iter().map(PathBuf::from));
                    }
                }
            }
        }
        files.extend(raw.appendix.iter().map(PathBuf::from));

        Ok(Self { files })
    }
}
