//!
//! Configuration loading for revlint. A project may carry a `.revlint.toml`
//! (or `revlint.toml`) with a global section and an optional allowlist that,
//! when present, replaces the built-in default entirely — an explicitly
//! empty allowlist really does flag everything.

use crate::allowlist::Allowlist;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;

const CONFIG_FILE_NAMES: &[&str] = &[".revlint.toml", "revlint.toml"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write config {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("config file {path} does not exist")]
    NotFound { path: PathBuf },
    #[error("config file {path} already exists")]
    AlreadyExists { path: PathBuf },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub global: GlobalConfig,
    /// When present, replaces the built-in default allowlist wholesale.
    pub allowlist: Option<AllowlistSection>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    /// Manifest path, relative to the project root.
    pub catalog: String,
    /// Fixed prefix for minted IDs; empty means the file stem is used.
    pub id_prefix: String,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            catalog: "catalog.yml".to_string(),
            id_prefix: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllowlistSection {
    pub blocks: Vec<String>,
    pub inline: Vec<String>,
}

impl Config {
    pub fn parse(text: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, path)
    }

    /// The effective allowlist: the explicit section when one was supplied,
    /// the conservative built-in default otherwise.
    pub fn allowlist(&self) -> Allowlist {
        match &self.allowlist {
            Some(section) => Allowlist::new(section.blocks.clone(), section.inline.clone()),
            None => Allowlist::default(),
        }
    }
}

/// Explicit, caller-owned configuration cache.
///
/// Construct one per run (or inject one) instead of relying on process-global
/// state: the cache records the config file's mtime and re-reads only when
/// the file changed on disk.
#[derive(Debug)]
pub struct ConfigCache {
    source: Option<PathBuf>,
    mtime: Option<SystemTime>,
    cached: Option<Config>,
}

impl ConfigCache {
    /// Cache for an explicit config path. The file must exist when first
    /// loaded.
    pub fn new(path: PathBuf) -> Self {
        Self {
            source: Some(path),
            mtime: None,
            cached: None,
        }
    }

    /// Discover a config file under `root`, falling back to defaults when
    /// none of the well-known names exists.
    pub fn discover(root: &Path, explicit: Option<&Path>) -> Self {
        if let Some(path) = explicit {
            return Self::new(path.to_path_buf());
        }
        let source = CONFIG_FILE_NAMES
            .iter()
            .map(|name| root.join(name))
            .find(|p| p.is_file());
        Self {
            source,
            mtime: None,
            cached: None,
        }
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// The current configuration, reloaded only if the file changed since
    /// the last call.
    pub fn get(&mut self) -> Result<&Config, ConfigError> {
        let Some(path) = self.source.clone() else {
            return Ok(self.cached.get_or_insert_with(Config::default));
        };

        let mtime = match fs::metadata(&path).and_then(|m| m.modified()) {
            Ok(mtime) => mtime,
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
                return Err(ConfigError::NotFound { path })
            }
            Err(source) => return Err(ConfigError::Read { path, source }),
        };

        if self.cached.is_none() || self.mtime != Some(mtime) {
            log::debug!("loading config from {}", path.display());
            self.cached = Some(Config::load(&path)?);
            self.mtime = Some(mtime);
        }
        Ok(self.cached.as_ref().unwrap())
    }
}

/// Write a default `.revlint.toml` for `revlint init`.
pub fn create_default_config(path: &Path) -> Result<(), ConfigError> {
    if path.exists() {
        return Err(ConfigError::AlreadyExists {
            path: path.to_path_buf(),
        });
    }
    let default = Allowlist::default();
    let content = format!(
        "[global]\ncatalog = \"catalog.yml\"\n# Fixed prefix for minted IDs; empty means the file stem is used.\nid_prefix = \"\"\n\n[allowlist]\nblocks = {}\ninline = {}\n",
        toml_array(default.blocks.iter()),
        toml_array(default.inline.iter()),
    );
    fs::write(path, content).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn toml_array<'a>(items: impl Iterator<Item = &'a String>) -> String {
    let quoted: Vec<String> = items.map(|s| format!("\"{s}\"")).collect();
    format!("[{}]", quoted.join(", "))
}
