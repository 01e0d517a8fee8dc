//! Build artifacts - the six files every contract unit produces.
//!
//! - `codehash` - BLAKE2b-256 content hash of the binary module
//! - `imports` - host function imports parsed from an import-section dump
//! - `wabt` - disassembler / import dumper collaborators
//! - `extract` - derives text, imports and hash from one binary module
//! - `manifest` - per-unit artifact listing persisted as `artifacts.json`

pub mod codehash;
pub mod extract;
pub mod imports;
pub mod manifest;
pub mod wabt;

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;
use walkdir::WalkDir;

use crate::error::{BuildError, Result};

pub use codehash::{compute_code_hash, file_code_hash};
pub use extract::{extract, ExtractedArtifacts};
pub use imports::parse_imports_text;
pub use manifest::ArtifactManifest;
pub use wabt::{Wabt, WasmTools};

/// Kind of artifact produced for a unit. Serialized as the manifest key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Bytecode,
    Text,
    Abi,
    Imports,
    Codehash,
    Src,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 6] = [
        ArtifactKind::Bytecode,
        ArtifactKind::Text,
        ArtifactKind::Abi,
        ArtifactKind::Imports,
        ArtifactKind::Codehash,
        ArtifactKind::Src,
    ];

    /// Filename pattern locating this kind inside a unit's output directory.
    pub fn pattern(self) -> &'static str {
        match self {
            ArtifactKind::Bytecode => "*.wasm",
            ArtifactKind::Text => "*.wat",
            ArtifactKind::Abi => "*.abi.json",
            ArtifactKind::Imports => "*.imports.json",
            ArtifactKind::Codehash => "*.codehash.txt",
            ArtifactKind::Src => "*.tar",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ArtifactKind::Bytecode => "bytecode",
            ArtifactKind::Text => "text",
            ArtifactKind::Abi => "abi",
            ArtifactKind::Imports => "imports",
            ArtifactKind::Codehash => "codehash",
            ArtifactKind::Src => "src",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Artifact filenames of one unit, relative to its output directory.
///
/// Only ever built complete: [`ArtifactSet::collect`] fails on the first
/// missing kind instead of returning a partial set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactSet(BTreeMap<ArtifactKind, String>);

impl ArtifactSet {
    /// Locate every artifact kind inside `output_dir`.
    pub fn collect(output_dir: &Path) -> Result<Self> {
        let mut set = BTreeMap::new();
        for kind in ArtifactKind::ALL {
            let file = find_file_in_folder(output_dir, kind.pattern())?;
            let name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            set.insert(kind, name);
        }
        Ok(Self(set))
    }

    pub fn get(&self, kind: ArtifactKind) -> Option<&str> {
        self.0.get(&kind).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ArtifactKind, &str)> {
        self.0.iter().map(|(k, v)| (*k, v.as_str()))
    }
}

/// Serialize `value` as JSON indented with four spaces, the encoding of
/// every JSON artifact.
pub fn to_json_pretty<T: Serialize + ?Sized>(value: &T, what: &str) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser).map_err(|e| BuildError::Serialize {
        what: what.to_string(),
        source: e,
    })?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Search `folder` recursively for a file whose name matches `pattern`.
///
/// Zero matches is a [`BuildError::MissingArtifact`]. Several matches are
/// sorted by path relative to `folder` and the first one wins, with a warning.
pub fn find_file_in_folder(folder: &Path, pattern: &str) -> Result<PathBuf> {
    let mut matches: Vec<PathBuf> = WalkDir::new(folder)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| wildcard_match(pattern, &entry.file_name().to_string_lossy()))
        .map(|entry| entry.into_path())
        .collect();

    if matches.is_empty() {
        return Err(BuildError::MissingArtifact {
            pattern: pattern.to_string(),
            dir: folder.to_path_buf(),
        });
    }

    matches.sort_by(|a, b| {
        let a = a.strip_prefix(folder).unwrap_or(a);
        let b = b.strip_prefix(folder).unwrap_or(b);
        a.cmp(b)
    });

    if matches.len() > 1 {
        warn!(
            pattern,
            folder = %folder.display(),
            candidates = ?matches,
            "More files match pattern, picking the first in path order"
        );
    }

    Ok(matches.swap_remove(0))
}

/// Match `name` against a pattern where `*` stands for any run of characters.
pub fn wildcard_match(pattern: &str, name: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();
    if parts.len() == 1 {
        return pattern == name;
    }

    let first = parts[0];
    let last = parts[parts.len() - 1];
    if !name.starts_with(first) || name.len() < first.len() + last.len() {
        return false;
    }
    if !name[first.len()..].ends_with(last) {
        return false;
    }

    let mut rest = &name[first.len()..name.len() - last.len()];
    for middle in &parts[1..parts.len() - 1] {
        match rest.find(middle) {
            Some(idx) => rest = &rest[idx + middle.len()..],
            None => return false,
        }
    }
    true
}
