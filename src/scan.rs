//! Project scanner - finds buildable contract units.
//!
//! A unit is any directory that directly contains the unit marker file.
//! The project may be given as a directory or as a `.tar` archive of one.

use std::collections::BTreeSet;
use std::ffi::OsStr;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use tar::Archive;
use tempfile::TempDir;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::error::{BuildError, Result};
use crate::layout::UNIT_MARKER;

/// A contract directory discovered under the project root.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct BuildableUnit {
    /// Informal name, the base name of the directory.
    pub name: String,
    pub dir: PathBuf,
}

impl BuildableUnit {
    pub fn from_dir(dir: PathBuf) -> Self {
        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| dir.display().to_string());
        Self { name, dir }
    }
}

/// Resolved project tree. Holds the extraction directory alive when the
/// project was given as an archive.
#[derive(Debug)]
pub struct ProjectSource {
    root: PathBuf,
    _extracted: Option<TempDir>,
}

impl ProjectSource {
    /// Use `path` directly, or expand it first if it is a `.tar` archive.
    pub fn resolve(path: &Path) -> Result<Self> {
        if is_archive(path) {
            let dir = extract_project_archive(path)?;
            return Ok(Self {
                root: dir.path().to_path_buf(),
                _extracted: Some(dir),
            });
        }

        if !path.is_dir() {
            return Err(BuildError::Configuration(format!(
                "project path is neither a directory nor a .tar archive: {}",
                path.display()
            )));
        }

        Ok(Self {
            root: path.to_path_buf(),
            _extracted: None,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_extracted(&self) -> bool {
        self._extracted.is_some()
    }
}

fn is_archive(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "tar")
}

/// Expand a source archive into a fresh temporary directory.
pub fn extract_project_archive(archive_path: &Path) -> Result<TempDir> {
    let archive_err = |source| BuildError::Archive {
        path: archive_path.to_path_buf(),
        source,
    };

    let dir = TempDir::new().map_err(archive_err)?;
    let file = File::open(archive_path).map_err(archive_err)?;
    let mut archive = Archive::new(BufReader::new(file));
    archive.unpack(dir.path()).map_err(archive_err)?;

    info!(
        "Extracted project archive {} to {}",
        archive_path.display(),
        dir.path().display()
    );
    Ok(dir)
}

/// Every directory under `root` holding a unit marker, sorted by path.
///
/// An empty result is not an error here, only a warning.
pub fn discover(root: &Path) -> Vec<BuildableUnit> {
    let dirs: BTreeSet<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(e) => {
                warn!("Error while scanning {}: {}", root.display(), e);
                None
            }
        })
        .filter(|e| e.file_type().is_file() && e.file_name() == OsStr::new(UNIT_MARKER))
        .filter_map(|e| e.path().parent().map(Path::to_path_buf))
        .collect();

    if dirs.is_empty() {
        warn!(
            "No buildable units ({}) found under {}; no artifacts will be produced",
            UNIT_MARKER,
            root.display()
        );
    }

    dirs.into_iter().map(BuildableUnit::from_dir).collect()
}

/// Like [`discover`], but an empty result is a [`BuildError::NoUnits`].
pub fn discover_nonempty(root: &Path) -> Result<Vec<BuildableUnit>> {
    let units = discover(root);
    if units.is_empty() {
        return Err(BuildError::NoUnits {
            root: root.to_path_buf(),
            marker: UNIT_MARKER.to_string(),
        });
    }
    Ok(units)
}

/// Two units sharing an informal name would write to the same output
/// directory and manifest entry.
pub fn check_unique_names(units: &[BuildableUnit]) -> Result<()> {
    let mut seen = BTreeSet::new();
    for unit in units {
        if !seen.insert(unit.name.as_str()) {
            let dirs: Vec<String> = units
                .iter()
                .filter(|u| u.name == unit.name)
                .map(|u| u.dir.display().to_string())
                .collect();
            return Err(BuildError::Configuration(format!(
                "several units are named '{}': {}",
                unit.name,
                dirs.join(", ")
            )));
        }
    }
    Ok(())
}
