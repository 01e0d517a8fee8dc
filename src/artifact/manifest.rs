//! Artifact manifest - unit name to artifact listing.
//!
//! Written once, at the end of a run, as `artifacts.json`:
//! ```json
//! {
//!     "adder": {
//!         "bytecode": "adder.wasm",
//!         "text": "adder.wat",
//!         ...
//!     }
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use super::{to_json_pretty, ArtifactSet};
use crate::error::{BuildError, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactManifest {
    units: BTreeMap<String, ArtifactSet>,
}

impl ArtifactManifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the artifacts of a unit, replacing any previous entry.
    pub fn record(&mut self, unit: &str, artifacts: ArtifactSet) {
        self.units.insert(unit.to_string(), artifacts);
    }

    pub fn get(&self, unit: &str) -> Option<&ArtifactSet> {
        self.units.get(unit)
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn units(&self) -> impl Iterator<Item = (&str, &ArtifactSet)> {
        self.units.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Serialize with four-space indentation.
    pub fn to_json(&self) -> Result<String> {
        to_json_pretty(self, "artifact manifest")
    }

    /// Write the manifest to `path` in one step: a sibling temporary file is
    /// renamed over it, so `path` never holds a partial manifest.
    pub fn persist(&self, path: &Path) -> Result<()> {
        let json = self.to_json()?;
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));

        let mut tmp = tempfile::Builder::new()
            .prefix(".artifacts")
            .permissions(fs::Permissions::from_mode(0o644))
            .tempfile_in(dir)
            .map_err(|e| BuildError::io(dir, e))?;
        tmp.write_all(json.as_bytes())
            .map_err(|e| BuildError::io(tmp.path(), e))?;
        tmp.persist(path).map_err(|e| BuildError::io(path, e.error))?;

        info!("Wrote manifest with {} unit(s): {}", self.len(), path.display());
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| BuildError::io(path, e))?;
        serde_json::from_str(&content).map_err(|e| BuildError::Serialize {
            what: path.display().to_string(),
            source: e,
        })
    }

    /// Referenced files that do not exist under `<output_root>/<unit>/`.
    pub fn missing_files(&self, output_root: &Path) -> Vec<PathBuf> {
        self.units
            .iter()
            .flat_map(|(unit, set)| {
                set.iter()
                    .map(move |(_, name)| output_root.join(unit).join(name))
            })
            .filter(|path| !path.is_file())
            .collect()
    }
}
