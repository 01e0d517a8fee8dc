//! Hand produced files back to the invoking host identity.
//!
//! Builds run as an isolated (often root) identity. Ownership adjustment is
//! a soft step: failures are logged and counted, never fatal.

use std::os::unix::fs::{chown, lchown};
use std::path::{Path, PathBuf};

use tracing::{info, warn};
use walkdir::WalkDir;

/// Target owner and group for produced output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ownership {
    pub uid: u32,
    pub gid: u32,
}

impl Ownership {
    pub fn new(uid: u32, gid: u32) -> Self {
        Self { uid, gid }
    }

    /// Apply to a single path without following symlinks.
    pub fn apply(&self, path: &Path) -> std::io::Result<()> {
        if path.is_symlink() {
            lchown(path, Some(self.uid), Some(self.gid))
        } else {
            chown(path, Some(self.uid), Some(self.gid))
        }
    }
}

/// What [`normalize`] managed to do.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OwnershipReport {
    pub adjusted: usize,
    pub failed: Vec<PathBuf>,
}

impl OwnershipReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Recursively reassign every directory and file below `root`.
///
/// `root` itself is left alone; it belongs to whoever created it on the host.
pub fn normalize(root: &Path, owner: Ownership) -> OwnershipReport {
    info!(
        "Adjust ownership of output directory: directory = {}, owner = {}, group = {}",
        root.display(),
        owner.uid,
        owner.gid
    );

    let mut report = OwnershipReport::default();
    for entry in WalkDir::new(root).min_depth(1) {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!("Cannot walk {}: {}", root.display(), e);
                report
                    .failed
                    .push(e.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf()));
                continue;
            }
        };

        match owner.apply(entry.path()) {
            Ok(()) => report.adjusted += 1,
            Err(e) => {
                warn!("Failed to adjust ownership of {}: {}", entry.path().display(), e);
                report.failed.push(entry.path().to_path_buf());
            }
        }
    }

    if !report.is_clean() {
        warn!(
            "Ownership adjustment failed for {} path(s); build output is otherwise complete",
            report.failed.len()
        );
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::MetadataExt;
    use tempfile::TempDir;

    fn current_owner(path: &Path) -> Ownership {
        let meta = fs::metadata(path).unwrap();
        Ownership::new(meta.uid(), meta.gid())
    }

    #[test]
    fn test_normalize_to_self_adjusts_everything() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("adder/output")).unwrap();
        fs::write(tmp.path().join("adder/adder.wasm"), b"").unwrap();
        fs::write(tmp.path().join("artifacts.json"), b"{}").unwrap();

        let owner = current_owner(tmp.path());
        let report = normalize(tmp.path(), owner);

        assert!(report.is_clean());
        // adder/, adder/output/, adder/adder.wasm, artifacts.json
        assert_eq!(report.adjusted, 4);
        assert_eq!(current_owner(&tmp.path().join("adder/adder.wasm")), owner);
    }

    #[test]
    fn test_missing_root_is_soft() {
        let tmp = TempDir::new().unwrap();
        let report = normalize(&tmp.path().join("absent"), current_owner(tmp.path()));
        assert_eq!(report.adjusted, 0);
        assert!(!report.is_clean());
    }

    #[test]
    fn test_dangling_symlink_is_not_followed() {
        let tmp = TempDir::new().unwrap();
        std::os::unix::fs::symlink("nowhere", tmp.path().join("dangling")).unwrap();
        let report = normalize(tmp.path(), current_owner(tmp.path()));
        assert!(report.is_clean());
        assert_eq!(report.adjusted, 1);
    }
}
