//! The shared scratch directory units are built in.
//!
//! One path is reused for every unit. Each acquisition deletes it, recreates
//! it and copies the unit's sources in, so nothing from a previous build
//! (successful or not) is visible to the next one. Units are built strictly
//! one after another, which is what makes sharing the path safe.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{BuildError, Result};
use crate::layout::{CACHE_DIRS, TOOLCHAIN_OUTPUT_DIR};

#[derive(Debug, Clone)]
pub struct BuildWorkspace {
    path: PathBuf,
}

impl BuildWorkspace {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reset the scratch directory and populate it with `source_dir`.
    ///
    /// The returned lease borrows the workspace mutably, so a second unit
    /// cannot acquire it while the first is still being built. Dropping the
    /// lease removes toolchain caches but keeps sources and output around
    /// for inspection until the next acquisition.
    pub fn acquire(&mut self, source_dir: &Path) -> Result<WorkspaceLease<'_>> {
        if self.path.exists() {
            fs::remove_dir_all(&self.path).map_err(|e| BuildError::io(&self.path, e))?;
        }
        fs::create_dir_all(&self.path).map_err(|e| BuildError::io(&self.path, e))?;
        copy_dir_recursive(source_dir, &self.path)?;
        info!(
            "Copied {} into build directory {}",
            source_dir.display(),
            self.path.display()
        );
        Ok(WorkspaceLease { dir: &self.path })
    }
}

/// Exclusive use of the scratch directory for one unit build.
#[derive(Debug)]
pub struct WorkspaceLease<'a> {
    dir: &'a Path,
}

impl WorkspaceLease<'_> {
    pub fn dir(&self) -> &Path {
        self.dir
    }

    pub fn toolchain_output_dir(&self) -> PathBuf {
        self.dir.join(TOOLCHAIN_OUTPUT_DIR)
    }

    /// Remove toolchain caches, and the toolchain output too when
    /// `clean_output` is set. Missing directories are fine.
    pub fn clean(&self, clean_output: bool) -> Result<()> {
        info!("Cleaning: {}", self.dir.display());
        for rel in CACHE_DIRS {
            remove_dir_if_present(&self.dir.join(rel))?;
        }
        if clean_output {
            remove_dir_if_present(&self.toolchain_output_dir())?;
        }
        Ok(())
    }
}

impl Drop for WorkspaceLease<'_> {
    fn drop(&mut self) {
        for rel in CACHE_DIRS {
            let _ = fs::remove_dir_all(self.dir.join(rel));
        }
    }
}

fn remove_dir_if_present(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => {
            debug!("Removed {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(BuildError::io(path, e)),
    }
}

/// Copy a directory recursively, preserving symlinks.
pub fn copy_dir_recursive(src: &Path, dst: &Path) -> Result<()> {
    fs::create_dir_all(dst).map_err(|e| BuildError::io(dst, e))?;

    for entry in fs::read_dir(src).map_err(|e| BuildError::io(src, e))? {
        let entry = entry.map_err(|e| BuildError::io(src, e))?;
        let path = entry.path();
        let dest_path = dst.join(entry.file_name());
        let file_type = entry.file_type().map_err(|e| BuildError::io(&path, e))?;

        if file_type.is_symlink() {
            let target = fs::read_link(&path).map_err(|e| BuildError::io(&path, e))?;
            if dest_path.symlink_metadata().is_ok() {
                fs::remove_file(&dest_path).map_err(|e| BuildError::io(&dest_path, e))?;
            }
            std::os::unix::fs::symlink(&target, &dest_path)
                .map_err(|e| BuildError::io(&dest_path, e))?;
        } else if file_type.is_dir() {
            copy_dir_recursive(&path, &dest_path)?;
        } else {
            fs::copy(&path, &dest_path).map_err(|e| BuildError::io(&path, e))?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn make_source(root: &Path) -> PathBuf {
        let src = root.join("adder");
        fs::create_dir_all(src.join("meta/src")).unwrap();
        fs::create_dir_all(src.join("wasm/target/release")).unwrap();
        fs::create_dir_all(src.join("output")).unwrap();
        fs::write(src.join("meta/src/main.rs"), "fn main() {}").unwrap();
        fs::write(src.join("wasm/target/release/stale.wasm"), b"old").unwrap();
        fs::write(src.join("output/stale.wasm"), b"old").unwrap();
        src
    }

    #[test]
    fn test_acquire_resets_previous_contents() {
        let tmp = TempDir::new().unwrap();
        let src = make_source(tmp.path());
        let mut ws = BuildWorkspace::new(tmp.path().join("scratch"));

        fs::create_dir_all(ws.path()).unwrap();
        fs::write(ws.path().join("leftover.txt"), "from another unit").unwrap();

        let lease = ws.acquire(&src).unwrap();
        assert!(!lease.dir().join("leftover.txt").exists());
        assert!(lease.dir().join("meta/src/main.rs").exists());
    }

    #[test]
    fn test_clean_keeps_output_when_asked() {
        let tmp = TempDir::new().unwrap();
        let src = make_source(tmp.path());
        let mut ws = BuildWorkspace::new(tmp.path().join("scratch"));
        let lease = ws.acquire(&src).unwrap();

        lease.clean(false).unwrap();
        assert!(!lease.dir().join("wasm/target").exists());
        assert!(lease.toolchain_output_dir().exists());

        lease.clean(true).unwrap();
        assert!(!lease.toolchain_output_dir().exists());
        // Idempotent.
        lease.clean(true).unwrap();
    }

    #[test]
    fn test_drop_removes_caches_only() {
        let tmp = TempDir::new().unwrap();
        let src = make_source(tmp.path());
        let mut ws = BuildWorkspace::new(tmp.path().join("scratch"));
        {
            let lease = ws.acquire(&src).unwrap();
            assert!(lease.dir().join("wasm/target").exists());
        }
        assert!(!ws.path().join("wasm/target").exists());
        assert!(ws.path().join("output/stale.wasm").exists());
    }

    #[test]
    fn test_source_is_untouched() {
        let tmp = TempDir::new().unwrap();
        let src = make_source(tmp.path());
        let mut ws = BuildWorkspace::new(tmp.path().join("scratch"));
        let lease = ws.acquire(&src).unwrap();
        lease.clean(true).unwrap();

        assert!(src.join("wasm/target/release/stale.wasm").exists());
        assert!(src.join("output/stale.wasm").exists());
    }

    #[test]
    fn test_copy_preserves_symlinks() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("real.txt"), "x").unwrap();
        std::os::unix::fs::symlink("real.txt", src.join("link.txt")).unwrap();

        let dst = tmp.path().join("dst");
        copy_dir_recursive(&src, &dst).unwrap();
        assert!(dst.join("link.txt").is_symlink());
        assert_eq!(fs::read_link(dst.join("link.txt")).unwrap(), Path::new("real.txt"));
    }
}
