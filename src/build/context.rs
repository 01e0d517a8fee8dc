//! Per-unit build context.
//!
//! Created fresh for every unit build attempt and dropped when it completes.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::layout::{BUILD_DEFINITION_DIR, LOCK_FILE, TOOLCHAIN_OUTPUT_DIR};
use crate::scan::BuildableUnit;
use crate::toolchain::ToolchainInvocation;

pub struct BuildContext {
    /// Informal name of the unit
    pub unit_name: String,
    /// Original source directory of the unit
    pub source_dir: PathBuf,
    /// Scratch copy the toolchain runs against
    pub build_dir: PathBuf,
    /// Where the unit's artifacts end up
    pub output_dir: PathBuf,
    pub no_wasm_opt: bool,
    /// Toolchain target directory
    pub target_dir: PathBuf,
    pub timeout: Option<Duration>,
}

impl BuildContext {
    pub fn new(unit: &BuildableUnit, build_dir: &Path, output_dir: &Path) -> Self {
        Self {
            unit_name: unit.name.clone(),
            source_dir: unit.dir.clone(),
            build_dir: build_dir.to_path_buf(),
            output_dir: output_dir.to_path_buf(),
            no_wasm_opt: false,
            target_dir: build_dir.join("target"),
            timeout: None,
        }
    }

    pub fn with_no_wasm_opt(mut self, no_wasm_opt: bool) -> Self {
        self.no_wasm_opt = no_wasm_opt;
        self
    }

    pub fn with_target_dir(mut self, target_dir: &Path) -> Self {
        self.target_dir = target_dir.to_path_buf();
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Lock file inside the scratch copy.
    pub fn build_lock_file(&self) -> PathBuf {
        self.build_dir.join(LOCK_FILE)
    }

    /// Lock file inside the original unit sources.
    pub fn source_lock_file(&self) -> PathBuf {
        self.source_dir.join(LOCK_FILE)
    }

    pub fn toolchain_output_dir(&self) -> PathBuf {
        self.build_dir.join(TOOLCHAIN_OUTPUT_DIR)
    }

    /// Toolchain invocation for the current state of the scratch copy.
    ///
    /// The lock flag is decided here, right before the build, from whether a
    /// lock file is present at that moment.
    pub fn invocation(&self) -> ToolchainInvocation {
        ToolchainInvocation {
            unit: self.unit_name.clone(),
            working_dir: self.build_dir.join(BUILD_DEFINITION_DIR),
            target_dir: self.target_dir.clone(),
            no_wasm_opt: self.no_wasm_opt,
            locked: self.build_lock_file().exists(),
            timeout: self.timeout,
        }
    }
}
