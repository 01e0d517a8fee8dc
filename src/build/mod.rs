//! Unit builder - builds one contract unit in the shared scratch directory.
//!
//! Steps, in order:
//! 1. isolate: reset the scratch directory and copy the unit in
//! 2. pre-clean: drop toolchain caches and any stale output
//! 3. invoke the toolchain (`--locked` when a lock file is present)
//! 4. post-clean: drop toolchain caches, keep output
//! 5. extract text, imports and code hash from the binary module
//! 6. promote the lock file back into the unit's sources
//! 7. archive the scratch copy into `<unit>.tar`
//! 8. collect the six artifacts from the unit's output directory
//!
//! Any error aborts the unit; the caller decides what that means for the run.

pub mod archive;
pub mod context;
pub mod lockfile;

use std::fs;
use std::path::Path;

use tracing::info;

use crate::artifact::{self, find_file_in_folder, ArtifactKind, ArtifactSet, WasmTools};
use crate::error::{BuildError, Result};
use crate::ownership::Ownership;
use crate::scan::BuildableUnit;
use crate::timing::Timer;
use crate::toolchain::Toolchain;
use crate::workspace::{copy_dir_recursive, BuildWorkspace};

pub use archive::archive_source_code;
pub use context::BuildContext;
pub use lockfile::promote_lock_file;

/// Per-run settings the unit builder applies to every unit.
#[derive(Debug, Clone, Default)]
pub struct UnitSettings {
    pub no_wasm_opt: bool,
    pub target_dir: std::path::PathBuf,
    pub timeout: Option<std::time::Duration>,
    pub owner: Option<Ownership>,
}

pub struct UnitBuilder<'a> {
    workspace: BuildWorkspace,
    toolchain: &'a dyn Toolchain,
    tools: &'a dyn WasmTools,
    settings: UnitSettings,
}

impl<'a> UnitBuilder<'a> {
    pub fn new(
        workspace: BuildWorkspace,
        toolchain: &'a dyn Toolchain,
        tools: &'a dyn WasmTools,
        settings: UnitSettings,
    ) -> Self {
        Self {
            workspace,
            toolchain,
            tools,
            settings,
        }
    }

    /// Build `unit` into `output_dir` and return its complete artifact set.
    pub fn build(&mut self, unit: &BuildableUnit, output_dir: &Path) -> Result<ArtifactSet> {
        let timer = Timer::start(&unit.name);
        fs::create_dir_all(output_dir).map_err(|e| BuildError::io(output_dir, e))?;

        let lease = self.workspace.acquire(&unit.dir)?;
        let ctx = BuildContext::new(unit, lease.dir(), output_dir)
            .with_no_wasm_opt(self.settings.no_wasm_opt)
            .with_target_dir(&self.settings.target_dir)
            .with_timeout(self.settings.timeout);

        // Leftovers from an out-of-band local build must not be picked up.
        lease.clean(true)?;

        self.toolchain.build(&ctx.invocation())?;

        lease.clean(false)?;

        let toolchain_output = lease.toolchain_output_dir();
        let wasm = find_file_in_folder(&toolchain_output, ArtifactKind::Bytecode.pattern())?;
        artifact::extract(&wasm, self.tools)?;
        copy_dir_recursive(&toolchain_output, &ctx.output_dir)?;

        promote_lock_file(&ctx, self.settings.owner)?;

        // After the build, so the archive carries the resolved lock file and the output.
        archive_source_code(&ctx.unit_name, lease.dir(), &ctx.output_dir)?;
        drop(lease);

        let artifacts = ArtifactSet::collect(&ctx.output_dir)?;
        info!("Built unit '{}' into {}", ctx.unit_name, ctx.output_dir.display());
        timer.finish();
        Ok(artifacts)
    }
}
