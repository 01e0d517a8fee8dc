//! Compiler toolchain collaborator.
//!
//! The toolchain consumes a unit's build-definition directory and writes the
//! binary module plus companion metadata (ABI, ...) to the unit's output
//! directory. Its exit code decides the fate of the whole run.

use std::path::PathBuf;
use std::time::Duration;

use tracing::info;

use crate::error::{BuildError, Result};
use crate::process::{Cmd, Outcome};

/// Everything a toolchain needs to build one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolchainInvocation {
    pub unit: String,
    /// Working directory (the unit's build-definition subdirectory).
    pub working_dir: PathBuf,
    /// Explicit target directory, never the toolchain default.
    pub target_dir: PathBuf,
    pub no_wasm_opt: bool,
    /// Set when a lock file existed before the build.
    pub locked: bool,
    pub timeout: Option<Duration>,
}

impl ToolchainInvocation {
    /// Command-line flags, in the order they are passed.
    pub fn flags(&self) -> Vec<String> {
        let mut flags = vec![
            "--target-dir".to_string(),
            self.target_dir.to_string_lossy().into_owned(),
        ];
        if self.no_wasm_opt {
            flags.push("--no-wasm-opt".to_string());
        }
        // With a lock file present, a resolution that would change it is an error.
        if self.locked {
            flags.push("--locked".to_string());
        }
        flags
    }
}

pub trait Toolchain {
    fn build(&self, invocation: &ToolchainInvocation) -> Result<()>;
}

/// `cargo run build` in the contract's meta crate.
#[derive(Debug, Clone)]
pub struct CargoToolchain {
    pub cargo: String,
}

impl Default for CargoToolchain {
    fn default() -> Self {
        Self {
            cargo: "cargo".to_string(),
        }
    }
}

impl CargoToolchain {
    pub fn command(&self, invocation: &ToolchainInvocation) -> Cmd {
        Cmd::new(&self.cargo)
            .args(["run", "build"])
            .args(invocation.flags())
            .dir(&invocation.working_dir)
            .timeout(invocation.timeout)
    }
}

impl Toolchain for CargoToolchain {
    fn build(&self, invocation: &ToolchainInvocation) -> Result<()> {
        let cmd = self.command(invocation);
        info!("Building: {} {}", cmd.program(), cmd.get_args().join(" "));

        match cmd.run_interactive()? {
            Outcome::Exited(status) if status.success() => Ok(()),
            Outcome::Exited(status) => Err(BuildError::Toolchain {
                unit: invocation.unit.clone(),
                code: status.code().unwrap_or(-1),
            }),
            Outcome::TimedOut => Err(BuildError::ToolchainTimeout {
                unit: invocation.unit.clone(),
                timeout: invocation.timeout.unwrap_or_default(),
            }),
        }
    }
}
