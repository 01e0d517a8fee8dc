//! Disassembler and import dumper collaborators.

use std::path::Path;

use tracing::info;

use crate::error::{BuildError, Result};
use crate::process::Cmd;

/// Companion tools run against a produced binary module.
pub trait WasmTools {
    /// Write the textual form of `wasm` to `wat`.
    fn wasm2wat(&self, wasm: &Path, wat: &Path) -> Result<()>;

    /// Dump the import section of `wasm` as text.
    fn dump_imports(&self, wasm: &Path) -> Result<String>;
}

/// The WebAssembly Binary Toolkit (`wasm2wat`, `wasm-objdump`).
#[derive(Debug, Clone)]
pub struct Wabt {
    pub wasm2wat: String,
    pub wasm_objdump: String,
}

impl Default for Wabt {
    fn default() -> Self {
        Self {
            wasm2wat: "wasm2wat".to_string(),
            wasm_objdump: "wasm-objdump".to_string(),
        }
    }
}

impl WasmTools for Wabt {
    fn wasm2wat(&self, wasm: &Path, wat: &Path) -> Result<()> {
        info!("Convert WASM to WAT: {}", wasm.display());
        let result = Cmd::new(&self.wasm2wat)
            .arg_path(wasm)
            .arg("-o")
            .arg_path(wat)
            .run()?;

        if !result.success() {
            return Err(BuildError::Disassembly {
                path: wasm.to_path_buf(),
                code: result.code(),
                output: result.combined(),
            });
        }
        Ok(())
    }

    fn dump_imports(&self, wasm: &Path) -> Result<String> {
        info!("Extract imports: {}", wasm.display());
        let result = Cmd::new(&self.wasm_objdump)
            .arg_path(wasm)
            .args(["--details", "--section", "Import"])
            .run()?;

        if !result.success() {
            return Err(BuildError::ImportDump {
                path: wasm.to_path_buf(),
                code: result.code(),
                output: result.combined(),
            });
        }
        Ok(result.combined())
    }
}
