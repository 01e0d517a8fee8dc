//! Derive auxiliary artifacts from a compiled binary module.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use super::codehash::file_code_hash;
use super::imports::parse_imports_text;
use super::wabt::WasmTools;
use super::to_json_pretty;
use crate::error::{BuildError, Result};

/// Files written beside the binary module by [`extract`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedArtifacts {
    pub text: PathBuf,
    pub imports_file: PathBuf,
    pub imports: Vec<String>,
    pub codehash_file: PathBuf,
    pub codehash: String,
}

/// Produce `<stem>.wat`, `<stem>.imports.json` and `<stem>.codehash.txt`
/// next to `wasm`.
pub fn extract(wasm: &Path, tools: &dyn WasmTools) -> Result<ExtractedArtifacts> {
    let text = wasm.with_extension("wat");
    let imports_file = wasm.with_extension("imports.json");
    let codehash_file = wasm.with_extension("codehash.txt");

    tools.wasm2wat(wasm, &text)?;

    let dump = tools.dump_imports(wasm)?;
    let imports = parse_imports_text(&dump);
    let json = to_json_pretty(&imports, &imports_file.display().to_string())?;
    fs::write(&imports_file, json).map_err(|e| BuildError::io(&imports_file, e))?;

    let codehash = file_code_hash(wasm)?;
    fs::write(&codehash_file, &codehash).map_err(|e| BuildError::io(&codehash_file, e))?;
    info!("Code hash of {}: {}", wasm.display(), codehash);

    Ok(ExtractedArtifacts {
        text,
        imports_file,
        imports,
        codehash_file,
        codehash,
    })
}
