//! Codehash command - prints the content hash of a binary module.

use anyhow::{Context, Result};
use std::path::Path;

use contract_build::artifact::file_code_hash;

pub fn cmd_codehash(wasm: &Path) -> Result<()> {
    let hash = file_code_hash(wasm)
        .with_context(|| format!("Failed to hash {}", wasm.display()))?;
    println!("{}", hash);
    Ok(())
}
