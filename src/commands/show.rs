//! Show command - displays information.

use anyhow::{bail, Result};
use std::path::{Path, PathBuf};

use contract_build::artifact::ArtifactManifest;
use contract_build::config::Config;
use contract_build::layout::MANIFEST_FILE;

pub enum ShowTarget {
    /// Effective configuration
    Config,
    /// Manifest written to an output directory
    Manifest { output: PathBuf },
}

pub fn cmd_show(target: ShowTarget, config: &Config) -> Result<()> {
    match target {
        ShowTarget::Config => config.print(),
        ShowTarget::Manifest { output } => show_manifest(&output)?,
    }
    Ok(())
}

fn show_manifest(output: &Path) -> Result<()> {
    let path = output.join(MANIFEST_FILE);
    if !path.exists() {
        bail!(
            "No {} in {}. The last run failed or never happened.",
            MANIFEST_FILE,
            output.display()
        );
    }

    let manifest = ArtifactManifest::load(&path)?;
    for (unit, artifacts) in manifest.units() {
        println!("{}:", unit);
        for (kind, file) in artifacts.iter() {
            println!("  {:<9} {}", kind, file);
        }
    }

    let missing = manifest.missing_files(output);
    if !missing.is_empty() {
        for file in &missing {
            eprintln!("[WARN] Missing: {}", file.display());
        }
        bail!("{} artifact(s) referenced by the manifest are missing", missing.len());
    }
    Ok(())
}
