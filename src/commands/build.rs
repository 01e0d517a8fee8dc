//! Build command - builds every contract unit of a project.

use anyhow::{Context, Result};

use contract_build::config::Config;
use contract_build::pipeline::{self, BuildOptions, RunReport};

/// Execute the build command.
pub fn cmd_build(options: &BuildOptions, config: &Config) -> Result<RunReport> {
    let toolchain = config.toolchain();
    let tools = config.wasm_tools();

    let report = pipeline::run(options, &toolchain, &tools)
        .with_context(|| format!("Build of {} failed", options.project.display()))?;

    println!("\nBuilt {} unit(s)", report.built.len());
    for unit in &report.built {
        println!("  {}", unit);
    }
    if !report.failures.is_empty() {
        println!("Failed {} unit(s)", report.failures.len());
        for failure in &report.failures {
            println!("  {}: {}", failure.unit, failure.error);
        }
    }
    if let Some(manifest) = &report.manifest {
        println!("Manifest: {}", manifest.display());
    }
    if let Some(ownership) = &report.ownership {
        if !ownership.is_clean() {
            println!(
                "[WARN] Ownership could not be adjusted for {} path(s)",
                ownership.failed.len()
            );
        }
    }

    Ok(report)
}
