//! Scan command - lists buildable units in build order.

use anyhow::{Context, Result};
use std::path::Path;

use contract_build::scan::{discover_nonempty, ProjectSource};

pub fn cmd_scan(project: &Path) -> Result<()> {
    let source = ProjectSource::resolve(project)
        .with_context(|| format!("Failed to open project {}", project.display()))?;
    let units = discover_nonempty(source.root())?;

    for unit in &units {
        let rel = unit.dir.strip_prefix(source.root()).unwrap_or(&unit.dir);
        println!("{}\t{}", unit.name, rel.display());
    }
    println!("\n{} unit(s)", units.len());
    Ok(())
}
