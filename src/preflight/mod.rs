//! Preflight checks - verify collaborator tools before building.

mod types;

use std::fs;
use std::path::Path;

use anyhow::{bail, Result};
use tracing::info;

use crate::config::Config;
use crate::process;

pub use types::{CheckResult, CheckStatus, PreflightReport};

/// Check that every collaborator program resolves and the scratch
/// directory's parent is usable.
pub fn run_preflight(config: &Config) -> PreflightReport {
    info!("Running preflight checks");
    let tools = [
        (config.cargo.as_str(), "Required to build contracts"),
        (config.wasm2wat.as_str(), "Required to disassemble WASM (wabt)"),
        (config.wasm_objdump.as_str(), "Required to extract imports (wabt)"),
    ];

    let mut checks: Vec<CheckResult> = tools
        .into_iter()
        .map(|(tool, purpose)| check_tool_exists(tool, purpose))
        .collect();
    checks.push(check_build_dir(&config.build_dir));

    PreflightReport { checks }
}

/// Run preflight and bail if any checks fail.
pub fn run_preflight_or_fail(config: &Config) -> Result<()> {
    let report = run_preflight(config);
    report.print();

    if !report.all_passed() {
        bail!(
            "Preflight failed: {} check(s) failed. Fix the issues above before building.",
            report.fail_count()
        );
    }
    Ok(())
}

fn check_tool_exists(tool: &str, purpose: &str) -> CheckResult {
    match process::which(tool) {
        Some(path) => CheckResult::pass_with(tool, &path.display().to_string()),
        None => CheckResult::fail(tool, &format!("Not found in PATH. {}", purpose)),
    }
}

fn check_build_dir(build_dir: &Path) -> CheckResult {
    let name = "build directory";
    let Some(parent) = build_dir.parent() else {
        return CheckResult::fail(name, "Build directory cannot be a filesystem root");
    };
    match fs::metadata(parent) {
        Ok(meta) if meta.is_dir() && !meta.permissions().readonly() => {
            CheckResult::pass_with(name, &build_dir.display().to_string())
        }
        Ok(_) => CheckResult::warn(
            name,
            &format!("{} may not be writable", parent.display()),
        ),
        Err(e) => CheckResult::fail(name, &format!("{}: {}", parent.display(), e)),
    }
}
