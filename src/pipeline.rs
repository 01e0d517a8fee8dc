//! Build orchestrator - drives every discovered unit through the builder.
//!
//! Units are built one at a time, in path order. Under the default
//! [`FailurePolicy::FailFast`] the first failure ends the run and no manifest
//! is written, so a manifest on disk always describes a fully successful run.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{error, info, warn};

use crate::artifact::{ArtifactManifest, WasmTools};
use crate::build::{UnitBuilder, UnitSettings};
use crate::error::{BuildError, Result};
use crate::layout::MANIFEST_FILE;
use crate::ownership::{self, Ownership, OwnershipReport};
use crate::scan::{self, ProjectSource};
use crate::timing::Timer;
use crate::toolchain::Toolchain;
use crate::workspace::BuildWorkspace;

/// What happens to the rest of the run when a unit fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Stop at the first failure; no manifest is written.
    #[default]
    FailFast,
    /// Attempt every unit; the manifest lists only the units that succeeded.
    ContinueOnFailure,
}

#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Project directory or `.tar` archive of one
    pub project: PathBuf,
    /// Root of the output tree
    pub output: PathBuf,
    /// Scratch directory shared by all unit builds
    pub build_dir: PathBuf,
    /// Toolchain target directory
    pub target_dir: PathBuf,
    pub no_wasm_opt: bool,
    pub owner: Option<Ownership>,
    pub timeout: Option<Duration>,
    pub policy: FailurePolicy,
}

impl BuildOptions {
    /// Reject layouts where resetting the scratch directory would destroy
    /// sources or output.
    pub fn validate(&self) -> Result<()> {
        if !self.project.exists() {
            return Err(BuildError::Configuration(format!(
                "project path does not exist: {}",
                self.project.display()
            )));
        }
        for (what, other) in [("project", &self.project), ("output", &self.output)] {
            if overlaps(&self.build_dir, other) {
                return Err(BuildError::Configuration(format!(
                    "build directory {} overlaps the {} path {}",
                    self.build_dir.display(),
                    what,
                    other.display()
                )));
            }
        }
        Ok(())
    }
}

fn overlaps(a: &Path, b: &Path) -> bool {
    a.starts_with(b) || b.starts_with(a)
}

#[derive(Debug)]
pub struct UnitFailure {
    pub unit: String,
    pub error: BuildError,
}

#[derive(Debug, Default)]
pub struct RunReport {
    /// Units that built successfully, in build order.
    pub built: Vec<String>,
    pub failures: Vec<UnitFailure>,
    pub manifest: Option<PathBuf>,
    pub ownership: Option<OwnershipReport>,
}

impl RunReport {
    pub fn success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Exit status of the first failure, 0 when everything built.
    pub fn exit_code(&self) -> i32 {
        self.failures
            .first()
            .map(|f| f.error.exit_code())
            .unwrap_or(0)
    }
}

/// Run the whole pipeline: discover, build each unit, persist the manifest,
/// normalize ownership.
pub fn run(
    options: &BuildOptions,
    toolchain: &dyn Toolchain,
    tools: &dyn WasmTools,
) -> Result<RunReport> {
    options.validate()?;
    let timer = Timer::start("Total build");

    let project = ProjectSource::resolve(&options.project)?;
    let units = scan::discover(project.root());
    scan::check_unique_names(&units)?;
    info!("Discovered {} unit(s) under {}", units.len(), project.root().display());

    fs::create_dir_all(&options.output).map_err(|e| BuildError::io(&options.output, e))?;

    let settings = UnitSettings {
        no_wasm_opt: options.no_wasm_opt,
        target_dir: options.target_dir.clone(),
        timeout: options.timeout,
        owner: options.owner,
    };
    let mut builder = UnitBuilder::new(
        BuildWorkspace::new(&options.build_dir),
        toolchain,
        tools,
        settings,
    );

    let mut manifest = ArtifactManifest::new();
    let mut report = RunReport::default();

    for unit in &units {
        info!("=== Building unit '{}' ({}) ===", unit.name, unit.dir.display());
        let output_dir = options.output.join(&unit.name);

        match builder.build(unit, &output_dir) {
            Ok(artifacts) => {
                manifest.record(&unit.name, artifacts);
                report.built.push(unit.name.clone());
            }
            Err(e) if options.policy == FailurePolicy::FailFast => {
                error!("Unit '{}' failed, aborting run: {}", unit.name, e);
                return Err(e);
            }
            Err(e) => {
                error!("Unit '{}' failed, continuing: {}", unit.name, e);
                report.failures.push(UnitFailure {
                    unit: unit.name.clone(),
                    error: e,
                });
            }
        }
    }

    let manifest_path = options.output.join(MANIFEST_FILE);
    manifest.persist(&manifest_path)?;
    report.manifest = Some(manifest_path);

    if !report.success() {
        warn!(
            "{} of {} unit(s) failed; the manifest lists only the units that built",
            report.failures.len(),
            units.len()
        );
    }

    if let Some(owner) = options.owner {
        report.ownership = Some(ownership::normalize(&options.output, owner));
    }

    timer.finish();
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn options(tmp: &Path) -> BuildOptions {
        fs::create_dir_all(tmp.join("project")).unwrap();
        BuildOptions {
            project: tmp.join("project"),
            output: tmp.join("output"),
            build_dir: tmp.join("scratch"),
            target_dir: tmp.join("target"),
            no_wasm_opt: false,
            owner: None,
            timeout: None,
            policy: FailurePolicy::default(),
        }
    }

    #[test]
    fn test_validate_accepts_disjoint_paths() {
        let tmp = TempDir::new().unwrap();
        options(tmp.path()).validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_build_dir_inside_project() {
        let tmp = TempDir::new().unwrap();
        let mut opts = options(tmp.path());
        opts.build_dir = opts.project.join("scratch");
        assert!(matches!(opts.validate(), Err(BuildError::Configuration(_))));
    }

    #[test]
    fn test_validate_rejects_output_as_build_dir() {
        let tmp = TempDir::new().unwrap();
        let mut opts = options(tmp.path());
        opts.build_dir = opts.output.clone();
        assert!(matches!(opts.validate(), Err(BuildError::Configuration(_))));
    }

    #[test]
    fn test_validate_rejects_missing_project() {
        let tmp = TempDir::new().unwrap();
        let mut opts = options(tmp.path());
        opts.project = tmp.path().join("absent");
        assert!(matches!(opts.validate(), Err(BuildError::Configuration(_))));
    }

    #[test]
    fn test_default_policy_is_fail_fast() {
        assert_eq!(FailurePolicy::default(), FailurePolicy::FailFast);
    }

    #[test]
    fn test_report_exit_code() {
        let mut report = RunReport::default();
        assert_eq!(report.exit_code(), 0);
        report.failures.push(UnitFailure {
            unit: "a".into(),
            error: BuildError::Toolchain {
                unit: "a".into(),
                code: 101,
            },
        });
        assert_eq!(report.exit_code(), 101);
        assert!(!report.success());
    }
}
