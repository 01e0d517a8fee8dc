//! Shared test utilities: a fake project tree and fake collaborators.

#![allow(dead_code)]

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use contract_build::artifact::WasmTools;
use contract_build::error::{BuildError, Result};
use contract_build::pipeline::{BuildOptions, FailurePolicy};
use contract_build::toolchain::{Toolchain, ToolchainInvocation};
use tempfile::TempDir;

/// Test environment with a project, an output root and a scratch directory.
pub struct TestEnv {
    /// Temporary directory (kept alive for lifetime of TestEnv)
    pub _temp_dir: TempDir,
    pub project: PathBuf,
    pub output: PathBuf,
    pub build_dir: PathBuf,
    pub target_dir: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let base = temp_dir.path();
        let project = base.join("project");
        fs::create_dir_all(&project).expect("Failed to create project dir");

        Self {
            project,
            output: base.join("output"),
            build_dir: base.join("scratch"),
            target_dir: base.join("cargo-target"),
            _temp_dir: temp_dir,
        }
    }

    pub fn options(&self) -> BuildOptions {
        BuildOptions {
            project: self.project.clone(),
            output: self.output.clone(),
            build_dir: self.build_dir.clone(),
            target_dir: self.target_dir.clone(),
            no_wasm_opt: false,
            owner: None,
            timeout: None,
            policy: FailurePolicy::FailFast,
        }
    }

    /// Create a contract unit at `rel` under the project.
    pub fn add_unit(&self, rel: &str) -> PathBuf {
        create_mock_unit(&self.project.join(rel))
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.output.join("artifacts.json")
    }
}

/// A minimal contract directory: marker, meta crate and wasm crate.
pub fn create_mock_unit(dir: &Path) -> PathBuf {
    fs::create_dir_all(dir.join("meta/src")).expect("Failed to create meta dir");
    fs::create_dir_all(dir.join("wasm/src")).expect("Failed to create wasm dir");
    fs::create_dir_all(dir.join("src")).expect("Failed to create src dir");
    fs::write(dir.join("elrond.json"), "{\n  \"language\": \"rust\"\n}\n")
        .expect("Failed to write marker");
    fs::write(dir.join("src/lib.rs"), "#![no_std]\n").expect("Failed to write lib.rs");
    fs::write(dir.join("meta/src/main.rs"), "fn main() {}\n").expect("Failed to write meta");
    dir.to_path_buf()
}

/// Mock module bytes for a unit: a wasm header followed by the name.
pub fn module_bytes(unit: &str) -> Vec<u8> {
    let mut bytes = b"\0asm\x01\0\0\0".to_vec();
    bytes.extend_from_slice(unit.as_bytes());
    bytes
}

/// Stands in for `cargo run build`: writes what the real toolchain writes.
#[derive(Default)]
pub struct FakeToolchain {
    pub invocations: RefCell<Vec<ToolchainInvocation>>,
    /// Units whose build exits with this code.
    pub fail: Option<(String, i32)>,
    /// Units whose build "forgets" the ABI file.
    pub skip_abi: Option<String>,
    /// Contents written to a freshly generated lock file.
    pub generated_lock: String,
}

impl FakeToolchain {
    pub fn new() -> Self {
        Self {
            generated_lock: "# generated by fake toolchain\n".to_string(),
            ..Default::default()
        }
    }

    pub fn failing(unit: &str, code: i32) -> Self {
        Self {
            fail: Some((unit.to_string(), code)),
            ..Self::new()
        }
    }

    pub fn without_abi(unit: &str) -> Self {
        Self {
            skip_abi: Some(unit.to_string()),
            ..Self::new()
        }
    }

    pub fn units_built(&self) -> Vec<String> {
        self.invocations
            .borrow()
            .iter()
            .map(|i| i.unit.clone())
            .collect()
    }
}

impl Toolchain for FakeToolchain {
    fn build(&self, invocation: &ToolchainInvocation) -> Result<()> {
        self.invocations.borrow_mut().push(invocation.clone());

        if let Some((unit, code)) = &self.fail {
            if *unit == invocation.unit {
                return Err(BuildError::Toolchain {
                    unit: unit.clone(),
                    code: *code,
                });
            }
        }

        let unit_dir = invocation
            .working_dir
            .parent()
            .expect("working dir has a parent");
        let output = unit_dir.join("output");
        fs::create_dir_all(&output).map_err(|e| BuildError::io(&output, e))?;

        let name = &invocation.unit;
        let wasm = output.join(format!("{name}.wasm"));
        fs::write(&wasm, module_bytes(name)).map_err(|e| BuildError::io(&wasm, e))?;

        if self.skip_abi.as_deref() != Some(name.as_str()) {
            let abi = output.join(format!("{name}.abi.json"));
            fs::write(&abi, format!("{{\"name\": \"{name}\"}}"))
                .map_err(|e| BuildError::io(&abi, e))?;
        }

        let lock = unit_dir.join("wasm/Cargo.lock");
        if !lock.exists() {
            fs::write(&lock, &self.generated_lock).map_err(|e| BuildError::io(&lock, e))?;
        }
        Ok(())
    }
}

/// Canned wabt: writes a stub `.wat` and returns a fixed import dump.
pub struct FakeWasmTools {
    pub dump: String,
    pub fail_disassembly: bool,
}

impl Default for FakeWasmTools {
    fn default() -> Self {
        Self {
            dump: "Import[2]:\n - func[3] sig=2 <env.getGasLeft> env.getGasLeft\n - func[4] sig=1 <signalError> <- env.signalError\n".to_string(),
            fail_disassembly: false,
        }
    }
}

impl WasmTools for FakeWasmTools {
    fn wasm2wat(&self, wasm: &Path, wat: &Path) -> Result<()> {
        if self.fail_disassembly {
            return Err(BuildError::Disassembly {
                path: wasm.to_path_buf(),
                code: 2,
                output: "0000000: error: bad magic value".to_string(),
            });
        }
        fs::write(wat, "(module)\n").map_err(|e| BuildError::io(wat, e))
    }

    fn dump_imports(&self, _wasm: &Path) -> Result<String> {
        Ok(self.dump.clone())
    }
}

/// Assert that a file exists.
pub fn assert_file_exists(path: &Path) {
    assert!(path.is_file(), "Expected file at {}", path.display());
}
