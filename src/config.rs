//! Configuration management for contract-build.
//!
//! Reads configuration from a .env file and environment variables.
//! Environment variables take precedence over the .env file, and command
//! line flags take precedence over both.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::artifact::Wabt;
use crate::error::{BuildError, Result};
use crate::toolchain::CargoToolchain;

/// Default scratch directory units are copied into for building.
pub const DEFAULT_BUILD_DIR: &str = "/tmp/elrond-contract-rust";

pub const ENV_BUILD_DIR: &str = "CONTRACT_BUILD_DIR";
pub const ENV_CARGO: &str = "CONTRACT_BUILD_CARGO";
pub const ENV_WASM2WAT: &str = "CONTRACT_BUILD_WASM2WAT";
pub const ENV_WASM_OBJDUMP: &str = "CONTRACT_BUILD_WASM_OBJDUMP";
pub const ENV_TIMEOUT_SECS: &str = "CONTRACT_BUILD_TIMEOUT_SECS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Scratch directory shared by unit builds
    pub build_dir: PathBuf,
    /// Toolchain program
    pub cargo: String,
    pub wasm2wat: String,
    pub wasm_objdump: String,
    /// Per-unit toolchain timeout
    pub timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            build_dir: PathBuf::from(DEFAULT_BUILD_DIR),
            cargo: "cargo".to_string(),
            wasm2wat: "wasm2wat".to_string(),
            wasm_objdump: "wasm-objdump".to_string(),
            timeout: None,
        }
    }
}

impl Config {
    /// Load configuration from `<dir>/.env` and the process environment.
    pub fn load(dir: &Path) -> Result<Self> {
        let mut vars = HashMap::new();

        let env_path = dir.join(".env");
        if env_path.exists() {
            let iter = dotenvy::from_path_iter(&env_path).map_err(|e| {
                BuildError::Configuration(format!("cannot read {}: {}", env_path.display(), e))
            })?;
            for item in iter {
                let (key, value) = item.map_err(|e| {
                    BuildError::Configuration(format!("invalid {}: {}", env_path.display(), e))
                })?;
                vars.insert(key, value);
            }
        }

        // Environment variables override .env file
        vars.extend(std::env::vars());

        Self::from_vars(&vars)
    }

    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self> {
        let defaults = Self::default();
        let get = |key: &str| vars.get(key).filter(|v| !v.trim().is_empty()).cloned();

        let timeout = match get(ENV_TIMEOUT_SECS) {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| {
                    BuildError::Configuration(format!(
                        "{ENV_TIMEOUT_SECS} must be a whole number of seconds, got '{raw}'"
                    ))
                })?;
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        Ok(Self {
            build_dir: get(ENV_BUILD_DIR)
                .map(PathBuf::from)
                .unwrap_or(defaults.build_dir),
            cargo: get(ENV_CARGO).unwrap_or(defaults.cargo),
            wasm2wat: get(ENV_WASM2WAT).unwrap_or(defaults.wasm2wat),
            wasm_objdump: get(ENV_WASM_OBJDUMP).unwrap_or(defaults.wasm_objdump),
            timeout,
        })
    }

    pub fn toolchain(&self) -> CargoToolchain {
        CargoToolchain {
            cargo: self.cargo.clone(),
        }
    }

    pub fn wasm_tools(&self) -> Wabt {
        Wabt {
            wasm2wat: self.wasm2wat.clone(),
            wasm_objdump: self.wasm_objdump.clone(),
        }
    }

    /// Print configuration for debugging.
    pub fn print(&self) {
        println!("Configuration:");
        println!("  {}: {}", ENV_BUILD_DIR, self.build_dir.display());
        println!("  {}: {}", ENV_CARGO, self.cargo);
        println!("  {}: {}", ENV_WASM2WAT, self.wasm2wat);
        println!("  {}: {}", ENV_WASM_OBJDUMP, self.wasm_objdump);
        match self.timeout {
            Some(t) => println!("  {}: {}", ENV_TIMEOUT_SECS, t.as_secs()),
            None => println!("  {}: (none)", ENV_TIMEOUT_SECS),
        }
    }
}
