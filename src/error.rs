//! Error types for the build pipeline.
//!
//! Every variant here is fatal for the unit that raised it. Soft conditions
//! (no units discovered, ambiguous artifact matches, failed ownership
//! adjustment) are logged instead of being returned.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Exit status used when a collaborator was killed by a signal.
const SIGNALLED_EXIT_CODE: i32 = 1;

/// Exit status used for a toolchain timeout, matching coreutils `timeout`.
pub const TIMEOUT_EXIT_CODE: i32 = 124;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("No buildable units (no {marker} found) under {root}")]
    NoUnits { root: PathBuf, marker: String },

    #[error("Toolchain failed for unit '{unit}' (exit code {code})")]
    Toolchain { unit: String, code: i32 },

    #[error("Toolchain for unit '{unit}' exceeded the timeout of {timeout:?}")]
    ToolchainTimeout { unit: String, timeout: Duration },

    #[error("Disassembly of {} failed (exit code {code}):\n{output}", path.display())]
    Disassembly {
        path: PathBuf,
        code: i32,
        output: String,
    },

    #[error("Import dump of {} failed (exit code {code}):\n{output}", path.display())]
    ImportDump {
        path: PathBuf,
        code: i32,
        output: String,
    },

    #[error("No file matches pattern [{pattern}] in folder {}", dir.display())]
    MissingArtifact { pattern: String, dir: PathBuf },

    #[error("Failed to spawn '{program}'. Is it installed?")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Archive operation failed for {}", path.display())]
    Archive {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error at {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize {what}")]
    Serialize {
        what: String,
        #[source]
        source: serde_json::Error,
    },
}

impl BuildError {
    /// Attach a path to an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Exit status the whole process should terminate with.
    ///
    /// Collaborator failures propagate the collaborator's own exit code.
    /// The result is never zero.
    pub fn exit_code(&self) -> i32 {
        let code = match self {
            Self::Toolchain { code, .. }
            | Self::Disassembly { code, .. }
            | Self::ImportDump { code, .. } => *code,
            Self::ToolchainTimeout { .. } => TIMEOUT_EXIT_CODE,
            _ => 1,
        };
        if code <= 0 {
            SIGNALLED_EXIT_CODE
        } else {
            code
        }
    }
}

pub type Result<T> = std::result::Result<T, BuildError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toolchain_exit_code_propagates() {
        let err = BuildError::Toolchain {
            unit: "adder".into(),
            code: 101,
        };
        assert_eq!(err.exit_code(), 101);
    }

    #[test]
    fn test_signalled_collaborator_is_nonzero() {
        let err = BuildError::Disassembly {
            path: PathBuf::from("a.wasm"),
            code: -1,
            output: String::new(),
        };
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_missing_artifact_message() {
        let err = BuildError::MissingArtifact {
            pattern: "*.abi.json".into(),
            dir: PathBuf::from("/output/adder"),
        };
        assert_eq!(err.exit_code(), 1);
        assert_eq!(
            err.to_string(),
            "No file matches pattern [*.abi.json] in folder /output/adder"
        );
    }

    #[test]
    fn test_timeout_exit_code() {
        let err = BuildError::ToolchainTimeout {
            unit: "adder".into(),
            timeout: Duration::from_secs(5),
        };
        assert_eq!(err.exit_code(), TIMEOUT_EXIT_CODE);
        assert!(err.to_string().contains("5s"));

        let err = BuildError::ToolchainTimeout {
            unit: "adder".into(),
            timeout: Duration::from_millis(200),
        };
        assert!(err.to_string().ends_with("timeout of 200ms"));
    }
}
