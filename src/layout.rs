//! Fixed layout of a contract unit directory.
//!
//! ```text
//! <unit>/
//!   elrond.json        unit marker
//!   meta/              build definition, toolchain runs here
//!   meta/target/       toolchain cache (removed)
//!   wasm/Cargo.lock    dependency lock file (promoted back to the source)
//!   wasm/target/       toolchain cache (removed)
//!   output/            toolchain output
//! ```

/// Presence of this file marks a directory as a buildable unit.
pub const UNIT_MARKER: &str = "elrond.json";

/// Subdirectory the toolchain is invoked in.
pub const BUILD_DEFINITION_DIR: &str = "meta";

/// Dependency lock file, relative to the unit root.
pub const LOCK_FILE: &str = "wasm/Cargo.lock";

/// Toolchain caches, relative to the unit root. Removed before and after every build.
pub const CACHE_DIRS: &[&str] = &["wasm/target", "meta/target"];

/// Directory the toolchain writes the binary module and its metadata to.
pub const TOOLCHAIN_OUTPUT_DIR: &str = "output";

/// Name of the manifest written at the root of the output tree.
pub const MANIFEST_FILE: &str = "artifacts.json";
