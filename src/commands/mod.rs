//! CLI command handlers.
//!
//! Each submodule handles a specific CLI command:
//! - `build` - Build every contract unit of a project
//! - `scan` - List discovered units
//! - `codehash` - Hash a binary module
//! - `show` - Display configuration or a written manifest
//! - `preflight` - Check collaborator tools

pub mod build;
pub mod codehash;
mod preflight;
pub mod scan;
pub mod show;

pub use build::cmd_build;
pub use codehash::cmd_codehash;
pub use preflight::cmd_preflight;
pub use scan::cmd_scan;
pub use show::cmd_show;
