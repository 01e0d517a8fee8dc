//! contract-build library exports.
//!
//! The binary is a thin CLI over these modules; integration tests drive the
//! pipeline through them with fake collaborators.

pub mod artifact;
pub mod build;
pub mod config;
pub mod error;
pub mod layout;
pub mod ownership;
pub mod pipeline;
pub mod preflight;
pub mod process;
pub mod scan;
pub mod timing;
pub mod toolchain;
pub mod workspace;

pub use error::{BuildError, Result};
pub use pipeline::{run, BuildOptions, FailurePolicy, RunReport};
