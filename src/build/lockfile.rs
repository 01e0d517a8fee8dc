//! Dependency lock file promotion.
//!
//! A lock file generated (or confirmed) in the scratch copy is copied back
//! into the unit's sources so the next run builds with `--locked`.

use std::fs;
use std::path::PathBuf;

use tracing::{info, warn};

use super::context::BuildContext;
use crate::error::{BuildError, Result};
use crate::layout::LOCK_FILE;
use crate::ownership::Ownership;

pub fn promote_lock_file(ctx: &BuildContext, owner: Option<Ownership>) -> Result<PathBuf> {
    let from = ctx.build_lock_file();
    let to = ctx.source_lock_file();

    if !from.is_file() {
        return Err(BuildError::MissingArtifact {
            pattern: LOCK_FILE.to_string(),
            dir: ctx.build_dir.clone(),
        });
    }
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent).map_err(|e| BuildError::io(parent, e))?;
    }
    fs::copy(&from, &to).map_err(|e| BuildError::io(&to, e))?;
    info!("Promoted lock file to {}", to.display());

    if let Some(owner) = owner {
        if let Err(e) = owner.apply(&to) {
            warn!("Failed to adjust ownership of {}: {}", to.display(), e);
        }
    }
    Ok(to)
}
