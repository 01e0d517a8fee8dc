//! Source archive of a built unit.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use tar::Builder;
use tracing::info;

use crate::error::{BuildError, Result};

/// Tar `input_dir` into `<output_dir>/<unit>.tar`, entries rooted at `<unit>/`.
///
/// Symlinks are stored as links. The archive is uncompressed.
pub fn archive_source_code(unit: &str, input_dir: &Path, output_dir: &Path) -> Result<PathBuf> {
    let archive_file = output_dir.join(format!("{unit}.tar"));
    let archive_err = |source| BuildError::Archive {
        path: archive_file.clone(),
        source,
    };

    let file = File::create(&archive_file).map_err(archive_err)?;
    let mut builder = Builder::new(BufWriter::new(file));
    builder.follow_symlinks(false);
    builder.append_dir_all(unit, input_dir).map_err(archive_err)?;
    builder
        .into_inner()
        .and_then(|mut w| std::io::Write::flush(&mut w))
        .map_err(archive_err)?;

    info!("Created archive: {}", archive_file.display());
    Ok(archive_file)
}
