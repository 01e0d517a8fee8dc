//! Content hash of a binary module.
//!
//! BLAKE2b with a 32-byte digest over the raw module bytes, hex encoded.
//! No key, no salt: identical bytes always give the identical hash.

use std::fs;
use std::path::Path;

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};

use crate::error::{BuildError, Result};

type Blake2b256 = Blake2b<U32>;

/// Hash module bytes to a lowercase hex string (64 characters).
pub fn compute_code_hash(code: &[u8]) -> String {
    let mut hasher = Blake2b256::new();
    hasher.update(code);
    format!("{:x}", hasher.finalize())
}

/// Hash the module stored at `path`.
pub fn file_code_hash(path: &Path) -> Result<String> {
    let code = fs::read(path).map_err(|e| BuildError::io(path, e))?;
    Ok(compute_code_hash(&code))
}
