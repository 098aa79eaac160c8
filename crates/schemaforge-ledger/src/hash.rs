//! Streamed content hashing.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::LedgerResult;

/// SHA-256 of a file's content, streamed in fixed 8 KiB chunks so memory use
/// is independent of file size. A missing file hashes to `None`, distinct
/// from any real digest.
pub fn file_sha256(path: &Path) -> LedgerResult<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }

    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut chunk = [0u8; 8192];
    loop {
        let n = file.read(&mut chunk)?;
        if n == 0 {
            break;
        }
        hasher.update(&chunk[..n]);
    }
    Ok(Some(hex::encode(hasher.finalize())))
}
