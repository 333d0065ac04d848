//! File hashing and comparison
//!
//! Downloads are skipped when the remote blob hash matches either the source
//! repository's copy or the file already on disk. Git blob object hashes are
//! SHA-1 over a `blob <len>\0` header followed by the content.

use anyhow::{Context, Result};
use sha1::{Digest, Sha1};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

const BUF_SIZE: usize = 65536;

/// Git blob object hash of a byte slice
pub fn git_blob_hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(format!("blob {}\0", data.len()).as_bytes());
    hasher.update(data);
    hex_digest(hasher)
}

/// Git blob object hash of a file, streamed in 64 KiB chunks
pub fn git_blob_hash_file(path: &Path) -> Result<String> {
    let file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let size = file
        .metadata()
        .with_context(|| format!("Failed to stat {}", path.display()))?
        .len();

    let mut hasher = Sha1::new();
    hasher.update(format!("blob {}\0", size).as_bytes());

    let mut reader = BufReader::new(file);
    let mut buf = [0u8; BUF_SIZE];
    loop {
        let n = reader
            .read(&mut buf)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex_digest(hasher))
}

/// Git blob object hash of a file that may not exist
pub fn git_blob_hash_if_exists(path: &Path) -> Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }
    git_blob_hash_file(path).map(Some)
}

/// True when both files have identical contents
pub fn files_identical(a: &Path, b: &Path) -> Result<bool> {
    let meta_a = a
        .metadata()
        .with_context(|| format!("Failed to stat {}", a.display()))?;
    let meta_b = b
        .metadata()
        .with_context(|| format!("Failed to stat {}", b.display()))?;
    if meta_a.len() != meta_b.len() {
        return Ok(false);
    }

    let mut reader_a = BufReader::new(File::open(a)?);
    let mut reader_b = BufReader::new(File::open(b)?);
    let mut buf_a = [0u8; BUF_SIZE];
    let mut buf_b = [0u8; BUF_SIZE];
    loop {
        let n_a = reader_a.read(&mut buf_a)?;
        let n_b = reader_b.read(&mut buf_b)?;
        if n_a != n_b || buf_a[..n_a] != buf_b[..n_b] {
            return Ok(false);
        }
        if n_a == 0 {
            return Ok(true);
        }
    }
}

fn hex_digest(hasher: Sha1) -> String {
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}
