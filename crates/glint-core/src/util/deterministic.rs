//! Deterministic content digests.
//!
//! The execution cache key must depend only on content, never on
//! filesystem metadata or traversal order, so identical trees hash
//! identically on every host.

use std::fs;
use std::io;
use std::path::Path;

use sha2::{Digest, Sha256};
use walkdir::WalkDir;

/// Hex-encoded SHA-256 of a byte slice.
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Hex-encoded SHA-256 over a directory tree.
///
/// Entries are visited sorted by file name. Each entry contributes its
/// kind and `/`-separated relative path; regular files also contribute
/// their length and bytes, symlinks their target. Special files (FIFOs,
/// sockets, devices) are never opened, since reading a FIFO blocks until
/// a writer appears. Timestamps and permissions are ignored.
pub fn tree_digest(root: &Path) -> io::Result<String> {
    let mut hasher = Sha256::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        let rel = entry.path().strip_prefix(root).unwrap_or(entry.path());
        let rel = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        let file_type = entry.file_type();
        if file_type.is_dir() {
            hasher.update(b"d\0");
            hasher.update(rel.as_bytes());
            hasher.update(b"\0");
        } else if file_type.is_symlink() {
            let target = fs::read_link(entry.path())?;
            hasher.update(b"l\0");
            hasher.update(rel.as_bytes());
            hasher.update(b"\0");
            hasher.update(target.to_string_lossy().as_bytes());
            hasher.update(b"\0");
        } else if file_type.is_file() {
            let bytes = fs::read(entry.path())?;
            hasher.update(b"f\0");
            hasher.update(rel.as_bytes());
            hasher.update(b"\0");
            hasher.update((bytes.len() as u64).to_le_bytes());
            hasher.update(&bytes);
        } else {
            hasher.update(b"s\0");
            hasher.update(rel.as_bytes());
            hasher.update(b"\0");
        }
    }

    Ok(hex::encode(hasher.finalize()))
}
