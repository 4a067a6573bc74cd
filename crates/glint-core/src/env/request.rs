use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::env::image::ImageRef;
use crate::error::ExecError;
use crate::util::deterministic::tree_digest;

/// Where the content of a staged file comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FileSource {
    /// A file on the host, read when the run is staged.
    Host { path: PathBuf },
    /// Content carried inside the request.
    Inline { contents: String },
}

/// A file placed into the container before the tool starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StagedFile {
    /// Container path; may reference request env vars when `expand` is set.
    pub target: String,
    pub source: FileSource,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Mount {
    /// The caller's source tree, mounted read-only.
    Source { host: PathBuf, target: String },
    /// A named cache volume shared across runs.
    Cache { volume: String, target: String },
}

/// A fully specified, side-effect free description of one sandboxed run.
///
/// Field order is fixed so the serialized form is canonical; it feeds the
/// execution cache key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecRequest {
    pub image: ImageRef,
    pub env: BTreeMap<String, String>,
    pub files: Vec<StagedFile>,
    pub mounts: Vec<Mount>,
    pub workdir: String,
    pub args: Vec<String>,
    /// Expand `${NAME}` in args and file targets from `env`.
    pub expand: bool,
    /// Name of the file that receives the tool's stdout.
    pub redirect_stdout: String,
}

impl ExecRequest {
    /// Substitute `${NAME}` and `$NAME` from the request env.
    ///
    /// Unknown names expand to the empty string. A `$` not followed by a
    /// name is kept literally.
    pub fn expand(&self, input: &str) -> String {
        let mut out = String::with_capacity(input.len());
        let mut rest = input;

        while let Some(pos) = rest.find('$') {
            out.push_str(&rest[..pos]);
            let after = &rest[pos + 1..];

            if let Some(braced) = after.strip_prefix('{') {
                if let Some(end) = braced.find('}') {
                    out.push_str(self.env.get(&braced[..end]).map_or("", String::as_str));
                    rest = &braced[end + 1..];
                    continue;
                }
            } else {
                let len = match after.bytes().next() {
                    Some(b) if b.is_ascii_alphabetic() || b == b'_' => after
                        .bytes()
                        .take_while(|b| b.is_ascii_alphanumeric() || *b == b'_')
                        .count(),
                    _ => 0,
                };
                if len > 0 {
                    out.push_str(self.env.get(&after[..len]).map_or("", String::as_str));
                    rest = &after[len..];
                    continue;
                }
            }

            out.push('$');
            rest = after;
        }

        out.push_str(rest);
        out
    }

    /// Expand `input` only when the request asks for it.
    pub fn resolve(&self, input: &str) -> String {
        if self.expand {
            self.expand(input)
        } else {
            input.to_string()
        }
    }

    /// Content address of this request.
    ///
    /// Covers the canonical request plus the content of every host input it
    /// references: the source tree and host-staged files. Reads the
    /// filesystem, so callers on an async runtime should run it on a
    /// blocking thread.
    pub fn cache_key(&self) -> Result<String, ExecError> {
        let mut hasher = Sha256::new();
        hasher.update(serde_json::to_vec(self)?);

        for mount in &self.mounts {
            if let Mount::Source { host, .. } = mount {
                let digest = tree_digest(host).map_err(|source| {
                    ExecError::io(format!("failed to digest {}", host.display()), source)
                })?;
                hasher.update(digest.as_bytes());
            }
        }

        for file in &self.files {
            if let FileSource::Host { path } = &file.source {
                let bytes = fs::read(path).map_err(|source| {
                    ExecError::io(format!("failed to read {}", path.display()), source)
                })?;
                hasher.update(Sha256::digest(&bytes));
            }
        }

        Ok(hex::encode(hasher.finalize()))
    }
}
