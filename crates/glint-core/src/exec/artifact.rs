use std::path::{Path, PathBuf};

use crate::error::ReportError;

/// A file produced by a sandboxed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    name: String,
    path: PathBuf,
}

impl Artifact {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    /// File name the tool's output was redirected to.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Host location of the artifact.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Full artifact content as text.
    pub async fn contents(&self) -> Result<String, ReportError> {
        tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| ReportError::Read {
                path: self.path.clone(),
                source,
            })
    }
}
