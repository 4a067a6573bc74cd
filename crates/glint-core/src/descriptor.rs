use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::LintError;

/// Read-only handle to the caller's source tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SourceTree {
    root: PathBuf,
}

impl SourceTree {
    /// Open a directory as a source tree.
    ///
    /// The path is canonicalized so bind mounts never depend on the
    /// caller's working directory.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LintError> {
        let path = path.as_ref();
        let root = path.canonicalize().map_err(|source| LintError::Source {
            path: path.to_path_buf(),
            source,
        })?;
        if !root.is_dir() {
            return Err(LintError::Source {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a directory"),
            });
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// A named, persistent cache volume owned by the execution engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheVolume(String);

impl CacheVolume {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheVolume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything that determines one lint run.
///
/// Two descriptors with equal fields describe the same run and may share
/// its result.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RunDescriptor {
    source: SourceTree,
    path: String,
    go_mod_cache: Option<CacheVolume>,
    go_build_cache: Option<CacheVolume>,
    lint_cache: Option<CacheVolume>,
}

impl RunDescriptor {
    pub fn new(source: SourceTree) -> Self {
        Self {
            source,
            path: String::new(),
            go_mod_cache: None,
            go_build_cache: None,
            lint_cache: None,
        }
    }

    /// Lint only this path within the source tree.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_go_mod_cache(mut self, cache: CacheVolume) -> Self {
        self.go_mod_cache = Some(cache);
        self
    }

    pub fn with_go_build_cache(mut self, cache: CacheVolume) -> Self {
        self.go_build_cache = Some(cache);
        self
    }

    pub fn with_lint_cache(mut self, cache: CacheVolume) -> Self {
        self.lint_cache = Some(cache);
        self
    }

    pub fn source(&self) -> &SourceTree {
        &self.source
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn go_mod_cache(&self) -> Option<&CacheVolume> {
        self.go_mod_cache.as_ref()
    }

    pub fn go_build_cache(&self) -> Option<&CacheVolume> {
        self.go_build_cache.as_ref()
    }

    pub fn lint_cache(&self) -> Option<&CacheVolume> {
        self.lint_cache.as_ref()
    }
}
