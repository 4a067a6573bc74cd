use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::error::ConfigError;

pub const LINT_IMAGE_REPO: &str = "docker.io/golangci/golangci-lint";
pub const LINT_IMAGE_TAG: &str = "v1.64-alpine";
pub const LINT_IMAGE_DIGEST: &str =
    "sha256:05e1762ba74443e44b3a179e9549ad134a9ee2180d4fcc06b19a77ea0c6ac66a";

/// A container image pinned by content digest.
///
/// A tag alone is never accepted: results must be reproducible across
/// time, and tags move.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageRef {
    pub repository: String,
    pub tag: Option<String>,
    pub digest: String,
}

impl ImageRef {
    /// The pinned golangci-lint image.
    pub fn pinned_default() -> Self {
        Self {
            repository: LINT_IMAGE_REPO.to_string(),
            tag: Some(LINT_IMAGE_TAG.to_string()),
            digest: LINT_IMAGE_DIGEST.to_string(),
        }
    }

    /// Parse `repo[:tag]@sha256:<64 hex>`.
    pub fn parse(reference: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidValue {
            field: "image".to_string(),
            reason: format!("{reason}: {reference:?}"),
        };

        let (name, digest) = reference
            .rsplit_once('@')
            .ok_or_else(|| invalid("image must be pinned by digest"))?;

        let hex_part = digest
            .strip_prefix("sha256:")
            .ok_or_else(|| invalid("only sha256 digests are supported"))?;
        if hex_part.len() != 64 || !hex_part.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid("malformed sha256 digest"));
        }

        // A ':' after the last '/' separates the tag; earlier colons belong
        // to a registry port.
        let last_slash = name.rfind('/').map_or(0, |i| i + 1);
        let (repository, tag) = match name[last_slash..].rfind(':') {
            Some(i) => {
                let split = last_slash + i;
                (&name[..split], Some(&name[split + 1..]))
            }
            None => (name, None),
        };

        if repository.is_empty() || tag.is_some_and(str::is_empty) {
            return Err(invalid("missing repository or tag"));
        }

        Ok(Self {
            repository: repository.to_string(),
            tag: tag.map(str::to_string),
            digest: digest.to_ascii_lowercase(),
        })
    }
}

impl Default for ImageRef {
    fn default() -> Self {
        Self::pinned_default()
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.repository)?;
        if let Some(tag) = &self.tag {
            write!(f, ":{tag}")?;
        }
        write!(f, "@{}", self.digest)
    }
}

impl FromStr for ImageRef {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for ImageRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
