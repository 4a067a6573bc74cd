//! Error types for report acquisition and querying.
//!
//! Failures are split by origin so callers can tell a broken environment
//! apart from a broken report. Lint findings are never errors here; they
//! only turn into [`LintError::Failed`] through an explicit assertion.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Failures raised while running the tool inside the sandbox.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("failed to launch `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("execution exceeded the {limit:?} limit")]
    Timeout { limit: Duration },

    /// The tool runs with a forced zero exit code, so any other status
    /// means the environment itself is broken.
    #[error("sandboxed run exited with {status} despite forced zero exit code: {stderr}")]
    NonZeroExit { status: String, stderr: String },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to encode execution request: {0}")]
    Encode(#[from] serde_json::Error),
}

impl ExecError {
    pub(crate) fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

/// Failures raised while reading or decoding the report artifact.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to read report artifact {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Decoder message is passed through untouched.
    #[error(transparent)]
    Malformed(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Figment(#[from] Box<figment::Error>),

    #[error("Invalid configuration value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

/// Umbrella error surfaced by every query operation.
#[derive(Debug, Error)]
pub enum LintError {
    #[error(transparent)]
    Exec(#[from] ExecError),

    #[error(transparent)]
    Report(#[from] ReportError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid source tree {}: {source}", path.display())]
    Source {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid lint path {path:?}: {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("failed to write diagnostics: {0}")]
    Diagnostics(#[source] io::Error),

    #[error("linting failed with {count} issues")]
    Failed { count: usize },
}
