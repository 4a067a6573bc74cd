use std::collections::BTreeMap;

use tracing::debug;

use crate::config::{CacheDefaults, LintConfig};
use crate::descriptor::{CacheVolume, RunDescriptor};
use crate::env::image::ImageRef;
use crate::env::request::{ExecRequest, FileSource, Mount, StagedFile};
use crate::error::{ConfigError, LintError};
use crate::util::paths;

pub const SOURCE_ROOT: &str = "/src";
pub const GO_MOD_CACHE_PATH: &str = "/go/pkg/mod";
pub const GO_BUILD_CACHE_PATH: &str = "/root/.cache/go-build";
pub const LINT_CACHE_PATH: &str = "/root/.cache/golangci-lint";
pub const CONFIG_PATH: &str = "${HOME}/.golangci.yml";
pub const CONTAINER_HOME: &str = "/root";
pub const REPORT_FILE: &str = "golangci-lint-report.json";

/// The tool's own `--timeout`, fixed so every run gets the same budget.
pub const TOOL_TIMEOUT: &str = "10m";
pub const TOOL_TIMEOUT_SECS: u64 = 10 * 60;

/// golangci-lint config staged when none is configured.
pub const BUNDLED_LINT_CONFIG: &str = include_str!("../../assets/lint-config.yml");

/// Resolved, validated settings shared by every run of one linter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    pub image: ImageRef,
    pub lint_config: FileSource,
    pub caches: CacheDefaults,
}

impl Environment {
    pub fn from_config(config: &LintConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let lint_config = match &config.lint_config {
            Some(path) => FileSource::Host { path: path.clone() },
            None => FileSource::Inline {
                contents: BUNDLED_LINT_CONFIG.to_string(),
            },
        };

        Ok(Self {
            image: config.image_ref()?,
            lint_config,
            caches: config.caches.clone(),
        })
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            image: ImageRef::pinned_default(),
            lint_config: FileSource::Inline {
                contents: BUNDLED_LINT_CONFIG.to_string(),
            },
            caches: CacheDefaults::default(),
        }
    }
}

/// The golangci-lint command line.
///
/// Issue limits are disabled so filtering happens on the parsed report,
/// and the issues exit code is forced to 0: findings are data, and a
/// failing exit status would discard the report before it is read.
pub fn lint_command() -> Vec<String> {
    [
        "golangci-lint",
        "run",
        "-v",
        "--timeout",
        TOOL_TIMEOUT,
        "--max-issues-per-linter",
        "0",
        "--max-same-issues",
        "0",
        "--out-format",
        "json",
        "--issues-exit-code",
        "0",
        "--config",
        CONFIG_PATH,
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

fn cache_mount(cache: Option<&CacheVolume>, default: &str, target: &str) -> Mount {
    Mount::Cache {
        volume: cache.map_or(default, CacheVolume::name).to_string(),
        target: target.to_string(),
    }
}

/// Build the execution request for one run. Runs nothing.
pub fn build_request(
    descriptor: &RunDescriptor,
    env: &Environment,
) -> Result<ExecRequest, LintError> {
    if let Some(reason) = paths::subpath_violation(descriptor.path()) {
        return Err(LintError::InvalidPath {
            path: descriptor.path().to_string(),
            reason: reason.to_string(),
        });
    }

    let workdir = paths::join(&[SOURCE_ROOT, descriptor.path()]);

    let mounts = vec![
        Mount::Source {
            host: descriptor.source().root().to_path_buf(),
            target: SOURCE_ROOT.to_string(),
        },
        cache_mount(
            descriptor.go_mod_cache(),
            &env.caches.go_mod,
            GO_MOD_CACHE_PATH,
        ),
        cache_mount(
            descriptor.go_build_cache(),
            &env.caches.go_build,
            GO_BUILD_CACHE_PATH,
        ),
        cache_mount(
            descriptor.lint_cache(),
            &env.caches.golangci_lint,
            LINT_CACHE_PATH,
        ),
    ];

    debug!(image = %env.image, %workdir, "built lint request");

    Ok(ExecRequest {
        image: env.image.clone(),
        env: BTreeMap::from([("HOME".to_string(), CONTAINER_HOME.to_string())]),
        files: vec![StagedFile {
            target: CONFIG_PATH.to_string(),
            source: env.lint_config.clone(),
        }],
        mounts,
        workdir,
        args: lint_command(),
        expand: true,
        redirect_stdout: REPORT_FILE.to_string(),
    })
}
