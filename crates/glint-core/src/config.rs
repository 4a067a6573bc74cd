//! Layered configuration.
//!
//! Sources, highest priority last:
//! 1. Built-in defaults
//! 2. User-level `~/.config/glint/config.toml`
//! 3. Project-level `glint.toml`
//! 4. Environment variables (`GLINT_` prefix, `__` between nested keys),
//!    e.g. `GLINT_CACHES__GO_MOD=shared-mods`

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::env::build::TOOL_TIMEOUT_SECS;
use crate::env::image::ImageRef;
use crate::error::ConfigError;

pub const ENV_PREFIX: &str = "GLINT_";
pub const PROJECT_CONFIG_FILE: &str = "glint.toml";

const fn default_exec_timeout_secs() -> u64 {
    15 * 60
}

fn default_docker() -> String {
    "docker".to_string()
}

fn default_image() -> String {
    ImageRef::pinned_default().to_string()
}

/// Shared cache volume names used when a run does not supply its own.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CacheDefaults {
    pub go_mod: String,
    pub go_build: String,
    pub golangci_lint: String,
}

impl Default for CacheDefaults {
    fn default() -> Self {
        Self {
            go_mod: "go-mod".to_string(),
            go_build: "go-build".to_string(),
            golangci_lint: "golangci-lint".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LintConfig {
    /// Tool image; must be pinned by digest.
    #[serde(default = "default_image")]
    pub image: String,

    /// Container CLI used by the docker provider.
    #[serde(default = "default_docker")]
    pub docker: String,

    /// Host path of the golangci-lint config. The bundled config is used
    /// when unset.
    #[serde(default)]
    pub lint_config: Option<PathBuf>,

    /// Where report artifacts are written. A temporary directory is used
    /// when unset.
    #[serde(default)]
    pub artifact_dir: Option<PathBuf>,

    /// Wall-clock limit for one sandboxed run. Must exceed the tool's own
    /// 10 minute timeout so the tool reports its timeout first.
    #[serde(default = "default_exec_timeout_secs")]
    pub exec_timeout_secs: u64,

    #[serde(default)]
    pub caches: CacheDefaults,
}

impl Default for LintConfig {
    fn default() -> Self {
        Self {
            image: default_image(),
            docker: default_docker(),
            lint_config: None,
            artifact_dir: None,
            exec_timeout_secs: default_exec_timeout_secs(),
            caches: CacheDefaults::default(),
        }
    }
}

impl LintConfig {
    /// Load from defaults, config files and `GLINT_*` env vars.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(Self::figment())
    }

    /// Like [`LintConfig::load`], with `path` layered above the discovered
    /// config files and below the environment.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let figment = Self::file_layers()
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));
        Self::from_figment(figment)
    }

    /// The full provider chain.
    pub fn figment() -> Figment {
        Self::file_layers().merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    fn file_layers() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        let local_path = PathBuf::from(PROJECT_CONFIG_FILE);
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        figment
    }

    fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join(crate::TOOL_NAME).join("config.toml"))
    }

    /// Reject values that would make runs non-reproducible or unbounded.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.image_ref()?;

        if self.exec_timeout_secs <= TOOL_TIMEOUT_SECS {
            return Err(ConfigError::InvalidValue {
                field: "exec_timeout_secs".to_string(),
                reason: format!(
                    "must be greater than the tool timeout ({TOOL_TIMEOUT_SECS}s), got {}",
                    self.exec_timeout_secs
                ),
            });
        }
        for (field, name) in [
            ("caches.go_mod", &self.caches.go_mod),
            ("caches.go_build", &self.caches.go_build),
            ("caches.golangci_lint", &self.caches.golangci_lint),
        ] {
            if name.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    reason: "cache volume name must not be empty".to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn image_ref(&self) -> Result<ImageRef, ConfigError> {
        ImageRef::parse(&self.image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn defaults_are_correct() {
        let config = LintConfig::default();

        assert_eq!(config.image_ref().unwrap(), ImageRef::pinned_default());
        assert_eq!(config.docker, "docker");
        assert_eq!(config.exec_timeout_secs, 900);
        assert_eq!(config.caches.go_mod, "go-mod");
        assert_eq!(config.caches.go_build, "go-build");
        assert_eq!(config.caches.golangci_lint, "golangci-lint");
        assert!(config.lint_config.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn project_file_and_env_layer_over_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file(
                PROJECT_CONFIG_FILE,
                r#"
                docker = "podman"
                exec_timeout_secs = 660

                [caches]
                go_mod = "shared-mods"
                "#,
            )?;
            jail.set_env("GLINT_CACHES__GO_BUILD", "shared-build");
            jail.set_env("GLINT_EXEC_TIMEOUT_SECS", "1200");

            let config = LintConfig::load().expect("config loads");
            assert_eq!(config.docker, "podman");
            assert_eq!(config.exec_timeout_secs, 1200);
            assert_eq!(config.caches.go_mod, "shared-mods");
            assert_eq!(config.caches.go_build, "shared-build");
            assert_eq!(config.caches.golangci_lint, "golangci-lint");
            Ok(())
        });
    }

    #[test]
    fn explicit_file_is_loaded() {
        Jail::expect_with(|jail| {
            jail.create_file("custom.toml", "docker = \"nerdctl\"\n")?;

            let config = LintConfig::load_from(Path::new("custom.toml")).expect("config loads");
            assert_eq!(config.docker, "nerdctl");
            Ok(())
        });
    }

    #[test]
    fn unpinned_image_override_is_rejected() {
        Jail::expect_with(|jail| {
            jail.set_env("GLINT_IMAGE", "golangci/golangci-lint:latest");

            let err = LintConfig::load().unwrap_err();
            assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "image"));
            Ok(())
        });
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let config = LintConfig {
            exec_timeout_secs: 0,
            ..LintConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn provider_limit_must_outlast_tool_timeout() {
        for secs in [300, 600] {
            let config = LintConfig {
                exec_timeout_secs: secs,
                ..LintConfig::default()
            };
            let err = config.validate().unwrap_err();
            assert!(
                matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "exec_timeout_secs"),
                "{secs}"
            );
        }

        let config = LintConfig {
            exec_timeout_secs: 601,
            ..LintConfig::default()
        };
        assert!(config.validate().is_ok());
    }
}
