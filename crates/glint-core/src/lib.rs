pub mod config;
pub mod descriptor;
pub mod env;
pub mod error;
pub mod exec;
pub mod report;
pub mod run;
pub mod util;

pub use config::LintConfig;
pub use descriptor::{CacheVolume, RunDescriptor, SourceTree};
pub use error::{ConfigError, ExecError, LintError, ReportError};
pub use run::{LintRun, Linter};

use env::build::Environment;
use exec::{DockerProvider, Memoized};

pub const TOOL_NAME: &str = "glint";

/// Linter backed by the local container engine, memoized by request
/// content.
pub fn docker_linter(config: &LintConfig) -> Result<Linter<Memoized<DockerProvider>>, LintError> {
    let env = Environment::from_config(config)?;
    let provider = DockerProvider::new(config)?;
    Ok(Linter::new(Memoized::new(provider), env))
}
