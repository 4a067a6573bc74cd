//! Query façade over one lint run.
//!
//! A [`LintRun`] is created without doing any work. The first query builds
//! the execution request, runs it through the provider and parses the
//! report; the normalized report is then kept for the lifetime of the
//! `LintRun` and every later query reads from it.

use std::io::Write;
use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::debug;

use crate::descriptor::RunDescriptor;
use crate::env::build::{Environment, build_request};
use crate::env::request::ExecRequest;
use crate::error::LintError;
use crate::exec::artifact::Artifact;
use crate::exec::provider::ExecutionProvider;
use crate::report::model::{Issue, Report};
use crate::report::normalize::parse_report;

/// Entry point: binds a provider to an environment and hands out runs.
#[derive(Debug)]
pub struct Linter<P> {
    provider: Arc<P>,
    env: Arc<Environment>,
}

impl<P> Clone for Linter<P> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            env: Arc::clone(&self.env),
        }
    }
}

impl<P: ExecutionProvider> Linter<P> {
    pub fn new(provider: P, env: Environment) -> Self {
        Self::with_shared(Arc::new(provider), env)
    }

    pub fn with_shared(provider: Arc<P>, env: Environment) -> Self {
        Self {
            provider,
            env: Arc::new(env),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    /// Describe a lint run. Nothing executes until it is queried.
    pub fn lint(&self, descriptor: RunDescriptor) -> LintRun<P> {
        LintRun {
            descriptor,
            provider: Arc::clone(&self.provider),
            env: Arc::clone(&self.env),
            report: OnceCell::new(),
        }
    }
}

/// The result of running golangci-lint over one descriptor.
#[derive(Debug)]
pub struct LintRun<P> {
    descriptor: RunDescriptor,
    provider: Arc<P>,
    env: Arc<Environment>,
    report: OnceCell<Report>,
}

impl<P: ExecutionProvider> LintRun<P> {
    pub fn descriptor(&self) -> &RunDescriptor {
        &self.descriptor
    }

    /// The execution request this run would submit.
    pub fn request(&self) -> Result<ExecRequest, LintError> {
        build_request(&self.descriptor, &self.env)
    }

    /// Run the tool and return the raw JSON report file.
    pub async fn report(&self) -> Result<Artifact, LintError> {
        let request = self.request()?;
        Ok(self.provider.run(&request).await?)
    }

    async fn normalized(&self) -> Result<&Report, LintError> {
        if let Some(report) = self.report.get() {
            debug!(path = %self.descriptor.path(), "reusing parsed report");
            return Ok(report);
        }

        self.report
            .get_or_try_init(|| async {
                let artifact = self.report().await?;
                let json = artifact.contents().await?;
                Ok::<_, LintError>(parse_report(&json, self.descriptor.path())?)
            })
            .await
    }

    /// All normalized issues, in the tool's order.
    pub async fn issues(&self) -> Result<&[Issue], LintError> {
        Ok(&self.normalized().await?.issues)
    }

    /// Number of issues with severity `error`.
    pub async fn error_count(&self) -> Result<usize, LintError> {
        Ok(self.normalized().await?.error_count())
    }

    /// Number of issues with any other severity.
    pub async fn warning_count(&self) -> Result<usize, LintError> {
        Ok(self.normalized().await?.warning_count())
    }

    /// Number of issues the tool flagged as covered by a nolint directive.
    /// They are still included in every other count.
    pub async fn suppressed_count(&self) -> Result<usize, LintError> {
        Ok(self.normalized().await?.suppressed_count())
    }

    /// Fail if any error-severity issue exists.
    ///
    /// Every error is written to `diagnostics` as a summary line before the
    /// failure is returned. Nothing is written when there are no errors.
    pub async fn assert<W: Write>(&self, diagnostics: &mut W) -> Result<(), LintError> {
        let report = self.normalized().await?;

        let mut count = 0;
        for issue in report.errors() {
            count += 1;
            writeln!(diagnostics, "{}", issue.summary()).map_err(LintError::Diagnostics)?;
        }
        diagnostics.flush().map_err(LintError::Diagnostics)?;

        if count > 0 {
            return Err(LintError::Failed { count });
        }
        Ok(())
    }
}
