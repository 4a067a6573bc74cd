use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tempfile::TempDir;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::LintConfig;
use crate::env::request::{ExecRequest, FileSource, Mount, StagedFile};
use crate::error::ExecError;
use crate::exec::artifact::Artifact;
use crate::exec::provider::ExecutionProvider;
use crate::util::deterministic::sha256_hex;
use crate::TOOL_NAME;

const STDERR_TAIL_BYTES: usize = 4096;
const REMOVE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug)]
enum ArtifactRoot {
    Temp(TempDir),
    Dir(PathBuf),
}

impl ArtifactRoot {
    fn path(&self) -> &Path {
        match self {
            Self::Temp(dir) => dir.path(),
            Self::Dir(dir) => dir,
        }
    }
}

/// Runs requests with a docker-compatible CLI (`docker run`).
///
/// Stdout of the container is written to `<root>/runs/<pid>-<n>/<redirect>`.
/// With no configured artifact dir the root is a temporary directory that
/// lives as long as the provider.
///
/// Each run's container is named `glint-<pid>-<n>`. If the run times out or
/// its future is dropped, the container is force-removed: killing the CLI
/// client alone leaves the container running in the engine.
#[derive(Debug)]
pub struct DockerProvider {
    program: String,
    timeout: Duration,
    root: ArtifactRoot,
    runs: AtomicU64,
}

impl DockerProvider {
    pub fn new(config: &LintConfig) -> Result<Self, ExecError> {
        let root = match &config.artifact_dir {
            Some(dir) => ArtifactRoot::Dir(dir.clone()),
            None => ArtifactRoot::Temp(
                tempfile::Builder::new()
                    .prefix(&format!("{TOOL_NAME}-"))
                    .tempdir()
                    .map_err(|source| ExecError::io("failed to create artifact dir", source))?,
            ),
        };

        Ok(Self {
            program: config.docker.clone(),
            timeout: Duration::from_secs(config.exec_timeout_secs),
            root,
            runs: AtomicU64::new(0),
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn artifact_root(&self) -> &Path {
        self.root.path()
    }

    /// Host path a staged file is bind-mounted from.
    pub fn staged_path(&self, request: &ExecRequest, file: &StagedFile) -> PathBuf {
        match &file.source {
            FileSource::Host { path } => std::path::absolute(path).unwrap_or_else(|_| path.clone()),
            FileSource::Inline { contents } => {
                let target = request.resolve(&file.target);
                let name = target.rsplit('/').next().unwrap_or("staged");
                let digest = sha256_hex(contents.as_bytes());
                self.root
                    .path()
                    .join("staged")
                    .join(format!("{}-{name}", &digest[..16]))
            }
        }
    }

    /// Arguments passed to the container CLI, without the program name.
    ///
    /// The per-run container name is left out; it is only assigned when a
    /// run is launched.
    pub fn docker_args(&self, request: &ExecRequest) -> Vec<String> {
        self.run_args(request, None)
    }

    fn run_args(&self, request: &ExecRequest, name: Option<&str>) -> Vec<String> {
        let mut args = vec!["run".to_string(), "--rm".to_string()];
        if let Some(name) = name {
            args.push("--name".to_string());
            args.push(name.to_string());
        }
        args.push("--workdir".to_string());
        args.push(request.resolve(&request.workdir));

        for (key, value) in &request.env {
            args.push("--env".to_string());
            args.push(format!("{key}={value}"));
        }

        for file in &request.files {
            args.push("--mount".to_string());
            args.push(format!(
                "type=bind,source={},target={},readonly",
                self.staged_path(request, file).display(),
                request.resolve(&file.target),
            ));
        }

        for mount in &request.mounts {
            args.push("--mount".to_string());
            args.push(match mount {
                Mount::Source { host, target } => format!(
                    "type=bind,source={},target={target},readonly",
                    host.display()
                ),
                Mount::Cache { volume, target } => {
                    format!("type=volume,source={volume},target={target}")
                }
            });
        }

        args.push(request.image.to_string());
        args.extend(request.args.iter().map(|a| request.resolve(a)));
        args
    }

    /// Full argv, program first.
    pub fn command_line(&self, request: &ExecRequest) -> Vec<String> {
        let mut argv = vec![self.program.clone()];
        argv.extend(self.docker_args(request));
        argv
    }

    async fn stage(&self, request: &ExecRequest) -> Result<(), ExecError> {
        for file in &request.files {
            let path = self.staged_path(request, file);
            match &file.source {
                FileSource::Host { .. } => {
                    tokio::fs::metadata(&path).await.map_err(|source| {
                        ExecError::io(format!("staged file {}", path.display()), source)
                    })?;
                }
                FileSource::Inline { contents } => {
                    if let Some(parent) = path.parent() {
                        tokio::fs::create_dir_all(parent).await.map_err(|source| {
                            ExecError::io(format!("failed to create {}", parent.display()), source)
                        })?;
                    }
                    tokio::fs::write(&path, contents).await.map_err(|source| {
                        ExecError::io(format!("failed to stage {}", path.display()), source)
                    })?;
                }
            }
        }
        Ok(())
    }

    /// Output directory and container name for the next run.
    fn next_run(&self) -> (PathBuf, String) {
        let n = self.runs.fetch_add(1, Ordering::Relaxed);
        let id = format!("{}-{n}", std::process::id());
        let dir = self.root.path().join("runs").join(&id);
        (dir, format!("{TOOL_NAME}-{id}"))
    }

    async fn execute(&self, request: &ExecRequest) -> Result<Artifact, ExecError> {
        self.stage(request).await?;

        let (out_dir, name) = self.next_run();
        tokio::fs::create_dir_all(&out_dir).await.map_err(|source| {
            ExecError::io(format!("failed to create {}", out_dir.display()), source)
        })?;

        info!(
            program = %self.program,
            image = %request.image,
            workdir = %request.workdir,
            container = %name,
            "launching sandboxed run"
        );

        let mut command = Command::new(&self.program);
        command
            .args(self.run_args(request, Some(&name)))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let guard = ContainerGuard::new(&self.program, name);
        let output = match timeout(self.timeout, command.output()).await {
            Ok(output) => output,
            Err(_) => {
                guard.remove().await;
                return Err(ExecError::Timeout {
                    limit: self.timeout,
                });
            }
        };
        // The client has exited, so `--rm` has taken the container with it
        // (or it was never created).
        guard.disarm();

        let output = output.map_err(|source| ExecError::Spawn {
            program: self.program.clone(),
            source,
        })?;

        if !output.status.success() {
            return Err(ExecError::NonZeroExit {
                status: output.status.to_string(),
                stderr: stderr_tail(&output.stderr),
            });
        }

        let path = out_dir.join(&request.redirect_stdout);
        tokio::fs::write(&path, &output.stdout)
            .await
            .map_err(|source| ExecError::io(format!("failed to write {}", path.display()), source))?;

        Ok(Artifact::new(request.redirect_stdout.clone(), path))
    }
}

impl ExecutionProvider for DockerProvider {
    fn run(
        &self,
        request: &ExecRequest,
    ) -> impl Future<Output = Result<Artifact, ExecError>> + Send {
        async move {
            let result = self.execute(request).await;
            if let Err(err) = &result {
                warn!(error = %err, "sandboxed run failed");
            }
            result
        }
    }
}

/// Force-removes a named container when dropped while armed.
#[derive(Debug)]
struct ContainerGuard {
    program: String,
    name: String,
    armed: bool,
}

impl ContainerGuard {
    fn new(program: &str, name: String) -> Self {
        Self {
            program: program.to_string(),
            name,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }

    async fn remove(mut self) {
        self.armed = false;
        remove_container(&self.program, &self.name).await;
    }
}

impl Drop for ContainerGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let program = std::mem::take(&mut self.program);
        let name = std::mem::take(&mut self.name);

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move { remove_container(&program, &name).await });
            }
            Err(_) => {
                let status = std::process::Command::new(&program)
                    .args(["rm", "-f", &name])
                    .stdin(Stdio::null())
                    .stdout(Stdio::null())
                    .stderr(Stdio::null())
                    .status();
                if let Err(err) = status {
                    warn!(container = %name, error = %err, "failed to remove container");
                }
            }
        }
    }
}

async fn remove_container(program: &str, name: &str) {
    let mut command = Command::new(program);
    command
        .args(["rm", "-f", name])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true);

    match timeout(REMOVE_TIMEOUT, command.status()).await {
        Ok(Ok(status)) if status.success() => debug!(container = %name, "removed container"),
        Ok(Ok(status)) => warn!(container = %name, %status, "failed to remove container"),
        Ok(Err(err)) => warn!(container = %name, error = %err, "failed to remove container"),
        Err(_) => warn!(container = %name, "timed out removing container"),
    }
}

fn stderr_tail(stderr: &[u8]) -> String {
    let start = stderr.len().saturating_sub(STDERR_TAIL_BYTES);
    String::from_utf8_lossy(&stderr[start..]).trim().to_string()
}
