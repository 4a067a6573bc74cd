use std::io;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use glint_core::report::{Issue, parse_report, render};
use glint_core::{CacheVolume, LintConfig, LintError, RunDescriptor, SourceTree};

mod args;

use args::{Command, OutputFormat, Target};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = args::Args::parse();
    init_tracing(args.quiet, args.verbose)?;

    let config = match &args.config_file {
        Some(path) => LintConfig::load_from(path),
        None => LintConfig::load(),
    }
    .context("failed to load configuration")?;
    tracing::debug!(image = %config.image, docker = %config.docker, "loaded configuration");

    let linter = || glint_core::docker_linter(&config);

    match args.command {
        Command::Render {
            report,
            path,
            format,
        } => {
            let json = std::fs::read_to_string(&report)
                .with_context(|| format!("failed to read report: {}", report.display()))?;
            let parsed = parse_report(&json, &path)?;
            print_issues(&parsed.issues, &format)?;
        }
        Command::Issues { target, format } => {
            let run = linter()?.lint(descriptor(&target)?);
            print_issues(run.issues().await?, &format)?;
        }
        Command::ErrorCount { target } => {
            let run = linter()?.lint(descriptor(&target)?);
            println!("{}", run.error_count().await?);
        }
        Command::WarningCount { target } => {
            let run = linter()?.lint(descriptor(&target)?);
            println!("{}", run.warning_count().await?);
        }
        Command::Assert { target } => {
            let run = linter()?.lint(descriptor(&target)?);
            match run.assert(&mut io::stderr()).await {
                Ok(()) => {}
                Err(err @ LintError::Failed { .. }) => {
                    eprintln!("{err}");
                    return Ok(ExitCode::FAILURE);
                }
                Err(err) => return Err(err.into()),
            }
        }
        Command::Report { target, out } => {
            let run = linter()?.lint(descriptor(&target)?);
            let artifact = run.report().await?;
            match out {
                Some(path) => {
                    std::fs::copy(artifact.path(), &path)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                }
                None => print!("{}", artifact.contents().await?),
            }
        }
        Command::Plan { target } => {
            let linter = linter()?;
            let request = linter.lint(descriptor(&target)?).request()?;
            let command = linter.provider().inner().command_line(&request);
            let plan = serde_json::json!({
                "request": request,
                "command": command,
            });
            println!("{}", serde_json::to_string_pretty(&plan)?);
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn descriptor(target: &Target) -> Result<RunDescriptor> {
    let source = SourceTree::open(&target.source)?;
    let mut descriptor = RunDescriptor::new(source).with_path(&target.path);
    if let Some(name) = &target.go_mod_cache {
        descriptor = descriptor.with_go_mod_cache(CacheVolume::new(name));
    }
    if let Some(name) = &target.go_build_cache {
        descriptor = descriptor.with_go_build_cache(CacheVolume::new(name));
    }
    if let Some(name) = &target.lint_cache {
        descriptor = descriptor.with_lint_cache(CacheVolume::new(name));
    }
    Ok(descriptor)
}

fn print_issues(issues: &[Issue], format: &OutputFormat) -> Result<()> {
    let output = match format {
        OutputFormat::Json => format!("{}\n", render::render_json(issues)?),
        OutputFormat::Text => render::render_text(issues),
    };
    print!("{output}");
    Ok(())
}

fn init_tracing(quiet: bool, verbose: bool) -> Result<()> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("GLINT_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}
