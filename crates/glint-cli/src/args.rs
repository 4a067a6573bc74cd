use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(
    name = "glint",
    version,
    about = "Run golangci-lint in a pinned container and query its report"
)]
pub struct Args {
    /// Load configuration from this TOML file
    #[arg(long, global = true)]
    pub config_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print all normalized issues
    Issues {
        #[command(flatten)]
        target: Target,

        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },

    /// Print the number of error-severity issues
    ErrorCount {
        #[command(flatten)]
        target: Target,
    },

    /// Print the number of non-error issues
    WarningCount {
        #[command(flatten)]
        target: Target,
    },

    /// Fail if any error-severity issue exists
    Assert {
        #[command(flatten)]
        target: Target,
    },

    /// Write the raw JSON report
    Report {
        #[command(flatten)]
        target: Target,

        /// Write the report to a file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Show the execution request and container command without running it
    Plan {
        #[command(flatten)]
        target: Target,
    },

    /// Normalize and render a previously saved raw report
    Render {
        /// Path to a golangci-lint JSON report
        report: PathBuf,

        /// Subpath the report was produced in
        #[arg(long, default_value = "")]
        path: String,

        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },
}

/// What to lint.
#[derive(Debug, ClapArgs)]
pub struct Target {
    /// The Go source directory to lint
    pub source: PathBuf,

    /// Lint a specific path within the source directory
    #[arg(long, default_value = "")]
    pub path: String,

    /// Cache volume for go module downloads
    #[arg(long)]
    pub go_mod_cache: Option<String>,

    /// Cache volume for go build
    #[arg(long)]
    pub go_build_cache: Option<String>,

    /// Cache volume for golangci-lint
    #[arg(long)]
    pub lint_cache: Option<String>,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Text,
}
