//! importee CLI tool.
//!
//! Usage:
//! ```bash
//! importee check [OPTIONS] [PATH]
//! importee clear-cache [PATH]
//! ```
//!
//! Exit codes: 0 when the check is clean, 1 when issues were found,
//! 2 when the run could not produce a result at all.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod commands;
mod config_resolver;

/// Import-dependency linter enforcing linear layering for Python projects
#[derive(Parser)]
#[command(name = "importee")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only print issues, no progress or summary
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to a pyproject.toml (skips discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check import edges against the configured rules
    Check {
        /// Path inside the project (default: current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,

        /// Bypass the extraction cache for this run
        #[arg(long)]
        no_cache: bool,

        /// Number of extraction workers (default: available parallelism)
        #[arg(short, long)]
        jobs: Option<usize>,
    },

    /// Remove the persisted extraction cache
    ClearCache {
        /// Path inside the project (default: current directory)
        #[arg(default_value = ".")]
        path: PathBuf,
    },
}

/// Output format for check results.
#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output.
    Json,
    /// One-line-per-issue compact format.
    Compact,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else if cli.quiet {
        EnvFilter::new("error")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<bool> {
    match &cli.command {
        Commands::Check {
            path,
            format,
            no_cache,
            jobs,
        } => commands::check::run(
            path,
            *format,
            commands::check::Options {
                verbose: cli.verbose,
                quiet: cli.quiet,
                no_cache: *no_cache,
                jobs: *jobs,
            },
            cli.config.as_deref(),
        ),
        Commands::ClearCache { path } => {
            commands::clear_cache::run(path, cli.config.as_deref())?;
            Ok(true)
        }
    }
}
