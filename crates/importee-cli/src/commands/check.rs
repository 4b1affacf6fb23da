//! Check command: run the engine and print the report.

use anyhow::{Context, Result};
use importee_core::{Analyzer, RunConfig};
use std::path::Path;

use crate::OutputFormat;

/// Flags affecting one check run.
#[derive(Debug, Clone, Copy)]
pub struct Options {
    /// Verbose progress logging.
    pub verbose: bool,
    /// Suppress the summary line, print issues only.
    pub quiet: bool,
    /// Bypass the extraction cache.
    pub no_cache: bool,
    /// Extraction worker count override.
    pub jobs: Option<usize>,
}

/// Runs the check command. Returns `true` when no issues were found.
pub fn run(
    path: &Path,
    format: OutputFormat,
    options: Options,
    explicit_config: Option<&Path>,
) -> Result<bool> {
    let source = crate::config_resolver::resolve(path, explicit_config)?;
    let config = crate::config_resolver::load(&source)?;

    let run_config = RunConfig {
        verbose: options.verbose,
        no_cache: options.no_cache,
        jobs: options.jobs,
    };

    let report = Analyzer::builder()
        .config(config)
        .run_config(run_config)
        .build()
        .context("invalid configuration")?
        .check()
        .context("check failed")?;

    super::output::print(&report, format, options.quiet)?;
    Ok(report.is_clean())
}
