//! Orchestration of a full check run.
//!
//! Pipeline: validate config, scan, extract (in parallel, consulting the
//! cache), merge into one graph, evaluate rules, sort. Extraction workers
//! share nothing mutable; cache writes happen on one thread after the
//! parallel stage, so results never depend on completion order.

use std::fs;
use std::path::PathBuf;

use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info};

use crate::cache::{content_fingerprint, CacheStore};
use crate::config::{ConfigError, ProjectConfig, RunConfig};
use crate::engine::RuleEngine;
use crate::extract::{Extraction, ImportExtractor};
use crate::graph::ModuleGraphBuilder;
use crate::scanner::{ProjectRootError, SourceFile, SourceScanner};
use crate::types::{CheckReport, Issue, RULE_PARSE_ERROR};

/// Errors that abort a check run.
///
/// File-scoped problems never appear here; they surface as issues in the
/// report and the run continues.
#[derive(Debug, Error)]
pub enum CheckError {
    /// The configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// No scannable project could be established.
    #[error(transparent)]
    ProjectRoot(#[from] ProjectRootError),

    /// The requested worker pool could not be created.
    #[error("worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

/// Outcome of the per-file extraction stage.
struct FileOutcome {
    /// Content fingerprint, `None` when the file could not be read.
    fingerprint: Option<String>,
    extraction: Extraction,
    from_cache: bool,
}

/// Builder for configuring an [`Analyzer`].
#[derive(Debug, Default)]
pub struct AnalyzerBuilder {
    config: Option<ProjectConfig>,
    run: RunConfig,
}

impl AnalyzerBuilder {
    /// Creates a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the project configuration.
    #[must_use]
    pub fn config(mut self, config: ProjectConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the per-run options.
    #[must_use]
    pub fn run_config(mut self, run: RunConfig) -> Self {
        self.run = run;
        self
    }

    /// Builds the analyzer, resolving a relative project root against the
    /// current directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when no project configuration was supplied
    /// or the current directory cannot be determined.
    pub fn build(self) -> Result<Analyzer, ConfigError> {
        let mut config = self.config.ok_or_else(|| {
            ConfigError::Validation("analyzer requires a project config".to_string())
        })?;
        if !config.project_root.is_absolute() {
            let cwd = std::env::current_dir().map_err(|e| {
                ConfigError::Validation(format!("cannot resolve current directory: {e}"))
            })?;
            config.project_root = cwd.join(&config.project_root);
        }
        Ok(Analyzer {
            config,
            run: self.run,
        })
    }
}

/// Runs the full check pipeline.
///
/// Use [`Analyzer::builder()`] to construct an instance. The analyzer holds
/// only configuration; `check` may be called repeatedly and is idempotent
/// for an unchanged tree.
pub struct Analyzer {
    config: ProjectConfig,
    run: RunConfig,
}

impl Analyzer {
    /// Creates a new builder for configuring an analyzer.
    #[must_use]
    pub fn builder() -> AnalyzerBuilder {
        AnalyzerBuilder::new()
    }

    /// The resolved project root.
    #[must_use]
    pub fn root(&self) -> &PathBuf {
        &self.config.project_root
    }

    /// Runs the check and returns the sorted report.
    ///
    /// # Errors
    ///
    /// Returns [`CheckError`] for configuration problems, a missing project
    /// root, or a worker pool that cannot be created. Parse failures and
    /// cache problems never abort the run.
    pub fn check(&self) -> Result<CheckReport, CheckError> {
        self.config.validate()?;

        let scanner = SourceScanner::new(&self.config)?;
        let files = scanner.scan()?;
        info!("checking {} files under {}", files.len(), self.config.project_root.display());

        let cache = CacheStore::open(
            &self.config.project_root,
            &self.config.rules_fingerprint(),
            !self.run.no_cache,
        );
        let extractor = ImportExtractor::new(&self.config.project_root);

        let outcomes = self.extract_all(&files, &cache, &extractor)?;

        let mut report = CheckReport::new();
        report.files_checked = files.len();

        let mut builder = ModuleGraphBuilder::new(&self.config.source_modules);
        for (file, outcome) in files.iter().zip(&outcomes) {
            if outcome.from_cache {
                report.cache_hits += 1;
            } else {
                report.files_parsed += 1;
                if let Some(fingerprint) = &outcome.fingerprint {
                    cache.store(file, fingerprint, &outcome.extraction);
                }
            }
            builder.add_file(file, &outcome.extraction.records);
            report.issues.extend(outcome.extraction.issues.iter().cloned());
        }
        let graph = builder.build();
        debug!(
            "graph: {} modules, {} edges",
            graph.module_count(),
            graph.edge_count()
        );

        let engine = RuleEngine::new(&self.config.rules.linear);
        report.issues.extend(engine.check(&graph));
        report.sort_issues();

        info!(
            "done: {} issues, {} parsed, {} cache hits",
            report.issues.len(),
            report.files_parsed,
            report.cache_hits
        );
        Ok(report)
    }

    /// Runs the per-file stage over a worker pool, keeping scanner order.
    fn extract_all(
        &self,
        files: &[SourceFile],
        cache: &CacheStore,
        extractor: &ImportExtractor,
    ) -> Result<Vec<FileOutcome>, CheckError> {
        let work = |file: &SourceFile| self.extract_one(file, cache, extractor);
        match self.run.jobs {
            Some(jobs) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(jobs.max(1))
                    .build()?;
                Ok(pool.install(|| files.par_iter().map(work).collect()))
            }
            None => Ok(files.par_iter().map(work).collect()),
        }
    }

    /// Cache lookup, else read and parse, for a single file.
    fn extract_one(
        &self,
        file: &SourceFile,
        cache: &CacheStore,
        extractor: &ImportExtractor,
    ) -> FileOutcome {
        let path = file.abs_path(&self.config.project_root);
        let source = match fs::read_to_string(&path) {
            Ok(source) => source,
            Err(e) => {
                return FileOutcome {
                    fingerprint: None,
                    extraction: Extraction {
                        records: Vec::new(),
                        issues: vec![Issue::new(
                            RULE_PARSE_ERROR,
                            &file.rel_path,
                            0,
                            format!("cannot read file: {e}"),
                        )],
                    },
                    from_cache: false,
                };
            }
        };

        let fingerprint = content_fingerprint(&source);
        if let Some(extraction) = cache.lookup(file, &fingerprint) {
            debug!("cache hit: {}", file.rel_path);
            return FileOutcome {
                fingerprint: Some(fingerprint),
                extraction,
                from_cache: true,
            };
        }

        let extraction = extractor.extract(file, &source);
        FileOutcome {
            fingerprint: Some(fingerprint),
            extraction,
            from_cache: false,
        }
    }
}
