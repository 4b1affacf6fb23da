//! # importee-core
//!
//! Analysis engine of the importee import-dependency linter for Python
//! source trees. The pipeline scans a project, extracts import edges,
//! merges them into a module graph, and evaluates linear layering rules,
//! caching per-file results so unchanged trees re-parse nothing.
//!
//! - [`Analyzer`] orchestrates a full check run
//! - [`ProjectConfig`] / [`RunConfig`] are the read-only run inputs
//! - [`Issue`] / [`CheckReport`] carry the sorted findings
//! - [`check_imports`] is the JSON boundary for cross-process callers
//!
//! ## Example
//!
//! ```ignore
//! use importee_core::{Analyzer, LinearRule, ProjectConfig};
//!
//! let mut config = ProjectConfig::new("/path/to/project", vec!["app".into()]);
//! config.rules.linear.push(LinearRule::new(vec!["core".into(), "api".into()]));
//!
//! let report = Analyzer::builder().config(config).build()?.check()?;
//! for issue in &report.issues {
//!     println!("{issue}");
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod analyzer;
mod api;
mod cache;
mod config;
mod engine;
mod extract;
mod graph;
mod layer;
mod module_path;
mod scanner;
mod types;

pub use analyzer::{Analyzer, AnalyzerBuilder, CheckError};
pub use api::{check_imports, ApiError};
pub use cache::{content_fingerprint, CacheError, CacheStore, CACHE_DIR_NAME};
pub use config::{ConfigError, LinearRule, ProjectConfig, RulesConfig, RunConfig};
pub use engine::RuleEngine;
pub use extract::{Extraction, ImportExtractor};
pub use graph::{ImportEdge, ImportRecord, ModuleGraph, ModuleGraphBuilder};
pub use layer::LayerResolver;
pub use module_path::ModulePath;
pub use scanner::{resolve_project_root, ProjectRootError, SourceFile, SourceScanner};
pub use types::{
    CheckReport, Issue, IssueDiagnostic, RULE_LINEAR, RULE_PARSE_ERROR, RULE_PARSE_WARNING,
};
