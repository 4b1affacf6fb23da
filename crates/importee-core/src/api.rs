//! JSON process boundary.
//!
//! [`check_imports`] is the outermost contract for cross-process callers:
//! two JSON strings in, one JSON string out. The DTO types here absorb the
//! boundary's shape variants (a single rule object vs a list, the top-level
//! scope shorthand, the display-only `quiet` flag) and normalize them into
//! the canonical [`ProjectConfig`] before the engine sees anything. A
//! failure is always an `Err`; a clean run is `{"issues":[]}` and nothing
//! else ever produces that shape.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::analyzer::{Analyzer, CheckError};
use crate::config::{LinearRule, ProjectConfig, RunConfig};
use crate::types::Issue;

/// Errors at the JSON boundary.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The project config JSON failed to deserialize.
    #[error("project config: {0}")]
    ProjectConfig(serde_json::Error),
    /// The run config JSON failed to deserialize.
    #[error("run config: {0}")]
    RunConfig(serde_json::Error),
    /// The check run aborted.
    #[error(transparent)]
    Check(#[from] CheckError),
    /// The result failed to serialize.
    #[error("result encoding: {0}")]
    Encode(serde_json::Error),
}

/// Checks a project and returns the result as JSON.
///
/// Input shapes follow the boundary contract: `project_config_json` carries
/// `source_modules` and `rules.linear` (one rule object or a list, with an
/// optional top-level `source_module` scoping shorthand); `run_config_json`
/// carries `verbose`, `no_cache`, and optionally `jobs` and `quiet`. The
/// result is `{"issues":[{"rule_name","path","line","message"},...]}`.
///
/// # Errors
///
/// Returns [`ApiError`] for malformed input, configuration problems, or an
/// aborted run. Errors are never coerced into an empty issue list.
pub fn check_imports(
    project_config_json: &str,
    run_config_json: &str,
) -> Result<String, ApiError> {
    let project: ProjectConfigDto =
        serde_json::from_str(project_config_json).map_err(ApiError::ProjectConfig)?;
    let run: RunConfigDto =
        serde_json::from_str(run_config_json).map_err(ApiError::RunConfig)?;

    let config = project.into_config();
    let report = Analyzer::builder()
        .config(config)
        .run_config(run.into_config())
        .build()
        .map_err(CheckError::Config)?
        .check()?;

    let result = ResultDto {
        issues: report.issues,
    };
    serde_json::to_string(&result).map_err(ApiError::Encode)
}

/// Boundary shape of the project configuration.
#[derive(Debug, Deserialize)]
struct ProjectConfigDto {
    #[serde(default)]
    project_root: Option<PathBuf>,
    #[serde(default)]
    source_modules: Vec<String>,
    #[serde(default)]
    exclude: Vec<String>,
    #[serde(default)]
    rules: RulesDto,
    /// Single-rule shorthand: scopes every rule that has no scope of its own.
    #[serde(default)]
    source_module: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RulesDto {
    #[serde(default)]
    linear: LinearRulesDto,
}

/// `rules.linear` accepts one rule object or a list of them.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LinearRulesDto {
    One(LinearRuleDto),
    Many(Vec<LinearRuleDto>),
}

impl Default for LinearRulesDto {
    fn default() -> Self {
        Self::Many(Vec::new())
    }
}

#[derive(Debug, Deserialize)]
struct LinearRuleDto {
    order: Vec<String>,
    #[serde(default)]
    source_module: Option<String>,
}

/// Boundary shape of the run configuration.
#[derive(Debug, Deserialize)]
struct RunConfigDto {
    #[serde(default)]
    verbose: bool,
    #[serde(default)]
    no_cache: bool,
    #[serde(default)]
    jobs: Option<usize>,
    /// Display-only; accepted for contract completeness, never used here.
    #[serde(default)]
    #[allow(dead_code)]
    quiet: bool,
}

#[derive(Debug, Serialize)]
struct ResultDto {
    issues: Vec<Issue>,
}

impl ProjectConfigDto {
    fn into_config(self) -> ProjectConfig {
        let rules = match self.rules.linear {
            LinearRulesDto::One(rule) => vec![rule],
            LinearRulesDto::Many(rules) => rules,
        };
        let mut config = ProjectConfig::new(
            self.project_root.unwrap_or_else(|| PathBuf::from(".")),
            self.source_modules,
        );
        config.exclude = self.exclude;
        config.rules.linear = rules
            .into_iter()
            .map(|dto| LinearRule {
                order: dto.order,
                source_module: dto.source_module.or_else(|| self.source_module.clone()),
            })
            .collect();
        config
    }
}

impl RunConfigDto {
    fn into_config(self) -> RunConfig {
        RunConfig {
            verbose: self.verbose,
            no_cache: self.no_cache,
            jobs: self.jobs,
        }
    }
}
