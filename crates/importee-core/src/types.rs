//! Core types for reported issues and check results.

use miette::Diagnostic;
use serde::{Deserialize, Serialize};

/// Rule name attached to layering violations.
pub const RULE_LINEAR: &str = "linear";
/// Rule name attached to unparseable or unreadable files.
pub const RULE_PARSE_ERROR: &str = "parse-error";
/// Rule name attached to recoverable extraction problems.
pub const RULE_PARSE_WARNING: &str = "parse-warning";

/// A single finding produced by a check run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// Name of the rule that produced this issue.
    pub rule_name: String,
    /// File path relative to the project root, with `/` separators.
    pub path: String,
    /// Line number (1-indexed), or 0 when no line applies.
    pub line: usize,
    /// Human-readable message.
    pub message: String,
}

impl Issue {
    /// Creates a new issue.
    #[must_use]
    pub fn new(
        rule_name: impl Into<String>,
        path: impl Into<String>,
        line: usize,
        message: impl Into<String>,
    ) -> Self {
        Self {
            rule_name: rule_name.into(),
            path: path.into(),
            line,
            message: message.into(),
        }
    }

    /// Sort key giving the report order: path, then line, then rule name.
    #[must_use]
    pub fn sort_key(&self) -> (&str, usize, &str) {
        (&self.path, self.line, &self.rule_name)
    }
}

impl std::fmt::Display for Issue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}: [{}] {}",
            self.path, self.line, self.rule_name, self.message
        )
    }
}

/// Converts an Issue to a miette Diagnostic for rich error display.
#[allow(dead_code)] // Public API for miette integration
#[derive(Debug, thiserror::Error, Diagnostic)]
#[error("{message}")]
pub struct IssueDiagnostic {
    message: String,
    #[help]
    help: Option<String>,
}

impl From<&Issue> for IssueDiagnostic {
    fn from(issue: &Issue) -> Self {
        Self {
            message: format!("[{}] {}", issue.rule_name, issue.message),
            help: Some(format!("at {}:{}", issue.path, issue.line)),
        }
    }
}

/// Result of a full check run.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct CheckReport {
    /// All issues found, sorted by path, line, and rule name.
    pub issues: Vec<Issue>,
    /// Number of source files discovered.
    pub files_checked: usize,
    /// Number of files actually parsed (cache misses).
    pub files_parsed: usize,
    /// Number of files served from the cache.
    pub cache_hits: usize,
}

impl CheckReport {
    /// Creates a new empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when no issues were found.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// Returns issues produced by the named rule.
    #[must_use]
    pub fn by_rule(&self, rule_name: &str) -> Vec<&Issue> {
        self.issues
            .iter()
            .filter(|i| i.rule_name == rule_name)
            .collect()
    }

    /// Sorts issues into the canonical report order.
    pub fn sort_issues(&mut self) {
        self.issues
            .sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    }
}
