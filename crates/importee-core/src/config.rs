//! Project and run configuration for import checks.

use crate::module_path::ModulePath;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

/// Top-level project configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProjectConfig {
    /// Project root directory; source modules live directly under it.
    #[serde(default = "default_root")]
    pub project_root: PathBuf,

    /// Names of the top-level modules to scan.
    #[serde(default)]
    pub source_modules: Vec<String>,

    /// Glob patterns to exclude, matched against root-relative paths.
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Rule configuration.
    #[serde(default)]
    pub rules: RulesConfig,
}

/// Rule definitions grouped by rule kind.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RulesConfig {
    /// Linear layering rules.
    #[serde(default)]
    pub linear: Vec<LinearRule>,
}

/// A linear layering rule.
///
/// `order` lists module prefixes from the lowest layer to the highest.
/// A module in an earlier group must not import a module in a later group.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LinearRule {
    /// Ordered group prefixes, lowest layer first.
    pub order: Vec<String>,

    /// Optional scope. When set, group prefixes resolve inside this module
    /// and the rule only applies to edges between modules under it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_module: Option<String>,
}

impl LinearRule {
    /// Creates an unscoped rule from group prefixes.
    #[must_use]
    pub fn new(order: Vec<String>) -> Self {
        Self {
            order,
            source_module: None,
        }
    }

    /// Scopes the rule to a module prefix.
    #[must_use]
    pub fn scoped(mut self, source_module: impl Into<String>) -> Self {
        self.source_module = Some(source_module.into());
        self
    }

    /// The scope as a module path, if any.
    #[must_use]
    pub fn scope_path(&self) -> Option<ModulePath> {
        self.source_module
            .as_deref()
            .map(ModulePath::from_dotted)
    }

    /// Group prefixes with the scope applied, in declaration order.
    ///
    /// For a rule scoped to `app` with `order = ["config", "checker"]`,
    /// this yields `app.config` and `app.checker`.
    #[must_use]
    pub fn resolved_order(&self) -> Vec<String> {
        match &self.source_module {
            Some(scope) => self
                .order
                .iter()
                .map(|group| format!("{scope}.{group}"))
                .collect(),
            None => self.order.clone(),
        }
    }
}

/// Per-run options. These change cost and output volume, never which
/// imports count as violations.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RunConfig {
    /// Enable verbose progress logging.
    #[serde(default)]
    pub verbose: bool,

    /// Bypass the cache for this run: no lookups, no stores.
    #[serde(default)]
    pub no_cache: bool,

    /// Worker threads for extraction; `None` uses available parallelism.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jobs: Option<usize>,
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

/// Errors for malformed or contradictory configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Configuration failed to deserialize.
    #[error("invalid config: {message}")]
    Parse {
        /// Parse error detail.
        message: String,
    },
    /// Configuration is structurally invalid.
    #[error("config validation: {0}")]
    Validation(String),
    /// A rule definition cannot produce a meaningful ordering.
    #[error("rule config: {0}")]
    Rule(String),
}

impl ProjectConfig {
    /// Creates a config for the given root and source modules, with no
    /// excludes and no rules.
    #[must_use]
    pub fn new(project_root: impl Into<PathBuf>, source_modules: Vec<String>) -> Self {
        Self {
            project_root: project_root.into(),
            source_modules,
            exclude: Vec::new(),
            rules: RulesConfig::default(),
        }
    }

    /// Validates config consistency.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source_modules.is_empty() {
            return Err(ConfigError::Validation(
                "source_modules must not be empty".to_string(),
            ));
        }

        let mut seen_modules: HashSet<&str> = HashSet::new();
        for name in &self.source_modules {
            if name.is_empty() || name.contains('.') || name.contains('/') {
                return Err(ConfigError::Validation(format!(
                    "source module '{name}' must be a bare module name"
                )));
            }
            if !seen_modules.insert(name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "source module '{name}' listed twice"
                )));
            }
        }

        for pattern in &self.exclude {
            if let Err(e) = glob::Pattern::new(pattern) {
                return Err(ConfigError::Validation(format!(
                    "exclude pattern '{pattern}': {e}"
                )));
            }
        }

        for (i, rule) in self.rules.linear.iter().enumerate() {
            validate_rule(i, rule)?;
        }

        Ok(())
    }

    /// Fingerprint of the fully resolved rule set.
    ///
    /// Changing any rule (order, group names, or scope) changes the
    /// fingerprint, which invalidates every cached entry at once.
    #[must_use]
    pub fn rules_fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for rule in &self.rules.linear {
            hasher.update(b"linear:");
            hasher.update(rule.source_module.as_deref().unwrap_or("").as_bytes());
            hasher.update(b"\n");
            for prefix in rule.resolved_order() {
                hasher.update(prefix.as_bytes());
                hasher.update(b"\n");
            }
            hasher.update(b"\n");
        }
        hasher.finalize().to_hex().to_string()
    }
}

fn validate_rule(index: usize, rule: &LinearRule) -> Result<(), ConfigError> {
    if rule.order.is_empty() {
        return Err(ConfigError::Rule(format!(
            "rules.linear[{index}]: order must not be empty"
        )));
    }

    if let Some(scope) = &rule.source_module {
        if !is_dotted_name(scope) {
            return Err(ConfigError::Rule(format!(
                "rules.linear[{index}]: source_module '{scope}' is not a module name"
            )));
        }
    }

    let mut seen: HashSet<&str> = HashSet::new();
    for group in &rule.order {
        if !is_dotted_name(group) {
            return Err(ConfigError::Rule(format!(
                "rules.linear[{index}]: group '{group}' is not a module name"
            )));
        }
        if !seen.insert(group.as_str()) {
            return Err(ConfigError::Rule(format!(
                "rules.linear[{index}]: group '{group}' listed twice"
            )));
        }
    }

    Ok(())
}

/// A non-empty dotted identifier with no empty segments.
fn is_dotted_name(name: &str) -> bool {
    !name.is_empty() && name.split('.').all(|seg| !seg.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_config(rules: Vec<LinearRule>) -> ProjectConfig {
        let mut config = ProjectConfig::new(".", vec!["app".to_string()]);
        config.rules.linear = rules;
        config
    }

    // --- validation tests ---

    #[test]
    fn validate_accepts_minimal_config() {
        let config = make_config(vec![LinearRule::new(vec![
            "core".to_string(),
            "api".to_string(),
        ])]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_source_modules() {
        let config = ProjectConfig::new(".", Vec::new());
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_dotted_source_module() {
        let config = ProjectConfig::new(".", vec!["app.sub".to_string()]);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("app.sub"));
    }

    #[test]
    fn validate_rejects_duplicate_source_module() {
        let config = ProjectConfig::new(".", vec!["app".to_string(), "app".to_string()]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_exclude_pattern() {
        let mut config = ProjectConfig::new(".", vec!["app".to_string()]);
        config.exclude.push("[".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_order() {
        let config = make_config(vec![LinearRule::new(Vec::new())]);
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Rule(_)));
    }

    #[test]
    fn validate_rejects_duplicate_group() {
        let config = make_config(vec![LinearRule::new(vec![
            "core".to_string(),
            "core".to_string(),
        ])]);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("listed twice"));
    }

    #[test]
    fn validate_rejects_malformed_group_name() {
        let config = make_config(vec![LinearRule::new(vec!["core..db".to_string()])]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_allows_nested_groups() {
        // `core` and `core.db` overlap as prefixes; longest-prefix matching
        // disambiguates them, so this is legal.
        let config = make_config(vec![LinearRule::new(vec![
            "core".to_string(),
            "core.db".to_string(),
            "api".to_string(),
        ])]);
        assert!(config.validate().is_ok());
    }

    // --- scope resolution tests ---

    #[test]
    fn resolved_order_applies_scope() {
        let rule =
            LinearRule::new(vec!["config".to_string(), "checker".to_string()]).scoped("app");
        assert_eq!(rule.resolved_order(), vec!["app.config", "app.checker"]);
    }

    #[test]
    fn resolved_order_unscoped_is_verbatim() {
        let rule = LinearRule::new(vec!["core".to_string(), "api".to_string()]);
        assert_eq!(rule.resolved_order(), vec!["core", "api"]);
    }

    // --- fingerprint tests ---

    #[test]
    fn fingerprint_is_stable() {
        let a = make_config(vec![LinearRule::new(vec![
            "core".to_string(),
            "api".to_string(),
        ])]);
        let b = make_config(vec![LinearRule::new(vec![
            "core".to_string(),
            "api".to_string(),
        ])]);
        assert_eq!(a.rules_fingerprint(), b.rules_fingerprint());
    }

    #[test]
    fn fingerprint_changes_with_order() {
        let a = make_config(vec![LinearRule::new(vec![
            "core".to_string(),
            "api".to_string(),
        ])]);
        let b = make_config(vec![LinearRule::new(vec![
            "api".to_string(),
            "core".to_string(),
        ])]);
        assert_ne!(a.rules_fingerprint(), b.rules_fingerprint());
    }

    #[test]
    fn fingerprint_changes_with_scope() {
        let a = make_config(vec![LinearRule::new(vec!["core".to_string()])]);
        let b = make_config(vec![LinearRule::new(vec!["core".to_string()]).scoped("app")]);
        assert_ne!(a.rules_fingerprint(), b.rules_fingerprint());
    }
}
