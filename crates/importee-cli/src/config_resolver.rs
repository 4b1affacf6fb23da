//! `pyproject.toml` resolution and loading.
//!
//! Resolution is explicit and typed: either the `--config` flag names the
//! file, or the nearest `pyproject.toml` above the given path is used. The
//! project root is always the directory containing the resolved file.

use anyhow::{Context, Result};
use importee_core::{resolve_project_root, ProjectConfig, RulesConfig};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Where the configuration file came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Explicitly specified via the `--config` flag.
    Explicit(PathBuf),
    /// Found by walking up from the target path.
    Discovered(PathBuf),
}

impl ConfigSource {
    /// The resolved configuration file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Explicit(p) | Self::Discovered(p) => p,
        }
    }
}

/// Resolves the configuration file for a target path.
///
/// # Errors
///
/// Fails when no `--config` flag is given and no ancestor of `start`
/// contains a `pyproject.toml`.
pub fn resolve(start: &Path, explicit: Option<&Path>) -> Result<ConfigSource> {
    if let Some(p) = explicit {
        return Ok(ConfigSource::Explicit(p.to_path_buf()));
    }
    let root = resolve_project_root(start)?;
    let path = root.join("pyproject.toml");
    tracing::debug!("discovered config: {}", path.display());
    Ok(ConfigSource::Discovered(path))
}

#[derive(Debug, Deserialize)]
struct Pyproject {
    #[serde(default)]
    tool: ToolSection,
}

#[derive(Debug, Default, Deserialize)]
struct ToolSection {
    importee: Option<ImporteeTable>,
}

/// The `[tool.importee]` table.
#[derive(Debug, Deserialize)]
struct ImporteeTable {
    #[serde(default)]
    source_modules: Vec<String>,
    #[serde(default)]
    exclude: Vec<String>,
    #[serde(default)]
    rules: RulesConfig,
}

/// Loads the project configuration from a resolved source.
///
/// The project root becomes the directory containing the file.
///
/// # Errors
///
/// Fails when the file cannot be read, is not valid TOML, or has no
/// `[tool.importee]` section.
pub fn load(source: &ConfigSource) -> Result<ProjectConfig> {
    let path = source.path();
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let parsed: Pyproject = toml::from_str(&content)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    let table = parsed.tool.importee.with_context(|| {
        format!("{} has no [tool.importee] section", path.display())
    })?;

    let root = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);

    let mut config = ProjectConfig::new(root, table.source_modules);
    config.exclude = table.exclude;
    config.rules = table.rules;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const PYPROJECT: &str = r#"
[tool.importee]
source_modules = ["app"]
exclude = ["**/tests/**"]

[[tool.importee.rules.linear]]
order = ["config", "checker"]
source_module = "app"
"#;

    #[test]
    fn explicit_takes_priority_over_discovery() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("pyproject.toml"), PYPROJECT).unwrap();
        let custom = tmp.path().join("custom.toml");

        let source = resolve(tmp.path(), Some(&custom)).unwrap();
        assert_eq!(source, ConfigSource::Explicit(custom));
    }

    #[test]
    fn discovery_walks_up_to_pyproject() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("pyproject.toml"), PYPROJECT).unwrap();
        fs::create_dir_all(tmp.path().join("app/sub")).unwrap();

        let source = resolve(&tmp.path().join("app/sub"), None).unwrap();
        assert_eq!(
            source.path(),
            tmp.path().canonicalize().unwrap().join("pyproject.toml")
        );
    }

    #[test]
    fn discovery_fails_without_pyproject() {
        let tmp = TempDir::new().unwrap();
        assert!(resolve(tmp.path(), None).is_err());
    }

    #[test]
    fn load_reads_the_full_table() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("pyproject.toml");
        fs::write(&path, PYPROJECT).unwrap();

        let config = load(&ConfigSource::Discovered(path)).unwrap();
        assert_eq!(config.project_root, tmp.path());
        assert_eq!(config.source_modules, vec!["app"]);
        assert_eq!(config.exclude, vec!["**/tests/**"]);
        assert_eq!(config.rules.linear.len(), 1);
        assert_eq!(config.rules.linear[0].order, vec!["config", "checker"]);
        assert_eq!(
            config.rules.linear[0].source_module.as_deref(),
            Some("app")
        );
    }

    #[test]
    fn load_rejects_missing_tool_section() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("pyproject.toml");
        fs::write(&path, "[project]\nname = \"x\"\n").unwrap();

        let err = load(&ConfigSource::Discovered(path)).unwrap_err();
        assert!(err.to_string().contains("[tool.importee]"));
    }

    #[test]
    fn load_rejects_invalid_toml() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("pyproject.toml");
        fs::write(&path, "not = [valid").unwrap();
        assert!(load(&ConfigSource::Explicit(path)).is_err());
    }
}
