//! Deterministic discovery of Python source files.

use crate::config::{ConfigError, ProjectConfig};
use crate::module_path::ModulePath;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

/// A discovered Python source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Path relative to the project root, with `/` separators.
    pub rel_path: String,
    /// Module identity derived from the path.
    pub module: ModulePath,
    /// True for package initializers (`__init__.py`).
    pub is_package: bool,
}

impl SourceFile {
    /// The source module this file belongs to.
    #[must_use]
    pub fn source_module(&self) -> &str {
        self.module.head().unwrap_or_default()
    }

    /// Absolute path of this file under the given project root.
    #[must_use]
    pub fn abs_path(&self, root: &Path) -> PathBuf {
        root.join(&self.rel_path)
    }
}

/// Errors that prevent establishing a scannable project.
#[derive(Debug, thiserror::Error)]
pub enum ProjectRootError {
    /// The configured root is not a directory.
    #[error("project root {} does not exist or is not a directory", path.display())]
    RootMissing {
        /// The configured root path.
        path: PathBuf,
    },
    /// Walking up from the starting path found no `pyproject.toml`.
    #[error("no pyproject.toml found in {} or any parent directory", start.display())]
    DiscoveryFailed {
        /// The starting path of the search.
        start: PathBuf,
    },
    /// None of the configured source modules exist under the root.
    #[error("no configured source module found under {}", root.display())]
    NoSourceModules {
        /// The project root that was searched.
        root: PathBuf,
    },
}

/// Resolves a project root by walking up from `start` to the nearest
/// directory containing a `pyproject.toml`.
///
/// This is a pure function over the filesystem at call time; it holds no
/// process-wide state.
///
/// # Errors
///
/// Returns [`ProjectRootError`] when `start` does not exist or no ancestor
/// carries a `pyproject.toml`.
pub fn resolve_project_root(start: &Path) -> Result<PathBuf, ProjectRootError> {
    let canonical = start
        .canonicalize()
        .map_err(|_| ProjectRootError::RootMissing {
            path: start.to_path_buf(),
        })?;
    for dir in canonical.ancestors() {
        if dir.join("pyproject.toml").is_file() {
            return Ok(dir.to_path_buf());
        }
    }
    Err(ProjectRootError::DiscoveryFailed { start: canonical })
}

/// Walks the configured source modules and produces a sorted file list.
#[derive(Debug)]
pub struct SourceScanner {
    root: PathBuf,
    source_modules: Vec<String>,
    exclude: Vec<(glob::Pattern, String)>,
}

impl SourceScanner {
    /// Creates a scanner for the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if an exclude pattern does not compile.
    pub fn new(config: &ProjectConfig) -> Result<Self, ConfigError> {
        let mut exclude = Vec::with_capacity(config.exclude.len());
        for raw in &config.exclude {
            let pattern = glob::Pattern::new(raw).map_err(|e| {
                ConfigError::Validation(format!("exclude pattern '{raw}': {e}"))
            })?;
            exclude.push((pattern, raw.clone()));
        }
        Ok(Self {
            root: config.project_root.clone(),
            source_modules: config.source_modules.clone(),
            exclude,
        })
    }

    /// Discovers all Python source files in the configured modules.
    ///
    /// Output is sorted by relative path, independent of directory walk
    /// order and of the order of `source_modules`.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectRootError`] when the root is missing or no source
    /// module resolves to a directory or file.
    pub fn scan(&self) -> Result<Vec<SourceFile>, ProjectRootError> {
        if !self.root.is_dir() {
            return Err(ProjectRootError::RootMissing {
                path: self.root.clone(),
            });
        }

        let mut files = Vec::new();
        let mut resolved_any = false;

        for name in &self.source_modules {
            let dir = self.root.join(name);
            if dir.is_dir() {
                self.scan_package(&dir, &mut files);
                resolved_any = true;
                continue;
            }
            let single = format!("{name}.py");
            if self.root.join(&single).is_file() {
                if !self.is_excluded(&single) {
                    files.push(SourceFile {
                        rel_path: single,
                        module: ModulePath::from_dotted(name),
                        is_package: false,
                    });
                }
                resolved_any = true;
                continue;
            }
            warn!(
                "source module '{}' not found under {}",
                name,
                self.root.display()
            );
        }

        if !resolved_any {
            return Err(ProjectRootError::NoSourceModules {
                root: self.root.clone(),
            });
        }

        files.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));
        debug!("discovered {} source files", files.len());
        Ok(files)
    }

    fn scan_package(&self, dir: &Path, files: &mut Vec<SourceFile>) {
        let mut builder = ignore::WalkBuilder::new(dir);
        builder
            .hidden(false)
            .git_ignore(true)
            .filter_entry(|entry| entry.file_name() != "__pycache__");

        for entry in builder.build() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("skipping unreadable entry: {e}");
                    continue;
                }
            };
            let path = entry.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("py") {
                continue;
            }
            let Ok(rel) = path.strip_prefix(&self.root) else {
                continue;
            };
            let Some(rel_str) = rel_path_string(rel) else {
                continue;
            };
            if self.is_excluded(&rel_str) {
                debug!("excluded {rel_str}");
                continue;
            }
            let Some((module, is_package)) = ModulePath::from_source_path(rel) else {
                debug!("not an importable module: {rel_str}");
                continue;
            };
            files.push(SourceFile {
                rel_path: rel_str,
                module,
                is_package,
            });
        }
    }

    fn is_excluded(&self, rel: &str) -> bool {
        for (pattern, raw) in &self.exclude {
            if pattern.matches(rel) {
                return true;
            }

            // Also check as substring for patterns like "**/tests/**"
            let normalized = raw.replace("**", "");
            if !normalized.is_empty() && rel.contains(&normalized) {
                return true;
            }
        }
        false
    }
}

/// Joins path components with `/`, rejecting non-UTF-8 components.
fn rel_path_string(rel: &Path) -> Option<String> {
    let mut parts = Vec::new();
    for component in rel.components() {
        match component {
            Component::Normal(os) => parts.push(os.to_str()?),
            _ => return None,
        }
    }
    Some(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_file(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    fn scan(root: &Path, modules: &[&str], exclude: &[&str]) -> Vec<SourceFile> {
        let mut config = ProjectConfig::new(
            root,
            modules.iter().map(ToString::to_string).collect(),
        );
        config.exclude = exclude.iter().map(ToString::to_string).collect();
        SourceScanner::new(&config).unwrap().scan().unwrap()
    }

    #[test]
    fn scan_is_sorted_and_complete() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "app/__init__.py", "");
        write_file(tmp.path(), "app/zeta.py", "");
        write_file(tmp.path(), "app/alpha.py", "");
        write_file(tmp.path(), "app/sub/__init__.py", "");

        let files = scan(tmp.path(), &["app"], &[]);
        let rels: Vec<&str> = files.iter().map(|f| f.rel_path.as_str()).collect();
        assert_eq!(
            rels,
            vec![
                "app/__init__.py",
                "app/alpha.py",
                "app/sub/__init__.py",
                "app/zeta.py",
            ]
        );
        assert_eq!(files[0].module.to_dotted(), "app");
        assert!(files[0].is_package);
        assert_eq!(files[1].module.to_dotted(), "app.alpha");
        assert!(!files[1].is_package);
    }

    #[test]
    fn scan_skips_pycache_and_non_python() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "app/main.py", "");
        write_file(tmp.path(), "app/__pycache__/main.cpython-312.pyc", "");
        write_file(tmp.path(), "app/__pycache__/stale.py", "");
        write_file(tmp.path(), "app/data.json", "{}");

        let files = scan(tmp.path(), &["app"], &[]);
        let rels: Vec<&str> = files.iter().map(|f| f.rel_path.as_str()).collect();
        assert_eq!(rels, vec!["app/main.py"]);
    }

    #[test]
    fn scan_supports_single_file_module() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "tool.py", "");

        let files = scan(tmp.path(), &["tool"], &[]);
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].rel_path, "tool.py");
        assert_eq!(files[0].module.to_dotted(), "tool");
        assert!(!files[0].is_package);
    }

    #[test]
    fn scan_applies_exclude_globs() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "app/main.py", "");
        write_file(tmp.path(), "app/tests/test_main.py", "");
        write_file(tmp.path(), "app/generated.py", "");

        let files = scan(tmp.path(), &["app"], &["**/tests/**", "app/generated.py"]);
        let rels: Vec<&str> = files.iter().map(|f| f.rel_path.as_str()).collect();
        assert_eq!(rels, vec!["app/main.py"]);
    }

    #[test]
    fn scan_warns_but_continues_on_missing_module() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "app/main.py", "");

        let files = scan(tmp.path(), &["app", "ghost"], &[]);
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn scan_fails_when_no_module_resolves() {
        let tmp = TempDir::new().unwrap();
        let config = ProjectConfig::new(tmp.path(), vec!["ghost".to_string()]);
        let err = SourceScanner::new(&config).unwrap().scan().unwrap_err();
        assert!(matches!(err, ProjectRootError::NoSourceModules { .. }));
    }

    #[test]
    fn scan_fails_on_missing_root() {
        let tmp = TempDir::new().unwrap();
        let config = ProjectConfig::new(
            tmp.path().join("nowhere"),
            vec!["app".to_string()],
        );
        let err = SourceScanner::new(&config).unwrap().scan().unwrap_err();
        assert!(matches!(err, ProjectRootError::RootMissing { .. }));
    }

    // --- project root resolution tests ---

    #[test]
    fn resolve_root_finds_pyproject_in_parent() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "pyproject.toml", "[tool.importee]\n");
        fs::create_dir_all(tmp.path().join("src/deep")).unwrap();

        let root = resolve_project_root(&tmp.path().join("src/deep")).unwrap();
        assert_eq!(root, tmp.path().canonicalize().unwrap());
    }

    #[test]
    fn resolve_root_fails_without_pyproject() {
        let tmp = TempDir::new().unwrap();
        let err = resolve_project_root(tmp.path()).unwrap_err();
        assert!(matches!(err, ProjectRootError::DiscoveryFailed { .. }));
    }

    #[test]
    fn resolve_root_fails_on_missing_start() {
        let tmp = TempDir::new().unwrap();
        let err = resolve_project_root(&tmp.path().join("gone")).unwrap_err();
        assert!(matches!(err, ProjectRootError::RootMissing { .. }));
    }
}
