//! Dotted module identifiers and import-reference resolution.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A dotted Python module identifier such as `pkg.sub.mod`.
///
/// Segments never contain dots or empty strings. Ordering is segment-wise,
/// which keeps `BTreeMap` iteration stable across runs.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub struct ModulePath {
    segments: Vec<String>,
}

impl ModulePath {
    /// Creates a module path from concrete segments.
    #[must_use]
    pub fn new(segments: Vec<String>) -> Self {
        Self { segments }
    }

    /// Parses a dotted identifier such as `"pkg.sub"`.
    ///
    /// Empty and all-dot strings produce an empty path.
    #[must_use]
    pub fn from_dotted(dotted: &str) -> Self {
        let segments = dotted
            .split('.')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        Self { segments }
    }

    /// Derives the module identity of a source file given its path relative
    /// to the project root.
    ///
    /// `pkg/sub/mod.py` maps to `pkg.sub.mod`; a package initializer
    /// `pkg/sub/__init__.py` maps to `pkg.sub` with the package flag set.
    /// Returns `None` for paths that are not `.py` files, contain non-UTF-8
    /// components, or contain components that are not importable names.
    #[must_use]
    pub fn from_source_path(rel_path: &Path) -> Option<(Self, bool)> {
        if rel_path.extension().and_then(|e| e.to_str()) != Some("py") {
            return None;
        }
        let stem = rel_path.file_stem()?.to_str()?;
        let mut segments: Vec<String> = Vec::new();
        for component in rel_path.parent()?.components() {
            let seg = component.as_os_str().to_str()?;
            if seg.contains('.') {
                return None;
            }
            segments.push(seg.to_string());
        }
        if stem == "__init__" {
            if segments.is_empty() {
                return None;
            }
            return Some((Self { segments }, true));
        }
        if stem.contains('.') {
            return None;
        }
        segments.push(stem.to_string());
        Some((Self { segments }, false))
    }

    /// Borrows the inner segments.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Returns true when this path has no segments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Formats as a dotted identifier string.
    #[must_use]
    pub fn to_dotted(&self) -> String {
        self.segments.join(".")
    }

    /// Returns a new path with an extra trailing segment.
    #[must_use]
    pub fn append(&self, segment: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.to_string());
        Self { segments }
    }

    /// Returns the parent path, or `None` for an empty path.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.segments.is_empty() {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Returns the first segment, or `None` for an empty path.
    #[must_use]
    pub fn head(&self) -> Option<&str> {
        self.segments.first().map(String::as_str)
    }

    /// Tests whether `prefix` is this path or one of its ancestors.
    #[must_use]
    pub fn starts_with(&self, prefix: &Self) -> bool {
        self.segments.len() >= prefix.segments.len()
            && self.segments[..prefix.segments.len()] == prefix.segments[..]
    }

    /// Builds the relative file path of this module as a plain module file,
    /// e.g. `pkg.sub` becomes `pkg/sub.py`.
    #[must_use]
    pub fn to_module_file(&self) -> PathBuf {
        let mut buf = PathBuf::new();
        if let Some((last, init)) = self.segments.split_last() {
            for seg in init {
                buf.push(seg);
            }
            buf.push(format!("{last}.py"));
        }
        buf
    }

    /// Builds the relative file path of this module as a package
    /// initializer, e.g. `pkg.sub` becomes `pkg/sub/__init__.py`.
    #[must_use]
    pub fn to_package_file(&self) -> PathBuf {
        let mut buf = PathBuf::new();
        for seg in &self.segments {
            buf.push(seg);
        }
        buf.push("__init__.py");
        buf
    }

    /// Resolves a raw import reference written inside this module.
    ///
    /// Absolute references (`pkg.mod`) resolve to themselves. Relative
    /// references climb the package tree: one leading dot names the
    /// containing package (the module itself for a package initializer),
    /// each further dot climbs one level. Returns `None` when the climb
    /// walks past the top of the tree.
    #[must_use]
    pub fn resolve_reference(&self, is_package: bool, reference: &str) -> Option<Self> {
        let level = reference.chars().take_while(|&c| c == '.').count();
        let remainder = &reference[level..];

        if level == 0 {
            return Some(Self::from_dotted(remainder));
        }

        let base = if is_package {
            self.segments.as_slice()
        } else {
            &self.segments[..self.segments.len().saturating_sub(1)]
        };
        let climb = level - 1;
        if climb > base.len() {
            return None;
        }
        let mut segments = base[..base.len() - climb].to_vec();
        segments.extend(
            remainder
                .split('.')
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        );
        Some(Self { segments })
    }
}

impl std::fmt::Display for ModulePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_dotted())
    }
}

impl From<String> for ModulePath {
    fn from(s: String) -> Self {
        Self::from_dotted(&s)
    }
}

impl From<ModulePath> for String {
    fn from(p: ModulePath) -> Self {
        p.to_dotted()
    }
}
