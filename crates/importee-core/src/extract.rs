//! Python import extraction using Tree-sitter.
//!
//! Walks the full syntax tree, so imports nested in functions, classes,
//! and conditional blocks are all collected. Each file is an independent
//! unit of work; the extractor holds no mutable state between files.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use tracing::debug;
use tree_sitter::{Language, Node, Parser};

use crate::graph::ImportRecord;
use crate::module_path::ModulePath;
use crate::scanner::SourceFile;
use crate::types::{Issue, RULE_PARSE_ERROR, RULE_PARSE_WARNING};

/// Outcome of extracting one source file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    /// One record per resolved import dependency.
    pub records: Vec<ImportRecord>,
    /// File-scoped problems, surfaced as issues instead of aborting.
    pub issues: Vec<Issue>,
}

/// Extracts import dependencies from Python source.
pub struct ImportExtractor {
    language: Language,
    root: PathBuf,
}

impl ImportExtractor {
    /// Creates an extractor probing submodules under the given project root.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            language: tree_sitter_python::LANGUAGE.into(),
            root: root.into(),
        }
    }

    /// Extracts all import records from one file's source text.
    ///
    /// A file that fails to parse contributes no records and exactly one
    /// parse-error issue. Recoverable problems (a relative import climbing
    /// past the top-level package) become parse-warning issues and the
    /// rest of the file is still analyzed.
    #[must_use]
    pub fn extract(&self, file: &SourceFile, source: &str) -> Extraction {
        let mut out = Extraction::default();

        let mut parser = Parser::new();
        if parser.set_language(&self.language).is_err() {
            out.issues.push(Issue::new(
                RULE_PARSE_ERROR,
                &file.rel_path,
                0,
                "python grammar unavailable",
            ));
            return out;
        }
        let src = source.as_bytes();
        let Some(tree) = parser.parse(src, None) else {
            out.issues.push(Issue::new(
                RULE_PARSE_ERROR,
                &file.rel_path,
                0,
                "parser produced no syntax tree",
            ));
            return out;
        };

        let root = tree.root_node();
        if root.has_error() {
            let line = find_error_line(root).unwrap_or(0);
            out.issues.push(Issue::new(
                RULE_PARSE_ERROR,
                &file.rel_path,
                line,
                "syntax error prevents import analysis",
            ));
            return out;
        }

        let mut memo = HashMap::new();
        self.collect(root, src, file, &mut memo, &mut out);
        out
    }

    fn collect(
        &self,
        node: Node<'_>,
        src: &[u8],
        file: &SourceFile,
        memo: &mut HashMap<ModulePath, bool>,
        out: &mut Extraction,
    ) {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "import_statement" => self.handle_import(&child, src, file, out),
                "import_from_statement" => self.handle_from(&child, src, file, memo, out),
                // `from __future__ import ...` has no module dependency
                "future_import_statement" => {}
                _ => {
                    if child.child_count() > 0 {
                        self.collect(child, src, file, memo, out);
                    }
                }
            }
        }
    }

    /// Handles `import a, b.c as alias`. Every listed module is recorded.
    fn handle_import(&self, node: &Node<'_>, src: &[u8], file: &SourceFile, out: &mut Extraction) {
        let line = node.start_position().row + 1;
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            let name_node = match child.kind() {
                "dotted_name" => Some(child),
                "aliased_import" => dotted_name_child(&child),
                _ => None,
            };
            let Some(name_node) = name_node else { continue };
            let raw = text(&name_node, src);
            if let Some(resolved) = file.module.resolve_reference(file.is_package, raw) {
                out.records.push(ImportRecord::new(raw, resolved, line));
            }
        }
    }

    /// Handles `from X import a, b` with submodule preference: when `X.a`
    /// is a module in this project, the dependency is `X.a`, not `X`.
    fn handle_from(
        &self,
        node: &Node<'_>,
        src: &[u8],
        file: &SourceFile,
        memo: &mut HashMap<ModulePath, bool>,
        out: &mut Extraction,
    ) {
        let line = node.start_position().row + 1;

        let mut module_node = None;
        let mut names = Vec::new();
        let mut wildcard = false;
        let mut past_import_keyword = false;
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "import" => past_import_keyword = true,
                "dotted_name" => {
                    if past_import_keyword {
                        names.push(child);
                    } else {
                        module_node = Some(child);
                    }
                }
                "relative_import" => module_node = Some(child),
                "aliased_import" => names.push(child),
                "wildcard_import" => wildcard = true,
                _ => {}
            }
        }

        let Some(module_node) = module_node else {
            return;
        };
        let raw_module = text(&module_node, src);
        let Some(base) = file.module.resolve_reference(file.is_package, raw_module) else {
            out.issues.push(Issue::new(
                RULE_PARSE_WARNING,
                &file.rel_path,
                line,
                format!("relative import '{raw_module}' climbs past the top-level package"),
            ));
            return;
        };

        if wildcard || names.is_empty() {
            if base.is_empty() {
                debug!("{}:{line}: import resolves to nothing", file.rel_path);
            } else {
                out.records.push(ImportRecord::new(raw_module, base, line));
            }
            return;
        }

        let mut seen: HashSet<ModulePath> = HashSet::new();
        for name in &names {
            let name_node = if name.kind() == "aliased_import" {
                dotted_name_child(name)
            } else {
                Some(*name)
            };
            let Some(name_node) = name_node else { continue };
            let name_text = text(&name_node, src);

            let mut candidate = base.clone();
            for seg in name_text.split('.').filter(|s| !s.is_empty()) {
                candidate = candidate.append(seg);
            }

            let (raw, resolved) = if self.is_local_module(memo, &candidate) {
                (join_reference(raw_module, name_text), candidate)
            } else if base.is_empty() {
                debug!("{}:{line}: import resolves to nothing", file.rel_path);
                continue;
            } else {
                (raw_module.to_string(), base.clone())
            };

            if seen.insert(resolved.clone()) {
                out.records.push(ImportRecord::new(raw, resolved, line));
            }
        }
    }

    /// Whether the module exists in this project as a `.py` file or a
    /// package directory.
    fn is_local_module(&self, memo: &mut HashMap<ModulePath, bool>, module: &ModulePath) -> bool {
        if module.is_empty() {
            return false;
        }
        if let Some(&known) = memo.get(module) {
            return known;
        }
        let exists = self.root.join(module.to_module_file()).is_file()
            || self.root.join(module.to_package_file()).is_file();
        memo.insert(module.clone(), exists);
        exists
    }
}

fn text<'a>(node: &Node<'_>, src: &'a [u8]) -> &'a str {
    std::str::from_utf8(&src[node.start_byte()..node.end_byte()]).unwrap_or("")
}

fn dotted_name_child<'a>(node: &Node<'a>) -> Option<Node<'a>> {
    let mut cursor = node.walk();
    let found = node
        .children(&mut cursor)
        .find(|c| c.kind() == "dotted_name");
    found
}

/// Rejoins a module reference and an imported name the way they appear in
/// source: `.` + `other` is `.other`, `a.b` + `c` is `a.b.c`.
fn join_reference(raw_module: &str, name: &str) -> String {
    if raw_module.ends_with('.') {
        format!("{raw_module}{name}")
    } else {
        format!("{raw_module}.{name}")
    }
}

fn find_error_line(node: Node<'_>) -> Option<usize> {
    if node.is_error() || node.is_missing() {
        return Some(node.start_position().row + 1);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if let Some(line) = find_error_line(child) {
            return Some(line);
        }
    }
    Some(node.start_position().row + 1)
}
