//! Layer resolution: maps modules to the group indexes of a linear rule.

use crate::config::LinearRule;
use crate::module_path::ModulePath;

/// Resolves module paths to the layer groups of one linear rule.
///
/// Resolution uses longest-prefix-match so that more specific group
/// prefixes take priority over broader ones.
pub struct LayerResolver {
    /// (group_prefix, group_name, order_index) sorted by prefix depth descending.
    map: Vec<(ModulePath, String, usize)>,
    scope: Option<ModulePath>,
}

impl LayerResolver {
    /// Builds a resolver from one rule.
    #[must_use]
    pub fn new(rule: &LinearRule) -> Self {
        let mut map: Vec<(ModulePath, String, usize)> = rule
            .resolved_order()
            .iter()
            .zip(&rule.order)
            .enumerate()
            .map(|(index, (prefix, group))| {
                (ModulePath::from_dotted(prefix), group.clone(), index)
            })
            .collect();
        // Longest prefix first for correct matching
        map.sort_by(|a, b| b.0.segments().len().cmp(&a.0.segments().len()));
        Self {
            map,
            scope: rule.scope_path(),
        }
    }

    /// Which group does this module belong to?
    ///
    /// Returns the group's position in the declared order together with its
    /// name as written in the configuration.
    #[must_use]
    pub fn resolve(&self, module: &ModulePath) -> Option<(usize, &str)> {
        for (prefix, name, index) in &self.map {
            if module.starts_with(prefix) {
                return Some((*index, name));
            }
        }
        None
    }

    /// True when the module falls inside the rule's scope.
    ///
    /// Unscoped rules cover every module.
    #[must_use]
    pub fn in_scope(&self, module: &ModulePath) -> bool {
        match &self.scope {
            Some(scope) => module.starts_with(scope),
            None => true,
        }
    }
}
