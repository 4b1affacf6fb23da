//! Linear layering rule engine.
//!
//! Evaluates [`LinearRule`]s against the merged [`ModuleGraph`],
//! producing [`Issue`]s for edges that point up the layer order.

use crate::config::LinearRule;
use crate::graph::{ImportEdge, ModuleGraph};
use crate::layer::LayerResolver;
use crate::types::{Issue, RULE_LINEAR};

/// Evaluates linear layering rules against the module graph.
pub struct RuleEngine {
    resolvers: Vec<LayerResolver>,
}

impl RuleEngine {
    /// Creates an engine from the configured rules.
    #[must_use]
    pub fn new(rules: &[LinearRule]) -> Self {
        Self {
            resolvers: rules.iter().map(LayerResolver::new).collect(),
        }
    }

    /// Checks every internal edge against every rule.
    ///
    /// Rules are evaluated independently: two rules whose scopes both cover
    /// an edge each report it. Edges to external modules never violate.
    #[must_use]
    pub fn check(&self, graph: &ModuleGraph) -> Vec<Issue> {
        let mut issues = Vec::new();
        for resolver in &self.resolvers {
            for edge in graph.internal_edges() {
                if let Some(issue) = check_edge(resolver, edge) {
                    issues.push(issue);
                }
            }
        }
        issues
    }
}

/// An edge violates when its target sits in a later group than its origin.
/// Later groups are higher layers; higher layers may import lower ones,
/// never the reverse.
fn check_edge(resolver: &LayerResolver, edge: &ImportEdge) -> Option<Issue> {
    if !resolver.in_scope(&edge.origin) || !resolver.in_scope(&edge.target) {
        return None;
    }
    let (origin_index, origin_group) = resolver.resolve(&edge.origin)?;
    let (target_index, target_group) = resolver.resolve(&edge.target)?;
    if target_index <= origin_index {
        return None;
    }
    Some(Issue::new(
        RULE_LINEAR,
        &edge.file,
        edge.line,
        format!(
            "module '{}' (layer '{origin_group}') must not import '{}' (layer '{target_group}')",
            edge.origin, edge.target
        ),
    ))
}
