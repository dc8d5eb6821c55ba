//! Exception annotator - policy suppressions attached to nodes
//!
//! Suppressions are pure metadata for an external policy auditor. They never
//! add edges or change the plan.

use crate::error::{Error, Result};
use crate::graph::DependencyGraph;
use crate::types::SuppressionRecord;
use serde::Serialize;
use std::collections::HashSet;

/// Anything that can answer whether a node id is declared
pub trait NodeSet {
    fn contains_node(&self, id: &str) -> bool;
}

impl NodeSet for DependencyGraph {
    fn contains_node(&self, id: &str) -> bool {
        self.contains(id)
    }
}

impl NodeSet for HashSet<String> {
    fn contains_node(&self, id: &str) -> bool {
        self.contains(id)
    }
}

/// Suppression records in the order they were first attached
#[derive(Debug, Clone, Default, Serialize)]
pub struct SuppressionSet {
    records: Vec<SuppressionRecord>,
}

impl SuppressionSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a suppression of `rule` to `node`
    ///
    /// Fails with [`Error::UnknownNode`] if `node` is not declared in
    /// `nodes`. A second call for the same `(node, rule)` replaces the reason
    /// and keeps the record's original position.
    pub fn suppress(
        &mut self,
        nodes: &impl NodeSet,
        node: &str,
        rule: &str,
        reason: &str,
    ) -> Result<()> {
        if !nodes.contains_node(node) {
            return Err(Error::UnknownNode {
                id: node.to_string(),
            });
        }

        if let Some(existing) = self
            .records
            .iter_mut()
            .find(|r| r.node == node && r.rule == rule)
        {
            log::debug!("replacing suppression {rule} on '{node}'");
            existing.reason = reason.to_string();
        } else {
            self.records.push(SuppressionRecord {
                node: node.to_string(),
                rule: rule.to_string(),
                reason: reason.to_string(),
            });
        }
        Ok(())
    }

    /// All records
    pub fn records(&self) -> &[SuppressionRecord] {
        &self.records
    }

    /// Records attached to one node
    pub fn for_node<'a>(&'a self, node: &'a str) -> impl Iterator<Item = &'a SuppressionRecord> {
        self.records.iter().filter(move |r| r.node == node)
    }

    /// Whether `rule` is suppressed on `node`
    pub fn is_suppressed(&self, node: &str, rule: &str) -> bool {
        self.records.iter().any(|r| r.node == node && r.rule == rule)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Audit report grouped per node, nodes in declaration order
    pub fn report(&self, graph: &DependencyGraph) -> Vec<NodeSuppressions> {
        graph
            .nodes()
            .iter()
            .filter_map(|node| {
                let rules: Vec<RuleSuppression> = self
                    .for_node(&node.id)
                    .map(|r| RuleSuppression {
                        rule: r.rule.clone(),
                        reason: r.reason.clone(),
                    })
                    .collect();
                (!rules.is_empty()).then(|| NodeSuppressions {
                    node: node.id.clone(),
                    kind: node.kind.clone(),
                    suppressions: rules,
                })
            })
            .collect()
    }

    /// Audit report as pretty-printed JSON
    pub fn to_json(&self, graph: &DependencyGraph) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.report(graph))
    }
}

/// Suppressions of one node, as handed to the policy auditor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeSuppressions {
    pub node: String,
    pub kind: String,
    pub suppressions: Vec<RuleSuppression>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleSuppression {
    pub rule: String,
    pub reason: String,
}
