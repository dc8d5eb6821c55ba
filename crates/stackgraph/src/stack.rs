//! Stack - the declaration surface
//!
//! Resources, explicit ordering and suppressions are registered as three
//! separate operations, in declaration order, then compiled together.

use crate::annotator::SuppressionSet;
use crate::error::{Error, Result};
use crate::graph::DependencyGraph;
use crate::planner::{ProvisioningPlan, generate};
use crate::resource::{KindRegistry, ResourceNode};
use crate::types::Edge;
use std::collections::HashSet;

/// A set of declarations waiting to be compiled
#[derive(Debug, Clone, Default)]
pub struct Stack {
    name: String,
    nodes: Vec<ResourceNode>,
    declared: HashSet<String>,
    explicit_edges: Vec<Edge>,
    suppressions: SuppressionSet,
    registry: KindRegistry,
}

impl Stack {
    /// Create an empty stack with a permissive kind registry
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Use `registry` to check referenced outputs at compile time
    pub fn with_registry(mut self, registry: KindRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declare a resource node
    ///
    /// Duplicate ids are rejected immediately.
    pub fn declare(&mut self, node: ResourceNode) -> Result<()> {
        if !self.declared.insert(node.id.clone()) {
            return Err(Error::DuplicateNodeId { id: node.id });
        }
        self.nodes.push(node);
        Ok(())
    }

    /// Require `from` to be applied before `to`
    ///
    /// Endpoints are checked at compile time, so either node may be declared
    /// later.
    pub fn depends_on(&mut self, from: impl Into<String>, to: impl Into<String>) {
        self.explicit_edges.push(Edge::explicit(from, to));
    }

    /// Attach a suppression to an already declared node
    pub fn suppress(&mut self, node: &str, rule: &str, reason: &str) -> Result<()> {
        self.suppressions.suppress(&self.declared, node, rule, reason)
    }

    /// Declared nodes, in declaration order
    pub fn nodes(&self) -> &[ResourceNode] {
        &self.nodes
    }

    /// Compile the declarations: build the graph, then generate the plan
    pub fn compile(self) -> Result<CompiledStack> {
        log::info!(
            "compiling stack '{}' ({} resources, {} explicit dependencies)",
            self.name,
            self.nodes.len(),
            self.explicit_edges.len()
        );
        let graph =
            DependencyGraph::build_with_registry(self.nodes, &self.explicit_edges, &self.registry)?;
        let plan = generate(&graph)?;

        Ok(CompiledStack {
            name: self.name,
            graph,
            plan,
            suppressions: self.suppressions,
            registry: self.registry,
        })
    }
}

/// Output of a successful compilation
#[derive(Debug, Clone)]
pub struct CompiledStack {
    pub name: String,
    pub graph: DependencyGraph,
    pub plan: ProvisioningPlan,
    pub suppressions: SuppressionSet,
    /// Registry the graph was checked against
    pub registry: KindRegistry,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Reference;

    #[test]
    fn test_compile_orders_plan() {
        let mut stack = Stack::new("demo");
        stack.declare(ResourceNode::new("A", "test")).unwrap();
        stack
            .declare(ResourceNode::new("B", "test").with_attr("in", Reference::new("A", "out")))
            .unwrap();
        stack.declare(ResourceNode::new("C", "test")).unwrap();
        stack.depends_on("C", "B");
        stack.suppress("B", "Rule-1", "not applicable").unwrap();

        let compiled = stack.compile().unwrap();
        assert_eq!(compiled.name, "demo");
        assert_eq!(compiled.plan.order(), vec!["A", "C", "B"]);
        assert_eq!(compiled.suppressions.len(), 1);
    }

    #[test]
    fn test_declare_duplicate() {
        let mut stack = Stack::new("demo");
        stack.declare(ResourceNode::new("A", "test")).unwrap();
        let err = stack.declare(ResourceNode::new("A", "other")).unwrap_err();
        assert_eq!(err, Error::DuplicateNodeId { id: "A".into() });
        assert_eq!(stack.nodes().len(), 1);
    }

    #[test]
    fn test_suppress_before_declare_fails() {
        let mut stack = Stack::new("demo");
        let err = stack.suppress("later", "Rule-1", "x").unwrap_err();
        assert_eq!(err, Error::UnknownNode { id: "later".into() });
    }

    #[test]
    fn test_dangling_reference_fails_compile() {
        let mut stack = Stack::new("demo");
        stack
            .declare(ResourceNode::new("X", "test").with_attr("in", Reference::new("Y", "out")))
            .unwrap();
        let err = stack.compile().unwrap_err();
        assert!(err.is_compile_error());
        assert_eq!(
            err,
            Error::DanglingReference {
                node: "X".into(),
                target: "Y".into(),
            }
        );
    }
}
