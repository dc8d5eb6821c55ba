//! Dependency graph builder
//!
//! Turns declared nodes plus explicit ordering edges into a directed graph.
//! Every reference found in a node's attributes contributes an implicit edge
//! from the referenced node to the referencing one.

use crate::error::{Error, Result};
use crate::resolver::ReferenceResolver;
use crate::resource::{KindRegistry, ResourceNode};
use crate::types::{Edge, EdgeKind};
use std::collections::HashMap;

/// Directed dependency graph over resource nodes
///
/// Nodes keep their declaration order, which the plan generator uses to
/// break ties between independent nodes.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    nodes: Vec<ResourceNode>,
    index: HashMap<String, usize>,
    edges: Vec<Edge>,
    successors: Vec<Vec<usize>>,
    predecessors: Vec<Vec<usize>>,
    resolver: ReferenceResolver,
}

impl DependencyGraph {
    /// Build a graph, accepting any output key on any kind
    pub fn build(nodes: Vec<ResourceNode>, explicit_edges: &[Edge]) -> Result<Self> {
        Self::build_with_registry(nodes, explicit_edges, &KindRegistry::new())
    }

    /// Build a graph, checking referenced outputs against `registry`
    pub fn build_with_registry(
        nodes: Vec<ResourceNode>,
        explicit_edges: &[Edge],
        registry: &KindRegistry,
    ) -> Result<Self> {
        let mut index = HashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            if index.insert(node.id.clone(), i).is_some() {
                return Err(Error::DuplicateNodeId {
                    id: node.id.clone(),
                });
            }
        }

        let mut graph = Self {
            successors: vec![Vec::new(); nodes.len()],
            predecessors: vec![Vec::new(); nodes.len()],
            nodes,
            index,
            edges: Vec::new(),
            resolver: ReferenceResolver::new(),
        };

        for node in &graph.nodes {
            graph.resolver.declare(&node.id, &node.attributes);
        }

        let mut implicit = Vec::new();
        for node in &graph.nodes {
            for reference in graph.resolver.references(&node.id) {
                if reference.target == node.id {
                    return Err(Error::InvalidDependency {
                        node: node.id.clone(),
                    });
                }
                let Some(&target) = graph.index.get(&reference.target) else {
                    return Err(Error::DanglingReference {
                        node: node.id.clone(),
                        target: reference.target.clone(),
                    });
                };
                let target_kind = &graph.nodes[target].kind;
                if registry.documents(target_kind, &reference.output) == Some(false) {
                    return Err(Error::UnknownOutput {
                        node: node.id.clone(),
                        target: reference.target.clone(),
                        kind: target_kind.clone(),
                        output: reference.output.clone(),
                    });
                }
                implicit.push(Edge::implicit(&reference.target, &node.id));
            }
        }
        for edge in implicit {
            graph.insert_edge(edge);
        }

        for edge in explicit_edges {
            for id in [&edge.from, &edge.to] {
                if !graph.index.contains_key(id) {
                    return Err(Error::UnknownNode { id: id.clone() });
                }
            }
            if edge.from == edge.to {
                return Err(Error::InvalidDependency {
                    node: edge.from.clone(),
                });
            }
            if graph.has_edge(&edge.from, &edge.to) {
                log::debug!(
                    "redundant dependency {} -> {} (already ordered)",
                    edge.from,
                    edge.to
                );
            }
            graph.insert_edge(Edge::explicit(&edge.from, &edge.to));
        }

        log::debug!(
            "built dependency graph: {} nodes, {} edges",
            graph.nodes.len(),
            graph.edges.len()
        );
        Ok(graph)
    }

    fn insert_edge(&mut self, edge: Edge) {
        let from = self.index[&edge.from];
        let to = self.index[&edge.to];
        self.successors[from].push(to);
        self.predecessors[to].push(from);
        self.edges.push(edge);
    }

    /// Nodes in declaration order
    pub fn nodes(&self) -> &[ResourceNode] {
        &self.nodes
    }

    /// Look up a node by id
    pub fn node(&self, id: &str) -> Option<&ResourceNode> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    /// Declaration index of a node
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Whether a node with this id is declared
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// All edges, implicit first, then explicit in declaration order
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Whether any edge (of either kind) orders `from` before `to`
    pub fn has_edge(&self, from: &str, to: &str) -> bool {
        match (self.index.get(from), self.index.get(to)) {
            (Some(&f), Some(&t)) => self.successors[f].contains(&t),
            _ => false,
        }
    }

    /// Ids of nodes that must be applied before `id`
    pub fn predecessors(&self, id: &str) -> Vec<&str> {
        self.neighbours(id, &self.predecessors)
    }

    /// Ids of nodes that must wait for `id`
    pub fn successors(&self, id: &str) -> Vec<&str> {
        self.neighbours(id, &self.successors)
    }

    fn neighbours<'a>(&'a self, id: &str, adjacency: &'a [Vec<usize>]) -> Vec<&'a str> {
        let Some(&i) = self.index.get(id) else {
            return Vec::new();
        };
        let mut out: Vec<usize> = adjacency[i].clone();
        out.sort_unstable();
        out.dedup();
        out.into_iter().map(|j| self.nodes[j].id.as_str()).collect()
    }

    /// Number of edges of a given kind
    pub fn edge_count(&self, kind: EdgeKind) -> usize {
        self.edges.iter().filter(|e| e.kind == kind).count()
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Resolver holding the references of every node
    pub fn resolver(&self) -> &ReferenceResolver {
        &self.resolver
    }

    pub(crate) fn successor_indices(&self, i: usize) -> &[usize] {
        &self.successors[i]
    }

    pub(crate) fn predecessor_indices(&self, i: usize) -> &[usize] {
        &self.predecessors[i]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Reference;

    fn node(id: &str) -> ResourceNode {
        ResourceNode::new(id, "test")
    }

    #[test]
    fn test_implicit_edges_from_references() {
        let graph = DependencyGraph::build(
            vec![
                node("a"),
                node("b").with_attr("ref", Reference::new("a", "out")),
            ],
            &[],
        )
        .unwrap();

        assert_eq!(graph.edges(), &[Edge::implicit("a", "b")]);
        assert_eq!(graph.predecessors("b"), vec!["a"]);
        assert_eq!(graph.successors("a"), vec!["b"]);
    }

    #[test]
    fn test_duplicate_node_id() {
        let err = DependencyGraph::build(vec![node("a"), node("a")], &[]).unwrap_err();
        assert_eq!(err, Error::DuplicateNodeId { id: "a".into() });
    }

    #[test]
    fn test_dangling_reference() {
        let err = DependencyGraph::build(
            vec![node("x").with_attr("ref", Reference::new("y", "out"))],
            &[],
        )
        .unwrap_err();
        assert_eq!(
            err,
            Error::DanglingReference {
                node: "x".into(),
                target: "y".into(),
            }
        );
    }

    #[test]
    fn test_self_reference_rejected() {
        let err = DependencyGraph::build(
            vec![node("a").with_attr("me", Reference::new("a", "out"))],
            &[],
        )
        .unwrap_err();
        assert_eq!(err, Error::InvalidDependency { node: "a".into() });

        let err = DependencyGraph::build(vec![node("a")], &[Edge::explicit("a", "a")]).unwrap_err();
        assert_eq!(err, Error::InvalidDependency { node: "a".into() });
    }

    #[test]
    fn test_explicit_edge_unknown_endpoint() {
        let err =
            DependencyGraph::build(vec![node("a")], &[Edge::explicit("a", "ghost")]).unwrap_err();
        assert_eq!(err, Error::UnknownNode { id: "ghost".into() });
    }

    #[test]
    fn test_redundant_edges_are_kept() {
        let graph = DependencyGraph::build(
            vec![
                node("a"),
                node("b").with_attr("ref", Reference::new("a", "out")),
            ],
            &[Edge::explicit("a", "b")],
        )
        .unwrap();

        assert_eq!(graph.edges().len(), 2);
        assert_eq!(graph.edge_count(EdgeKind::Explicit), 1);
        // neighbour queries collapse multi-edges
        assert_eq!(graph.predecessors("b"), vec!["a"]);
    }

    #[test]
    fn test_unknown_output_with_registry() {
        let registry = KindRegistry::new().with_kind("iam:role", ["role_arn", "role_name"]);
        let nodes = vec![
            ResourceNode::new("role", "iam:role"),
            ResourceNode::new("profile", "iam:instance_profile")
                .with_attr("role", Reference::new("role", "stream_arn")),
        ];

        let err = DependencyGraph::build_with_registry(nodes.clone(), &[], &registry).unwrap_err();
        assert!(matches!(err, Error::UnknownOutput { ref output, .. } if output == "stream_arn"));

        // without a registry any output is accepted
        assert!(DependencyGraph::build(nodes, &[]).is_ok());
    }
}
