//! Graph rendering for human operators

use crate::graph::DependencyGraph;
use crate::planner::ProvisioningPlan;
use crate::types::EdgeKind;
use std::fmt::Write;

/// Render the graph in Graphviz DOT format
///
/// Implicit edges are solid, explicit edges dashed.
pub fn to_dot(graph: &DependencyGraph, name: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "digraph {} {{", quote(name));
    let _ = writeln!(out, "  rankdir=LR;");
    let _ = writeln!(out, "  node [shape=box];");

    for node in graph.nodes() {
        let _ = writeln!(
            out,
            "  {} [label={}];",
            quote(&node.id),
            quote(&format!("{}\\n{}", node.id, node.kind))
        );
    }

    for edge in graph.edges() {
        let style = match edge.kind {
            EdgeKind::Implicit => "solid",
            EdgeKind::Explicit => "dashed",
        };
        let _ = writeln!(
            out,
            "  {} -> {} [style={}];",
            quote(&edge.from),
            quote(&edge.to),
            style
        );
    }

    out.push_str("}\n");
    out
}

/// Render the plan as an indented text tree, one block per layer
///
/// Each node lists the nodes it waits for.
pub fn to_text(graph: &DependencyGraph, plan: &ProvisioningPlan) -> String {
    let mut out = String::new();
    for (index, layer) in plan.layer_ids().iter().enumerate() {
        let _ = writeln!(out, "layer {index}:");
        for id in layer {
            let kind = graph.node(id).map_or("?", |n| n.kind.as_str());
            let deps = graph.predecessors(id);
            if deps.is_empty() {
                let _ = writeln!(out, "  {id} ({kind})");
            } else {
                let _ = writeln!(out, "  {id} ({kind}) <- {}", deps.join(", "));
            }
        }
    }
    out
}

fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::generate;
    use crate::resource::ResourceNode;
    use crate::types::{Edge, Reference};

    fn graph() -> DependencyGraph {
        DependencyGraph::build(
            vec![
                ResourceNode::new("role", "iam:role"),
                ResourceNode::new("profile", "iam:instance_profile")
                    .with_attr("roles", vec![Reference::new("role", "role_name")]),
                ResourceNode::new("cluster", "emr:cluster"),
            ],
            &[Edge::explicit("profile", "cluster")],
        )
        .unwrap()
    }

    #[test]
    fn test_dot_marks_edge_kinds() {
        let dot = to_dot(&graph(), "emr");
        assert!(dot.starts_with("digraph \"emr\" {"));
        assert!(dot.contains("\"role\" -> \"profile\" [style=solid];"));
        assert!(dot.contains("\"profile\" -> \"cluster\" [style=dashed];"));
        assert!(dot.trim_end().ends_with('}'));
    }

    #[test]
    fn test_text_lists_layers_and_dependencies() {
        let graph = graph();
        let plan = generate(&graph).unwrap();
        let text = to_text(&graph, &plan);

        assert_eq!(
            text,
            "layer 0:\n  role (iam:role)\n\
             layer 1:\n  profile (iam:instance_profile) <- role\n\
             layer 2:\n  cluster (emr:cluster) <- profile\n"
        );
    }

    #[test]
    fn test_quote_escapes() {
        assert_eq!(quote("a \"b\""), "\"a \\\"b\\\"\"");
    }
}
