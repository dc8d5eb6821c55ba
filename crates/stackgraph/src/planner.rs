//! Plan generator - orders a dependency graph into a provisioning plan

use crate::error::{Error, Result};
use crate::graph::DependencyGraph;
use crate::resource::ResourceNode;
use crate::types::OutputsTable;
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, VecDeque};

/// An ordered provisioning plan
///
/// For every edge of the source graph, the `from` node precedes the `to`
/// node. Independent nodes keep their declaration order.
#[derive(Debug, Clone, Serialize)]
pub struct ProvisioningPlan {
    /// Nodes in apply order
    pub nodes: Vec<ResourceNode>,
    /// Layers of positions into `nodes`; nodes in one layer are independent
    pub layers: Vec<Vec<usize>>,
}

impl ProvisioningPlan {
    /// Node ids in apply order
    pub fn order(&self) -> Vec<&str> {
        self.nodes.iter().map(|n| n.id.as_str()).collect()
    }

    /// Node ids grouped by layer
    pub fn layer_ids(&self) -> Vec<Vec<&str>> {
        self.layers
            .iter()
            .map(|layer| layer.iter().map(|&i| self.nodes[i].id.as_str()).collect())
            .collect()
    }

    /// Position of a node in the plan
    pub fn position(&self, id: &str) -> Option<usize> {
        self.nodes.iter().position(|n| n.id == id)
    }

    /// Outputs of all applied nodes
    pub fn outputs_table(&self) -> OutputsTable {
        self.nodes
            .iter()
            .filter_map(|n| n.outputs.clone().map(|o| (n.id.clone(), o)))
            .collect()
    }

    /// Total number of nodes in the plan
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if plan is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Order the graph into a provisioning plan
///
/// Kahn's algorithm, always taking the ready node with the smallest
/// declaration index, so the same graph yields the same plan. Fails with
/// [`Error::Cycle`] carrying a shortest cycle among the unsortable nodes.
pub fn generate(graph: &DependencyGraph) -> Result<ProvisioningPlan> {
    let n = graph.len();
    let mut in_degree: Vec<usize> = (0..n).map(|i| graph.predecessor_indices(i).len()).collect();
    let mut ready: BinaryHeap<Reverse<usize>> = in_degree
        .iter()
        .enumerate()
        .filter(|(_, d)| **d == 0)
        .map(|(i, _)| Reverse(i))
        .collect();

    let mut order = Vec::with_capacity(n);
    while let Some(Reverse(i)) = ready.pop() {
        order.push(i);
        for &next in graph.successor_indices(i) {
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                ready.push(Reverse(next));
            }
        }
    }

    if order.len() < n {
        let remaining: Vec<bool> = in_degree.iter().map(|&d| d > 0).collect();
        let cycle = shortest_cycle(graph, &remaining)
            .into_iter()
            .map(|i| graph.nodes()[i].id.clone())
            .collect();
        return Err(Error::Cycle { cycle });
    }

    let layers = compute_layers(graph, &order);
    log::debug!("generated plan: {} nodes in {} layers", n, layers.len());

    Ok(ProvisioningPlan {
        nodes: order.iter().map(|&i| graph.nodes()[i].clone()).collect(),
        layers,
    })
}

/// Group plan positions into layers
///
/// A node's layer is one more than the deepest layer of its predecessors.
fn compute_layers(graph: &DependencyGraph, order: &[usize]) -> Vec<Vec<usize>> {
    let mut depth = vec![0usize; graph.len()];
    let mut layers: Vec<Vec<usize>> = Vec::new();

    for (position, &i) in order.iter().enumerate() {
        let d = graph
            .predecessor_indices(i)
            .iter()
            .map(|&p| depth[p] + 1)
            .max()
            .unwrap_or(0);
        depth[i] = d;
        if layers.len() <= d {
            layers.resize_with(d + 1, Vec::new);
        }
        layers[d].push(position);
    }

    layers
}

/// Find a shortest cycle among the flagged nodes
///
/// Every node left unsorted by Kahn's algorithm lies on a cycle or
/// downstream of one. A BFS from each candidate, in declaration order, back
/// to itself finds the shortest cycle through it; the overall shortest wins,
/// earlier start nodes winning ties.
fn shortest_cycle(graph: &DependencyGraph, candidates: &[bool]) -> Vec<usize> {
    let mut best: Option<Vec<usize>> = None;

    for start in (0..graph.len()).filter(|&i| candidates[i]) {
        if let Some(cycle) = cycle_through(graph, candidates, start)
            && best.as_ref().is_none_or(|b| cycle.len() < b.len())
        {
            best = Some(cycle);
        }
    }

    best.unwrap_or_default()
}

/// Shortest path from `start` back to `start`, as the list of nodes on it
fn cycle_through(graph: &DependencyGraph, candidates: &[bool], start: usize) -> Option<Vec<usize>> {
    let mut parent: Vec<Option<usize>> = vec![None; graph.len()];
    let mut visited = vec![false; graph.len()];
    let mut queue = VecDeque::from([start]);
    visited[start] = true;

    while let Some(current) = queue.pop_front() {
        let mut successors = graph.successor_indices(current).to_vec();
        successors.sort_unstable();
        successors.dedup();

        for next in successors {
            if !candidates[next] {
                continue;
            }
            if next == start {
                let mut cycle = vec![current];
                let mut cursor = current;
                while let Some(p) = parent[cursor] {
                    cycle.push(p);
                    cursor = p;
                }
                cycle.reverse();
                return Some(cycle);
            }
            if !visited[next] {
                visited[next] = true;
                parent[next] = Some(current);
                queue.push_back(next);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Edge, Reference};

    fn node(id: &str) -> ResourceNode {
        ResourceNode::new(id, "test")
    }

    fn assert_topological(graph: &DependencyGraph, plan: &ProvisioningPlan) {
        for edge in graph.edges() {
            let from = plan.position(&edge.from).unwrap();
            let to = plan.position(&edge.to).unwrap();
            assert!(from < to, "{} must precede {}", edge.from, edge.to);
        }
    }

    fn assert_real_cycle(graph: &DependencyGraph, cycle: &[String]) {
        assert!(!cycle.is_empty());
        for (i, from) in cycle.iter().enumerate() {
            let to = &cycle[(i + 1) % cycle.len()];
            assert!(graph.has_edge(from, to), "{from} -> {to} is not an edge");
        }
    }

    #[test]
    fn test_reference_and_explicit_edge() {
        let graph = DependencyGraph::build(
            vec![
                node("A"),
                node("B").with_attr("ref", Reference::new("A", "out")),
                node("C"),
            ],
            &[Edge::explicit("C", "B")],
        )
        .unwrap();

        let plan = generate(&graph).unwrap();
        assert_eq!(plan.order(), vec!["A", "C", "B"]);
        assert_eq!(plan.layer_ids(), vec![vec!["A", "C"], vec!["B"]]);
        assert_topological(&graph, &plan);
    }

    #[test]
    fn test_two_node_cycle() {
        let graph = DependencyGraph::build(
            vec![
                node("A").with_attr("ref", Reference::new("B", "out")),
                node("B").with_attr("ref", Reference::new("A", "out")),
            ],
            &[],
        )
        .unwrap();

        let err = generate(&graph).unwrap_err();
        assert_eq!(
            err,
            Error::Cycle {
                cycle: vec!["A".into(), "B".into()],
            }
        );
    }

    #[test]
    fn test_reports_minimal_cycle() {
        // a -> b -> c -> d -> a, plus the shortcut c -> b
        let graph = DependencyGraph::build(
            vec![node("a"), node("b"), node("c"), node("d"), node("free")],
            &[
                Edge::explicit("a", "b"),
                Edge::explicit("b", "c"),
                Edge::explicit("c", "d"),
                Edge::explicit("d", "a"),
                Edge::explicit("c", "b"),
            ],
        )
        .unwrap();

        match generate(&graph).unwrap_err() {
            Error::Cycle { cycle } => {
                assert_eq!(cycle, vec!["b".to_string(), "c".to_string()]);
                assert_real_cycle(&graph, &cycle);
            }
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_cycle_ignores_downstream_nodes() {
        let graph = DependencyGraph::build(
            vec![
                node("tail").with_attr("ref", Reference::new("x", "out")),
                node("x").with_attr("ref", Reference::new("y", "out")),
                node("y").with_attr("ref", Reference::new("z", "out")),
                node("z").with_attr("ref", Reference::new("x", "out")),
            ],
            &[],
        )
        .unwrap();

        match generate(&graph).unwrap_err() {
            Error::Cycle { cycle } => {
                assert_eq!(cycle.len(), 3);
                assert!(!cycle.contains(&"tail".to_string()));
                assert_real_cycle(&graph, &cycle);
            }
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_deterministic_order() {
        let build = || {
            DependencyGraph::build(
                vec![
                    node("net"),
                    node("stream_a"),
                    node("stream_b"),
                    node("role").with_attr(
                        "resources",
                        vec![
                            Reference::new("stream_b", "arn"),
                            Reference::new("stream_a", "arn"),
                        ],
                    ),
                    node("cluster")
                        .with_attr("subnet", Reference::new("net", "subnet"))
                        .with_attr("role", Reference::new("role", "name")),
                ],
                &[Edge::explicit("role", "cluster")],
            )
            .unwrap()
        };

        let first = generate(&build()).unwrap();
        let second = generate(&build()).unwrap();
        assert_eq!(first.order(), second.order());
        assert_eq!(
            first.order(),
            vec!["net", "stream_a", "stream_b", "role", "cluster"]
        );
        assert_topological(&build(), &first);
    }

    #[test]
    fn test_layers_follow_longest_path() {
        let graph = DependencyGraph::build(
            vec![node("a"), node("b"), node("c"), node("d")],
            &[
                Edge::explicit("a", "b"),
                Edge::explicit("b", "d"),
                Edge::explicit("c", "d"),
            ],
        )
        .unwrap();

        let plan = generate(&graph).unwrap();
        assert_eq!(plan.layer_ids(), vec![vec!["a", "c"], vec!["b"], vec!["d"]]);
    }

    #[test]
    fn test_empty_graph() {
        let graph = DependencyGraph::build(Vec::new(), &[]).unwrap();
        let plan = generate(&graph).unwrap();
        assert!(plan.is_empty());
        assert!(plan.layers.is_empty());
    }

    /// Minimal LCG so generated graphs are reproducible
    struct Lcg(u64);

    impl Lcg {
        fn next(&mut self) -> u64 {
            self.0 = self
                .0
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            self.0 >> 33
        }

        fn below(&mut self, n: u64) -> u64 {
            self.next() % n
        }
    }

    /// Random nodes with reference edges and explicit edges between them
    fn random_graph(seed: u64) -> DependencyGraph {
        let mut rng = Lcg(seed);
        let n = 1 + rng.below(9) as usize;
        let ids: Vec<String> = (0..n).map(|i| format!("n{i}")).collect();

        let mut nodes: Vec<ResourceNode> = ids.iter().map(|id| node(id)).collect();
        let mut explicit = Vec::new();
        for to in 0..n {
            for from in 0..n {
                if from == to {
                    continue;
                }
                match rng.below(10) {
                    0 => {
                        nodes[to].attributes.insert(
                            format!("from_{from}"),
                            Reference::new(&ids[from], "out").into(),
                        );
                    }
                    1 => explicit.push(Edge::explicit(&ids[from], &ids[to])),
                    _ => {}
                }
            }
        }

        DependencyGraph::build(nodes, &explicit).unwrap()
    }

    #[test]
    fn test_generated_graphs() {
        let (mut acyclic, mut cyclic) = (0, 0);

        for seed in 0..500 {
            let graph = random_graph(seed);
            match generate(&graph) {
                Ok(plan) => {
                    acyclic += 1;
                    assert_eq!(plan.len(), graph.len());
                    assert_topological(&graph, &plan);
                    let again = generate(&random_graph(seed)).unwrap();
                    assert_eq!(plan.order(), again.order(), "seed {seed}");
                }
                Err(Error::Cycle { cycle }) => {
                    cyclic += 1;
                    assert!(!cycle.is_empty(), "seed {seed}");
                    for (i, from) in cycle.iter().enumerate() {
                        let to = &cycle[(i + 1) % cycle.len()];
                        assert!(graph.has_edge(from, to), "seed {seed}: {from} -> {to}");
                    }
                    let again = generate(&random_graph(seed)).unwrap_err();
                    assert_eq!(again, Error::Cycle { cycle }, "seed {seed}");
                }
                Err(e) => panic!("seed {seed}: unexpected error {e}"),
            }
        }

        assert!(acyclic > 0 && cyclic > 0);
    }
}
