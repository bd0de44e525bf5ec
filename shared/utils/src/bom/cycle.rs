//! Cycle detection for proposed BOM edges.

use petgraph::visit::{Dfs, Walker};
use uuid::Uuid;

use super::graph::BomGraph;

/// Reports whether inserting `parent_id -> component_id` would close a cycle.
///
/// A self-edge is always a cycle. Otherwise the existing graph is searched
/// depth-first from `component_id`; reaching `parent_id` means the parent
/// would become its own descendant. The walk visits each product once, so
/// it terminates even on a graph that already contains a cycle.
///
/// The answer is only valid for the graph as passed in. Callers must hold
/// the graph write lock from this check through the edge insertion.
pub fn would_create_cycle(graph: &BomGraph, parent_id: Uuid, component_id: Uuid) -> bool {
    if parent_id == component_id {
        return true;
    }

    let graph = graph.as_graph();
    Dfs::new(graph, component_id)
        .iter(graph)
        .any(|descendant| descendant == parent_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_models::{ChangeContext, ComponentEdge};
    use rust_decimal::Decimal;

    fn graph_of(pairs: &[(Uuid, Uuid)]) -> BomGraph {
        let ctx = ChangeContext::system();
        BomGraph::from_edges(
            pairs
                .iter()
                .map(|(p, c)| ComponentEdge::new(*p, *c, Decimal::ONE, &ctx)),
        )
    }

    #[test]
    fn test_self_edge_is_cycle() {
        let a = Uuid::new_v4();
        assert!(would_create_cycle(&BomGraph::new(), a, a));
    }

    #[test]
    fn test_back_edge_is_cycle() {
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let graph = graph_of(&[(a, b), (b, c)]);

        assert!(would_create_cycle(&graph, b, a));
        assert!(would_create_cycle(&graph, c, a));
        assert!(!would_create_cycle(&graph, a, c));
    }

    #[test]
    fn test_shared_sub_assembly_is_not_cycle() {
        // Diamond: a -> b -> d, a -> c -> d. Adding c -> b keeps it acyclic.
        let (a, b, c, d) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let graph = graph_of(&[(a, b), (a, c), (b, d), (c, d)]);

        assert!(!would_create_cycle(&graph, c, b));
        assert!(would_create_cycle(&graph, d, a));
    }

    #[test]
    fn test_terminates_on_already_cyclic_graph() {
        let (a, b, c, outsider) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let graph = graph_of(&[(a, b), (b, c), (c, a)]);

        assert!(!would_create_cycle(&graph, outsider, a));
        assert!(would_create_cycle(&graph, a, b));
    }
}
