//! In-memory component graph.
//!
//! A `DiGraphMap` keyed by product id, with the BOM line as the edge weight.
//! Edges run parent to component; upward walks use the reversed view.
//! Products are present only while at least one edge touches them.

use std::collections::BTreeSet;

use meridian_models::ComponentEdge;
use petgraph::algo::{tarjan_scc, toposort};
use petgraph::graphmap::DiGraphMap;
use petgraph::visit::{Bfs, Reversed};
use petgraph::Direction::{Incoming, Outgoing};
use uuid::Uuid;

use super::error::{BomError, BomResult};

#[derive(Debug, Clone, Default)]
pub struct BomGraph {
    graph: DiGraphMap<Uuid, ComponentEdge>,
}

impl BomGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a graph from stored edges. A later edge for the same pair
    /// replaces the earlier one.
    pub fn from_edges(edges: impl IntoIterator<Item = ComponentEdge>) -> Self {
        let mut graph = Self::new();
        for edge in edges {
            graph.insert(edge);
        }
        graph
    }

    pub(crate) fn as_graph(&self) -> &DiGraphMap<Uuid, ComponentEdge> {
        &self.graph
    }

    pub fn edge(&self, parent_id: Uuid, component_id: Uuid) -> Option<&ComponentEdge> {
        self.graph.edge_weight(parent_id, component_id)
    }

    pub fn contains_edge(&self, parent_id: Uuid, component_id: Uuid) -> bool {
        self.graph.contains_edge(parent_id, component_id)
    }

    /// Direct BOM lines of `parent_id`, in insertion order
    pub fn components_of(&self, parent_id: Uuid) -> impl Iterator<Item = &ComponentEdge> + '_ {
        self.graph.edges(parent_id).map(|(_, _, edge)| edge)
    }

    pub fn component_ids(&self, parent_id: Uuid) -> impl Iterator<Item = Uuid> + '_ {
        self.graph.neighbors_directed(parent_id, Outgoing)
    }

    /// Products that list `component_id` directly in their BOM
    pub fn parents_of(&self, component_id: Uuid) -> impl Iterator<Item = Uuid> + '_ {
        self.graph.neighbors_directed(component_id, Incoming)
    }

    /// Edges pointing at `component_id`
    pub fn where_used(&self, component_id: Uuid) -> Vec<&ComponentEdge> {
        self.parents_of(component_id)
            .filter_map(|parent_id| self.edge(parent_id, component_id))
            .collect()
    }

    /// True when the product appears on either end of any edge
    pub fn has_dependent_edges(&self, product_id: Uuid) -> bool {
        self.component_ids(product_id).next().is_some() || self.parents_of(product_id).next().is_some()
    }

    /// Adds the edge, returning the one it replaced for the same pair
    pub fn insert(&mut self, edge: ComponentEdge) -> Option<ComponentEdge> {
        let (parent_id, component_id) = edge.key();
        self.graph.add_edge(parent_id, component_id, edge)
    }

    /// Replaces an existing edge in place. Returns `None` and leaves the
    /// graph untouched when the pair has no edge.
    pub fn update(&mut self, edge: ComponentEdge) -> Option<ComponentEdge> {
        let (parent_id, component_id) = edge.key();
        let slot = self.graph.edge_weight_mut(parent_id, component_id)?;
        Some(std::mem::replace(slot, edge))
    }

    pub fn remove(&mut self, parent_id: Uuid, component_id: Uuid) -> Option<ComponentEdge> {
        let removed = self.graph.remove_edge(parent_id, component_id)?;
        for id in [parent_id, component_id] {
            if !self.has_dependent_edges(id) {
                self.graph.remove_node(id);
            }
        }
        Some(removed)
    }

    /// Every transitive ancestor of `product_id`, never the product itself
    pub fn ancestors_of(&self, product_id: Uuid) -> BTreeSet<Uuid> {
        let upward = Reversed(&self.graph);
        let mut bfs = Bfs::new(upward, product_id);
        let mut ancestors = BTreeSet::new();

        while let Some(id) = bfs.next(upward) {
            if id != product_id {
                ancestors.insert(id);
            }
        }
        ancestors
    }

    pub fn edges(&self) -> impl Iterator<Item = &ComponentEdge> + '_ {
        self.graph.all_edges().map(|(_, _, edge)| edge)
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Orders products so that every parent precedes its components.
    /// Fails with the strongly connected component holding a cycle.
    pub fn topological_order(&self) -> BomResult<Vec<Uuid>> {
        toposort(&self.graph, None).map_err(|cycle| {
            let product_id = cycle.node_id();
            let path = tarjan_scc(&self.graph)
                .into_iter()
                .find(|component| component.contains(&product_id))
                .unwrap_or_else(|| vec![product_id]);
            BomError::CyclicBomError { product_id, path }
        })
    }
}
