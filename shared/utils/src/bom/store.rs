//! Persistence seam for the BOM engine.
//!
//! A mutation opens a [`BomUnitOfWork`] with [`BomStore::begin`]. The unit
//! of work holds the graph-wide write lock from the moment its snapshot is
//! read until [`BomUnitOfWork::commit`] (or drop, which discards it), so the
//! cycle check and the edge write see the same graph.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use meridian_models::ComponentEdge;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::catalog::CatalogSnapshot;
use super::error::BomResult;
use super::graph::BomGraph;

#[derive(Debug, Clone, Default)]
pub struct BomSnapshot {
    pub graph: BomGraph,
    pub catalog: CatalogSnapshot,
}

impl BomSnapshot {
    /// Applies a committed change set in place
    pub fn apply(&mut self, changes: &ChangeSet) {
        for change in &changes.edges {
            match change {
                EdgeChange::Inserted(edge) => {
                    self.graph.insert(edge.clone());
                }
                EdgeChange::Updated(edge) => {
                    self.graph.update(edge.clone());
                }
                EdgeChange::Removed {
                    parent_id,
                    component_id,
                } => {
                    self.graph.remove(*parent_id, *component_id);
                }
            }
        }
        for (product_id, cost) in &changes.direct_costs {
            self.catalog.set_direct_cost(*product_id, *cost);
        }
        for product_id in &changes.invalidated {
            self.catalog.set_cached_cost(*product_id, None);
        }
        for (product_id, cost) in &changes.cost_writes {
            self.catalog.set_cached_cost(*product_id, Some(*cost));
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EdgeChange {
    Inserted(ComponentEdge),
    Updated(ComponentEdge),
    Removed { parent_id: Uuid, component_id: Uuid },
}

/// Everything one BOM operation writes, committed together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    pub edges: Vec<EdgeChange>,
    /// New direct costs for leaf products
    pub direct_costs: BTreeMap<Uuid, Decimal>,
    /// Products whose cached rolled-up cost must be cleared
    pub invalidated: BTreeSet<Uuid>,
    /// Freshly computed rolled-up costs to cache
    pub cost_writes: BTreeMap<Uuid, Decimal>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
            && self.direct_costs.is_empty()
            && self.invalidated.is_empty()
            && self.cost_writes.is_empty()
    }

    /// Invalidates `product_id` and every transitive ancestor of it
    pub fn invalidate_lineage(&mut self, graph: &BomGraph, product_id: Uuid) {
        self.invalidated.insert(product_id);
        self.invalidated.extend(graph.ancestors_of(product_id));
    }
}

#[async_trait]
pub trait BomStore: Send + Sync {
    /// Consistent read of the graph and catalog facts without the write lock
    async fn snapshot(&self) -> BomResult<BomSnapshot>;

    /// Takes the graph-wide write lock and reads a snapshot under it
    async fn begin(&self) -> BomResult<Box<dyn BomUnitOfWork>>;

    async fn has_dependent_edges(&self, product_id: Uuid) -> BomResult<bool> {
        Ok(self.snapshot().await?.graph.has_dependent_edges(product_id))
    }
}

#[async_trait]
pub trait BomUnitOfWork: Send {
    fn snapshot(&self) -> &BomSnapshot;

    /// Persists the change set and releases the lock. Either every change
    /// lands or none does.
    async fn commit(self: Box<Self>, changes: ChangeSet) -> BomResult<()>;
}

#[async_trait]
impl<T: BomStore + ?Sized> BomStore for Arc<T> {
    async fn snapshot(&self) -> BomResult<BomSnapshot> {
        (**self).snapshot().await
    }

    async fn begin(&self) -> BomResult<Box<dyn BomUnitOfWork>> {
        (**self).begin().await
    }

    async fn has_dependent_edges(&self, product_id: Uuid) -> BomResult<bool> {
        (**self).has_dependent_edges(product_id).await
    }
}
