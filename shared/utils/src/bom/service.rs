//! BOM mutation and costing service.
//!
//! The only writer of component edges. Each mutation validates against a
//! snapshot read under the graph write lock and commits the edge change
//! together with the cost-cache invalidation of every affected ancestor.

use meridian_models::{is_positive_quantity, ChangeContext, ComponentEdge, ProductKind};
use rust_decimal::Decimal;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::catalog::ProductCatalog;
use super::cost::{round_cost, CostAggregator};
use super::cycle::would_create_cycle;
use super::error::{BomError, BomResult};
use super::store::{BomStore, ChangeSet, EdgeChange};
use crate::config::BomConfig;

pub struct BomService<S> {
    store: S,
    config: BomConfig,
}

fn validate_quantity(quantity: Decimal) -> BomResult<()> {
    if is_positive_quantity(quantity) {
        Ok(())
    } else {
        Err(BomError::InvalidQuantity { quantity })
    }
}

impl<S: BomStore> BomService<S> {
    pub fn new(store: S, config: BomConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &BomConfig {
        &self.config
    }

    /// Adds `component_id` to the BOM of `parent_id`
    pub async fn add_component(
        &self,
        parent_id: Uuid,
        component_id: Uuid,
        quantity: Decimal,
        ctx: &ChangeContext,
    ) -> BomResult<ComponentEdge> {
        validate_quantity(quantity)?;

        let uow = self.store.begin().await?;
        let snapshot = uow.snapshot();

        match snapshot.catalog.kind(parent_id) {
            Some(ProductKind::Composite) => {}
            Some(ProductKind::Leaf) => return Err(BomError::NotComposite { product_id: parent_id }),
            None => return Err(BomError::UnknownProduct { product_id: parent_id }),
        }
        if snapshot.catalog.kind(component_id).is_none() {
            return Err(BomError::UnknownComponent { component_id });
        }
        if snapshot.graph.contains_edge(parent_id, component_id) {
            return Err(BomError::DuplicateComponent {
                parent_id,
                component_id,
            });
        }
        if would_create_cycle(&snapshot.graph, parent_id, component_id) {
            warn!(
                parent_id = %parent_id,
                component_id = %component_id,
                actor = %ctx.actor,
                "Rejected BOM edge that would create a cycle"
            );
            return Err(BomError::CyclicBom {
                parent_id,
                component_id,
            });
        }

        let edge = ComponentEdge::new(parent_id, component_id, quantity, ctx);
        let mut changes = ChangeSet::default();
        changes.edges.push(EdgeChange::Inserted(edge.clone()));
        changes.invalidate_lineage(&snapshot.graph, parent_id);
        let invalidated = changes.invalidated.len();

        uow.commit(changes).await?;

        info!(
            parent_id = %parent_id,
            component_id = %component_id,
            quantity = %quantity,
            actor = %ctx.actor,
            "Added BOM component"
        );
        debug!(parent_id = %parent_id, invalidated, "Invalidated rolled-up costs");
        Ok(edge)
    }

    /// Changes the quantity of an existing BOM line in place
    pub async fn update_quantity(
        &self,
        parent_id: Uuid,
        component_id: Uuid,
        new_quantity: Decimal,
        ctx: &ChangeContext,
    ) -> BomResult<ComponentEdge> {
        validate_quantity(new_quantity)?;

        let uow = self.store.begin().await?;
        let snapshot = uow.snapshot();

        let updated = snapshot
            .graph
            .edge(parent_id, component_id)
            .ok_or(BomError::ComponentNotFound {
                parent_id,
                component_id,
            })?
            .with_quantity(new_quantity, ctx);

        let mut changes = ChangeSet::default();
        changes.edges.push(EdgeChange::Updated(updated.clone()));
        changes.invalidate_lineage(&snapshot.graph, parent_id);
        let invalidated = changes.invalidated.len();

        uow.commit(changes).await?;

        info!(
            parent_id = %parent_id,
            component_id = %component_id,
            quantity = %new_quantity,
            actor = %ctx.actor,
            "Updated BOM component quantity"
        );
        debug!(parent_id = %parent_id, invalidated, "Invalidated rolled-up costs");
        Ok(updated)
    }

    /// Removes a BOM line. Removing a line that does not exist is an error.
    pub async fn remove_component(
        &self,
        parent_id: Uuid,
        component_id: Uuid,
        ctx: &ChangeContext,
    ) -> BomResult<()> {
        let uow = self.store.begin().await?;
        let snapshot = uow.snapshot();

        if !snapshot.graph.contains_edge(parent_id, component_id) {
            return Err(BomError::ComponentNotFound {
                parent_id,
                component_id,
            });
        }

        let mut changes = ChangeSet::default();
        changes.edges.push(EdgeChange::Removed {
            parent_id,
            component_id,
        });
        changes.invalidate_lineage(&snapshot.graph, parent_id);
        let invalidated = changes.invalidated.len();

        uow.commit(changes).await?;

        info!(
            parent_id = %parent_id,
            component_id = %component_id,
            actor = %ctx.actor,
            "Removed BOM component"
        );
        debug!(parent_id = %parent_id, invalidated, "Invalidated rolled-up costs");
        Ok(())
    }

    /// Rolled-up unit cost, rounded to the configured output scale.
    ///
    /// A still-valid cached cost is served without locking. Otherwise the
    /// rollup runs under the write lock and the composite costs it computed
    /// are written back to the catalog cache in the same unit of work.
    pub async fn rolled_up_cost(&self, product_id: Uuid) -> BomResult<Decimal> {
        if self.config.use_cached_costs {
            let snapshot = self.store.snapshot().await?;
            if snapshot.catalog.kind(product_id).is_none() {
                return Err(BomError::UnknownProduct { product_id });
            }
            if let Some(cached) = snapshot.catalog.cached_cost(product_id) {
                debug!(product_id = %product_id, "Serving cached rolled-up cost");
                return Ok(round_cost(cached, self.config.cost_scale));
            }
        }

        let uow = self.store.begin().await?;
        let snapshot = uow.snapshot();

        let mut aggregator = CostAggregator::new(&snapshot.graph, &snapshot.catalog, &self.config);
        let cost = aggregator.rolled_up_cost(product_id)?;

        let mut changes = ChangeSet::default();
        changes.cost_writes.extend(
            aggregator
                .computed_composites()
                .iter()
                .map(|(id, cost)| (*id, *cost)),
        );
        let evaluated = aggregator.total_evaluations();
        let cached = changes.cost_writes.len();

        if changes.is_empty() {
            drop(uow);
        } else {
            uow.commit(changes).await?;
        }

        debug!(product_id = %product_id, evaluated, cached, "Rolled up BOM cost");
        Ok(round_cost(cost, self.config.cost_scale))
    }

    /// Whether the product takes part in any BOM, as parent or component.
    /// The catalog must refuse deletion while this holds.
    pub async fn has_dependent_edges(&self, product_id: Uuid) -> BomResult<bool> {
        self.store.has_dependent_edges(product_id).await
    }

    /// Direct BOM of `parent_id`
    pub async fn components_of(&self, parent_id: Uuid) -> BomResult<Vec<ComponentEdge>> {
        let snapshot = self.store.snapshot().await?;
        if snapshot.catalog.kind(parent_id).is_none() {
            return Err(BomError::UnknownProduct { product_id: parent_id });
        }
        Ok(snapshot.graph.components_of(parent_id).cloned().collect())
    }

    /// BOM lines that use `component_id` directly
    pub async fn where_used(&self, component_id: Uuid) -> BomResult<Vec<ComponentEdge>> {
        let snapshot = self.store.snapshot().await?;
        if snapshot.catalog.kind(component_id).is_none() {
            return Err(BomError::UnknownProduct {
                product_id: component_id,
            });
        }
        Ok(snapshot
            .graph
            .where_used(component_id)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Sets the direct cost of a leaf and clears the cached rolled-up cost
    /// of every assembly built from it, in one unit of work. Returns the
    /// number of products whose cache was cleared.
    pub async fn set_direct_cost(
        &self,
        product_id: Uuid,
        direct_cost: Decimal,
        ctx: &ChangeContext,
    ) -> BomResult<usize> {
        if direct_cost.is_sign_negative() {
            return Err(BomError::InvalidDirectCost {
                product_id,
                direct_cost,
            });
        }

        let uow = self.store.begin().await?;
        let snapshot = uow.snapshot();

        match snapshot.catalog.kind(product_id) {
            Some(ProductKind::Leaf) => {}
            Some(ProductKind::Composite) => return Err(BomError::DirectCostOnComposite { product_id }),
            None => return Err(BomError::UnknownProduct { product_id }),
        }
        let previous = snapshot.catalog.direct_cost(product_id);

        let mut changes = ChangeSet::default();
        changes.direct_costs.insert(product_id, direct_cost);
        changes.invalidate_lineage(&snapshot.graph, product_id);
        let invalidated = changes.invalidated.len();

        uow.commit(changes).await?;

        info!(
            product_id = %product_id,
            previous = ?previous,
            direct_cost = %direct_cost,
            invalidated,
            actor = %ctx.actor,
            "Changed direct cost"
        );
        Ok(invalidated)
    }

    /// Checks the stored graph is acyclic. Returns the number of edges.
    pub async fn verify_integrity(&self) -> BomResult<usize> {
        let snapshot = self.store.snapshot().await?;
        if let Err(err) = snapshot.graph.topological_order() {
            error!(error = %err, "BOM invariant violated: stored graph contains a cycle");
            return Err(err);
        }
        Ok(snapshot.graph.edge_count())
    }
}
