//! Rolled-up cost evaluation.
//!
//! A composite costs the quantity-weighted sum of its components' costs.
//! Because the BOM is a DAG, one sub-assembly can be reached through many
//! paths; every product is evaluated once per aggregator and memoized, which
//! keeps a full rollup at O(V + E).
//!
//! Arithmetic stays in full `Decimal` precision. Callers round once, with
//! [`round_cost`], when the value leaves the engine.

use std::collections::{HashMap, HashSet};

use meridian_models::ProductKind;
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::error;
use uuid::Uuid;

use super::catalog::ProductCatalog;
use super::error::{BomError, BomResult};
use super::graph::BomGraph;
use crate::config::BomConfig;

pub fn round_cost(cost: Decimal, scale: u32) -> Decimal {
    cost.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero)
}

pub struct CostAggregator<'a, C: ProductCatalog + ?Sized> {
    graph: &'a BomGraph,
    catalog: &'a C,
    max_depth: usize,
    use_cached_costs: bool,
    memo: HashMap<Uuid, Decimal>,
    in_progress: HashSet<Uuid>,
    path: Vec<Uuid>,
    evaluations: HashMap<Uuid, usize>,
    computed: HashMap<Uuid, Decimal>,
}

impl<'a, C: ProductCatalog + ?Sized> CostAggregator<'a, C> {
    pub fn new(graph: &'a BomGraph, catalog: &'a C, config: &BomConfig) -> Self {
        Self {
            graph,
            catalog,
            max_depth: config.max_depth,
            use_cached_costs: config.use_cached_costs,
            memo: HashMap::new(),
            in_progress: HashSet::new(),
            path: Vec::new(),
            evaluations: HashMap::new(),
            computed: HashMap::new(),
        }
    }

    /// Unrounded rolled-up unit cost of `product_id`
    pub fn rolled_up_cost(&mut self, product_id: Uuid) -> BomResult<Decimal> {
        self.evaluate(product_id, 0)
    }

    /// How many times `product_id` was actually evaluated (memo hits excluded)
    pub fn evaluations(&self, product_id: Uuid) -> usize {
        self.evaluations.get(&product_id).copied().unwrap_or(0)
    }

    pub fn total_evaluations(&self) -> usize {
        self.evaluations.values().sum()
    }

    /// Composite costs computed from their components during this run,
    /// leaving out values served from the catalog cache.
    pub fn computed_composites(&self) -> &HashMap<Uuid, Decimal> {
        &self.computed
    }

    fn evaluate(&mut self, product_id: Uuid, depth: usize) -> BomResult<Decimal> {
        if let Some(cost) = self.memo.get(&product_id) {
            return Ok(*cost);
        }

        if self.in_progress.contains(&product_id) {
            let mut path = self.path.clone();
            path.push(product_id);
            error!(
                product_id = %product_id,
                depth,
                "BOM invariant violated: cycle reached during cost rollup"
            );
            return Err(BomError::CyclicBomError { product_id, path });
        }

        if depth > self.max_depth {
            error!(
                product_id = %product_id,
                limit = self.max_depth,
                "BOM invariant violated: cost rollup exceeded depth limit"
            );
            return Err(BomError::DepthLimitExceeded {
                product_id,
                limit: self.max_depth,
            });
        }

        let kind = self
            .catalog
            .kind(product_id)
            .ok_or(BomError::UnknownProduct { product_id })?;
        *self.evaluations.entry(product_id).or_insert(0) += 1;

        let cost = match kind {
            ProductKind::Leaf => self
                .catalog
                .direct_cost(product_id)
                .ok_or(BomError::MissingDirectCost { product_id })?,
            ProductKind::Composite => {
                match self.cached(product_id) {
                    Some(cached) => cached,
                    None => {
                        self.in_progress.insert(product_id);
                        self.path.push(product_id);
                        let summed = self.sum_components(product_id, depth);
                        self.path.pop();
                        self.in_progress.remove(&product_id);

                        let cost = summed?;
                        self.computed.insert(product_id, cost);
                        cost
                    }
                }
            }
        };

        self.memo.insert(product_id, cost);
        Ok(cost)
    }

    fn cached(&self, product_id: Uuid) -> Option<Decimal> {
        if self.use_cached_costs {
            self.catalog.cached_cost(product_id)
        } else {
            None
        }
    }

    fn sum_components(&mut self, product_id: Uuid, depth: usize) -> BomResult<Decimal> {
        let graph = self.graph;
        let mut total = Decimal::ZERO;

        for edge in graph.components_of(product_id) {
            let component_cost = self.evaluate(edge.component_id, depth + 1)?;
            total = edge
                .quantity
                .checked_mul(component_cost)
                .and_then(|line| total.checked_add(line))
                .ok_or(BomError::CostOverflow { product_id })?;
        }

        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bom::catalog::{CatalogSnapshot, ProductFacts};
    use meridian_models::{ChangeContext, ComponentEdge};

    struct Fixture {
        graph: BomGraph,
        catalog: CatalogSnapshot,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                graph: BomGraph::new(),
                catalog: CatalogSnapshot::new(),
            }
        }

        fn leaf(&mut self, cost: Decimal) -> Uuid {
            let id = Uuid::new_v4();
            self.catalog.insert(id, ProductFacts::leaf(cost));
            id
        }

        fn composite(&mut self) -> Uuid {
            let id = Uuid::new_v4();
            self.catalog.insert(id, ProductFacts::composite());
            id
        }

        fn uses(&mut self, parent: Uuid, component: Uuid, quantity: Decimal) {
            self.graph.insert(ComponentEdge::new(parent, component, quantity, &ChangeContext::system()));
        }
    }

    fn uncached() -> BomConfig {
        BomConfig {
            use_cached_costs: false,
            ..BomConfig::default()
        }
    }

    #[test]
    fn test_diamond_evaluates_shared_leaf_once() {
        // A -> B (2), A -> C (3), B -> D (1), C -> D (1), D costs 10
        let mut f = Fixture::new();
        let d = f.leaf(Decimal::TEN);
        let b = f.composite();
        let c = f.composite();
        let a = f.composite();
        f.uses(a, b, Decimal::TWO);
        f.uses(a, c, Decimal::from(3));
        f.uses(b, d, Decimal::ONE);
        f.uses(c, d, Decimal::ONE);

        let mut aggregator = CostAggregator::new(&f.graph, &f.catalog, &uncached());
        assert_eq!(aggregator.rolled_up_cost(a).unwrap(), Decimal::from(50));
        assert_eq!(aggregator.evaluations(d), 1);
        assert_eq!(aggregator.evaluations(a), 1);
        assert_eq!(aggregator.total_evaluations(), 4);
    }

    #[test]
    fn test_layered_sharing_stays_linear() {
        // 10 top assemblies each use all 10 sub-assemblies, which all use one harness
        let mut f = Fixture::new();
        let harness = f.leaf(Decimal::new(125, 2));
        let subs: Vec<Uuid> = (0..10).map(|_| f.composite()).collect();
        let tops: Vec<Uuid> = (0..10).map(|_| f.composite()).collect();
        let root = f.composite();
        for sub in &subs {
            f.uses(*sub, harness, Decimal::ONE);
        }
        for top in &tops {
            for sub in &subs {
                f.uses(*top, *sub, Decimal::ONE);
            }
            f.uses(root, *top, Decimal::ONE);
        }

        let mut aggregator = CostAggregator::new(&f.graph, &f.catalog, &uncached());
        // 10 tops * 10 subs * 1.25
        assert_eq!(aggregator.rolled_up_cost(root).unwrap(), Decimal::from(125));
        assert_eq!(aggregator.evaluations(harness), 1);
        assert_eq!(aggregator.total_evaluations(), 1 + 10 + 10 + 1);
    }

    #[test]
    fn test_precision_kept_until_rounding() {
        let mut f = Fixture::new();
        let screw = f.leaf(Decimal::new(3333, 4)); // 0.3333
        let bracket = f.composite();
        let frame = f.composite();
        f.uses(bracket, screw, Decimal::from(3));
        f.uses(frame, bracket, Decimal::new(15, 1)); // 1.5

        let mut aggregator = CostAggregator::new(&f.graph, &f.catalog, &uncached());
        let cost = aggregator.rolled_up_cost(frame).unwrap();
        assert_eq!(cost, Decimal::new(149985, 5)); // 1.49985
        assert_eq!(round_cost(cost, 4), Decimal::new(14999, 4));
        assert_eq!(round_cost(cost, 2), Decimal::new(150, 2));
    }

    #[test]
    fn test_empty_composite_costs_zero() {
        let mut f = Fixture::new();
        let kit = f.composite();

        let mut aggregator = CostAggregator::new(&f.graph, &f.catalog, &uncached());
        assert_eq!(aggregator.rolled_up_cost(kit).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_unknown_and_costless_products() {
        let mut f = Fixture::new();
        let orphan = Uuid::new_v4();
        let costless = Uuid::new_v4();
        f.catalog.insert(
            costless,
            ProductFacts {
                kind: ProductKind::Leaf,
                direct_cost: None,
                rolled_up_cost: None,
            },
        );

        let mut aggregator = CostAggregator::new(&f.graph, &f.catalog, &uncached());
        assert_eq!(
            aggregator.rolled_up_cost(orphan),
            Err(BomError::UnknownProduct { product_id: orphan })
        );
        assert_eq!(
            aggregator.rolled_up_cost(costless),
            Err(BomError::MissingDirectCost { product_id: costless })
        );
    }

    #[test]
    fn test_corrupted_cycle_is_reported() {
        let mut f = Fixture::new();
        let a = f.composite();
        let b = f.composite();
        f.uses(a, b, Decimal::ONE);
        f.uses(b, a, Decimal::ONE);

        let mut aggregator = CostAggregator::new(&f.graph, &f.catalog, &uncached());
        match aggregator.rolled_up_cost(a) {
            Err(BomError::CyclicBomError { product_id, path }) => {
                assert_eq!(product_id, a);
                assert_eq!(path, vec![a, b, a]);
            }
            other => panic!("expected cycle error, got {:?}", other),
        }
    }

    #[test]
    fn test_depth_guard() {
        let mut f = Fixture::new();
        let leaf = f.leaf(Decimal::ONE);
        let mut below = leaf;
        let mut top = leaf;
        for _ in 0..5 {
            top = f.composite();
            f.uses(top, below, Decimal::ONE);
            below = top;
        }

        let shallow = BomConfig {
            max_depth: 3,
            use_cached_costs: false,
            ..BomConfig::default()
        };
        let mut aggregator = CostAggregator::new(&f.graph, &f.catalog, &shallow);
        assert!(matches!(
            aggregator.rolled_up_cost(top),
            Err(BomError::DepthLimitExceeded { limit: 3, .. })
        ));

        let mut aggregator = CostAggregator::new(&f.graph, &f.catalog, &uncached());
        assert_eq!(aggregator.rolled_up_cost(top).unwrap(), Decimal::ONE);
    }

    #[test]
    fn test_cached_cost_short_circuits_subtree() {
        let mut f = Fixture::new();
        let leaf = f.leaf(Decimal::ONE);
        let sub = f.composite();
        let top = f.composite();
        f.uses(sub, leaf, Decimal::ONE);
        f.uses(top, sub, Decimal::TWO);
        f.catalog.set_cached_cost(sub, Some(Decimal::from(7)));

        let mut aggregator = CostAggregator::new(&f.graph, &f.catalog, &BomConfig::default());
        assert_eq!(aggregator.rolled_up_cost(top).unwrap(), Decimal::from(14));
        assert_eq!(aggregator.evaluations(leaf), 0);
        assert!(aggregator.computed_composites().contains_key(&top));
        assert!(!aggregator.computed_composites().contains_key(&sub));
    }
}
