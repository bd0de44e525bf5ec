//! Property-based tests for the BOM engine
//!
//! Arbitrary sequences of add, update and remove calls must never leave
//! a cycle in the graph, and rejected calls must never change it.

use meridian_models::{ChangeContext, Product};
use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::{BomError, BomService, BomStore, InMemoryBomStore};
use crate::config::BomConfig;

const COMPOSITES: usize = 6;
const LEAVES: usize = 3;

#[derive(Debug, Clone)]
enum Op {
    Add { parent: usize, component: usize, quantity: i64 },
    Update { parent: usize, component: usize, quantity: i64 },
    Remove { parent: usize, component: usize },
}

fn arb_op() -> impl Strategy<Value = Op> {
    let node = 0..COMPOSITES + LEAVES;
    prop_oneof![
        4 => (0..COMPOSITES, node.clone(), -2i64..20).prop_map(|(parent, component, quantity)| Op::Add {
            parent,
            component,
            quantity,
        }),
        1 => (0..COMPOSITES, node.clone(), 1i64..20).prop_map(|(parent, component, quantity)| Op::Update {
            parent,
            component,
            quantity,
        }),
        1 => (0..COMPOSITES, node).prop_map(|(parent, component)| Op::Remove { parent, component }),
    ]
}

/// Composites first, then leaves
fn seeded_service() -> (BomService<InMemoryBomStore>, Vec<Uuid>) {
    let mut products: Vec<Product> = (0..COMPOSITES)
        .map(|i| Product::composite(format!("AS-{:03}", i), "Assembly"))
        .collect();
    products.extend((0..LEAVES).map(|i| Product::leaf(format!("LF-{:03}", i), "Leaf part", Decimal::from(i as i64 + 1))));
    let ids = products.iter().map(|p| p.id).collect();
    let store = InMemoryBomStore::with_contents(&products, Vec::new());
    (BomService::new(store, BomConfig::default()), ids)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_random_mutations_keep_graph_acyclic(ops in prop::collection::vec(arb_op(), 1..40)) {
        let (service, ids) = seeded_service();
        let ctx = ChangeContext::new("prop");

        tokio_test::block_on(async {
            for op in ops {
                let before = service.store().edges().await;
                let result = match op {
                    Op::Add { parent, component, quantity } => service
                        .add_component(ids[parent], ids[component], Decimal::from(quantity), &ctx)
                        .await
                        .map(|_| ()),
                    Op::Update { parent, component, quantity } => service
                        .update_quantity(ids[parent], ids[component], Decimal::from(quantity), &ctx)
                        .await
                        .map(|_| ()),
                    Op::Remove { parent, component } => {
                        service.remove_component(ids[parent], ids[component], &ctx).await
                    }
                };
                if result.is_err() {
                    prop_assert_eq!(service.store().edges().await, before);
                }

                let snapshot = service.store().snapshot().await.unwrap();
                prop_assert!(snapshot.graph.topological_order().is_ok());
            }

            for id in &ids {
                prop_assert!(service.rolled_up_cost(*id).await.is_ok());
            }
            Ok(())
        })?;
    }

    #[test]
    fn prop_self_edge_always_rejected(index in 0..COMPOSITES, quantity in 1i64..1_000) {
        let (service, ids) = seeded_service();
        let ctx = ChangeContext::new("prop");
        let id = ids[index];

        let result = tokio_test::block_on(service.add_component(id, id, Decimal::from(quantity), &ctx));
        prop_assert_eq!(result, Err(BomError::CyclicBom { parent_id: id, component_id: id }));
    }

    #[test]
    fn prop_cached_and_fresh_costs_agree(ops in prop::collection::vec(arb_op(), 1..30)) {
        let (cached, ids) = seeded_service();
        let fresh = BomService::new(
            cached.store().clone(),
            BomConfig { use_cached_costs: false, ..BomConfig::default() },
        );
        let ctx = ChangeContext::new("prop");

        tokio_test::block_on(async {
            for op in ops {
                let _ = match op {
                    Op::Add { parent, component, quantity } => cached
                        .add_component(ids[parent], ids[component], Decimal::from(quantity), &ctx)
                        .await
                        .map(|_| ()),
                    Op::Update { parent, component, quantity } => cached
                        .update_quantity(ids[parent], ids[component], Decimal::from(quantity), &ctx)
                        .await
                        .map(|_| ()),
                    Op::Remove { parent, component } => {
                        cached.remove_component(ids[parent], ids[component], &ctx).await
                    }
                };
                for id in &ids[..COMPOSITES] {
                    prop_assert_eq!(
                        cached.rolled_up_cost(*id).await.unwrap(),
                        fresh.rolled_up_cost(*id).await.unwrap()
                    );
                }
            }
            Ok(())
        })?;
    }
}
