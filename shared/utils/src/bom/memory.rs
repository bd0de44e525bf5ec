//! In-process BOM store.
//!
//! Backs the engine in tests and single-node tooling. The whole state sits
//! behind one `tokio::sync::Mutex`; a unit of work owns the guard, so
//! mutations are serialized exactly like the Postgres advisory lock does.

use std::sync::Arc;

use async_trait::async_trait;
use meridian_models::{ComponentEdge, Product};
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use super::catalog::ProductFacts;
use super::error::BomResult;
use super::graph::BomGraph;
use super::store::{BomSnapshot, BomStore, BomUnitOfWork, ChangeSet};

#[derive(Clone, Default)]
pub struct InMemoryBomStore {
    state: Arc<Mutex<BomSnapshot>>,
}

impl InMemoryBomStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a store without going through the mutation API. Edges are
    /// taken as given, acyclic or not.
    pub fn with_contents(products: &[Product], edges: Vec<ComponentEdge>) -> Self {
        let mut snapshot = BomSnapshot {
            graph: BomGraph::from_edges(edges),
            ..BomSnapshot::default()
        };
        for product in products {
            snapshot.catalog.insert(product.id, ProductFacts::from(product));
        }
        Self {
            state: Arc::new(Mutex::new(snapshot)),
        }
    }

    /// Creates or replaces a catalog entry
    pub async fn upsert_product(&self, product: &Product) {
        let mut state = self.state.lock().await;
        state.catalog.insert(product.id, ProductFacts::from(product));
    }

    pub async fn product_facts(&self, product_id: Uuid) -> Option<ProductFacts> {
        self.state.lock().await.catalog.get(product_id).cloned()
    }

    pub async fn edges(&self) -> Vec<ComponentEdge> {
        self.state.lock().await.graph.edges().cloned().collect()
    }
}

#[async_trait]
impl BomStore for InMemoryBomStore {
    async fn snapshot(&self) -> BomResult<BomSnapshot> {
        Ok(self.state.lock().await.clone())
    }

    async fn begin(&self) -> BomResult<Box<dyn BomUnitOfWork>> {
        let guard = self.state.clone().lock_owned().await;
        Ok(Box::new(InMemoryUnitOfWork { guard }))
    }
}

struct InMemoryUnitOfWork {
    guard: OwnedMutexGuard<BomSnapshot>,
}

#[async_trait]
impl BomUnitOfWork for InMemoryUnitOfWork {
    fn snapshot(&self) -> &BomSnapshot {
        &self.guard
    }

    async fn commit(mut self: Box<Self>, changes: ChangeSet) -> BomResult<()> {
        self.guard.apply(&changes);
        Ok(())
    }
}
