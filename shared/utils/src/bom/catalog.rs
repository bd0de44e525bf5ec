//! The product facts the BOM engine reads from the catalog.

use std::collections::HashMap;

use meridian_models::{Product, ProductKind};
use rust_decimal::Decimal;
use uuid::Uuid;

/// Read side of the product catalog as seen by the engine.
pub trait ProductCatalog {
    /// `None` when the product does not exist
    fn kind(&self, product_id: Uuid) -> Option<ProductKind>;

    fn direct_cost(&self, product_id: Uuid) -> Option<Decimal>;

    /// Rolled-up cost cached by an earlier evaluation, if still valid
    fn cached_cost(&self, _product_id: Uuid) -> Option<Decimal> {
        None
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductFacts {
    pub kind: ProductKind,
    pub direct_cost: Option<Decimal>,
    pub rolled_up_cost: Option<Decimal>,
}

impl ProductFacts {
    pub fn leaf(direct_cost: Decimal) -> Self {
        Self {
            kind: ProductKind::Leaf,
            direct_cost: Some(direct_cost),
            rolled_up_cost: None,
        }
    }

    pub fn composite() -> Self {
        Self {
            kind: ProductKind::Composite,
            direct_cost: None,
            rolled_up_cost: None,
        }
    }
}

impl From<&Product> for ProductFacts {
    fn from(product: &Product) -> Self {
        Self {
            kind: product.kind,
            direct_cost: product.direct_cost,
            rolled_up_cost: product.rolled_up_cost,
        }
    }
}

/// Point-in-time copy of the catalog facts for every product.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogSnapshot {
    products: HashMap<Uuid, ProductFacts>,
}

impl CatalogSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, product_id: Uuid, facts: ProductFacts) -> Option<ProductFacts> {
        self.products.insert(product_id, facts)
    }

    pub fn get(&self, product_id: Uuid) -> Option<&ProductFacts> {
        self.products.get(&product_id)
    }

    pub fn set_direct_cost(&mut self, product_id: Uuid, cost: Decimal) {
        if let Some(facts) = self.products.get_mut(&product_id) {
            facts.direct_cost = Some(cost);
        }
    }

    pub fn set_cached_cost(&mut self, product_id: Uuid, cost: Option<Decimal>) {
        if let Some(facts) = self.products.get_mut(&product_id) {
            facts.rolled_up_cost = cost;
        }
    }
}

impl FromIterator<(Uuid, ProductFacts)> for CatalogSnapshot {
    fn from_iter<I: IntoIterator<Item = (Uuid, ProductFacts)>>(iter: I) -> Self {
        Self {
            products: iter.into_iter().collect(),
        }
    }
}

impl ProductCatalog for CatalogSnapshot {
    fn kind(&self, product_id: Uuid) -> Option<ProductKind> {
        self.products.get(&product_id).map(|facts| facts.kind)
    }

    fn direct_cost(&self, product_id: Uuid) -> Option<Decimal> {
        self.products.get(&product_id).and_then(|facts| facts.direct_cost)
    }

    fn cached_cost(&self, product_id: Uuid) -> Option<Decimal> {
        self.products
            .get(&product_id)
            .filter(|facts| facts.kind == ProductKind::Composite)
            .and_then(|facts| facts.rolled_up_cost)
    }
}
