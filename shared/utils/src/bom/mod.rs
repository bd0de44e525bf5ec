//! BOM (Bill of Materials) Graph Engine
//!
//! Keeps the component graph acyclic and rolls component costs up into
//! composite products.
//!
//! - [`graph`]: in-memory adjacency of `parent -> component` edges
//! - [`cycle`]: reachability check run before an edge is inserted
//! - [`cost`]: memoized rolled-up cost evaluation over the DAG
//! - [`store`]: the persistence seam and its in-memory implementation
//! - [`service`]: the transactional mutation API used by the CRUD layer

pub mod catalog;
pub mod cost;
pub mod cycle;
pub mod error;
pub mod graph;
pub mod memory;
pub mod service;
pub mod store;

#[cfg(test)]
mod property_tests;

pub use catalog::{CatalogSnapshot, ProductCatalog, ProductFacts};
pub use cost::{round_cost, CostAggregator};
pub use cycle::would_create_cycle;
pub use error::{BomError, BomResult};
pub use graph::BomGraph;
pub use memory::InMemoryBomStore;
pub use service::BomService;
pub use store::{BomSnapshot, BomStore, BomUnitOfWork, ChangeSet, EdgeChange};
