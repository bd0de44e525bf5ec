//! Repository module for database CRUD operations
//!
//! Typed repositories for catalog products, plus the BOM edge queries
//! used by `PgBomStore`.

pub mod component_edge;
pub mod product;

pub use product::{DeleteOutcome, ProductRepository};
