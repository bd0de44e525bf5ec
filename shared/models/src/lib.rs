//! # Meridian Core Domain Models
//!
//! Domain models shared by the Meridian ERP backend and its BOM graph engine.
//!
//! ## Key Models
//!
//! - **Product**: catalog entry, either a `Leaf` with a direct unit cost or a
//!   `Composite` built from other products
//! - **ComponentEdge**: one line of a bill of materials, `parent -> component`
//!   with a positive quantity
//! - **ChangeContext**: the actor and timestamp stamped onto BOM changes
//!
//! ## Validation
//!
//! Models derive `validator::Validate`:
//! - Leaves must carry a non-negative direct cost, composites must not
//! - Component quantities must be strictly positive
//! - Length limits on part numbers and names

pub mod product;
pub mod bom;

#[cfg(test)]
pub mod property_tests;

pub use product::*;
pub use bom::*;
