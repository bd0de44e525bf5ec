//! Shared utilities for Meridian services
//!
//! Configuration, logging, error types, model validation and the BOM
//! graph engine.

pub mod config;
pub mod logging;
pub mod error;
pub mod validation;
pub mod bom;

pub use config::*;
pub use logging::*;
pub use error::*;
pub use validation::*;
pub use bom::*;
