//! Product catalog models for the Meridian ERP system.
//!
//! A product is either a `Leaf` (bought or made with a directly known unit
//! cost) or a `Composite` assembled from other products through its bill of
//! materials.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// A catalog product as seen by the BOM engine.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
#[validate(schema(function = "validate_cost_fields", skip_on_field_errors = false))]
pub struct Product {
    pub id: Uuid,
    #[validate(length(min = 1, max = 100, message = "Part number must be between 1 and 100 characters"))]
    pub part_number: String,
    #[validate(length(min = 1, max = 500, message = "Name must be between 1 and 500 characters"))]
    pub name: String,
    pub kind: ProductKind,
    /// Unit cost supplied by purchasing. Only meaningful for leaves.
    pub direct_cost: Option<Decimal>,
    /// Cached rolled-up unit cost. `None` means "recompute on next read".
    pub rolled_up_cost: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductKind {
    Leaf,
    Composite,
}

impl ProductKind {
    /// Parse from the storage representation
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "leaf" => Some(Self::Leaf),
            "composite" => Some(Self::Composite),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Leaf => "leaf",
            Self::Composite => "composite",
        }
    }
}

impl std::fmt::Display for ProductKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn validate_cost_fields(product: &Product) -> Result<(), ValidationError> {
    match product.kind {
        ProductKind::Leaf => match product.direct_cost {
            Some(cost) if cost.is_sign_negative() => Err(ValidationError::new("negative_direct_cost")),
            Some(_) => Ok(()),
            None => Err(ValidationError::new("leaf_requires_direct_cost")),
        },
        ProductKind::Composite => {
            if product.direct_cost.is_some() {
                Err(ValidationError::new("composite_has_direct_cost"))
            } else {
                Ok(())
            }
        }
    }
}

impl Product {
    /// Creates a leaf product with a known unit cost
    pub fn leaf(part_number: impl Into<String>, name: impl Into<String>, direct_cost: Decimal) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            part_number: part_number.into(),
            name: name.into(),
            kind: ProductKind::Leaf,
            direct_cost: Some(direct_cost),
            rolled_up_cost: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Creates a composite product with an empty BOM
    pub fn composite(part_number: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            part_number: part_number.into(),
            name: name.into(),
            kind: ProductKind::Composite,
            direct_cost: None,
            rolled_up_cost: None,
            created_at: now,
            updated_at: now,
        }
    }
}
