//! BOM engine errors.

use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BomError {
    #[error("Invalid quantity {quantity}: component quantities must be greater than zero")]
    InvalidQuantity { quantity: Decimal },

    #[error("Product {product_id} is not composite: only composite products may own a BOM")]
    NotComposite { product_id: Uuid },

    #[error("Unknown component product {component_id}")]
    UnknownComponent { component_id: Uuid },

    #[error("Unknown product {product_id}")]
    UnknownProduct { product_id: Uuid },

    #[error("Component {component_id} is already in the BOM of {parent_id}; update its quantity instead")]
    DuplicateComponent { parent_id: Uuid, component_id: Uuid },

    #[error("Component {component_id} not found in the BOM of {parent_id}")]
    ComponentNotFound { parent_id: Uuid, component_id: Uuid },

    #[error("Adding component {component_id} to {parent_id} would create a cycle")]
    CyclicBom { parent_id: Uuid, component_id: Uuid },

    #[error("BOM graph is cyclic: product {product_id} re-entered during cost evaluation (path: {})", format_path(.path))]
    CyclicBomError { product_id: Uuid, path: Vec<Uuid> },

    #[error("Invalid direct cost {direct_cost} for product {product_id}: costs cannot be negative")]
    InvalidDirectCost { product_id: Uuid, direct_cost: Decimal },

    #[error("Product {product_id} is composite: its cost is rolled up from its BOM")]
    DirectCostOnComposite { product_id: Uuid },

    #[error("Leaf product {product_id} has no direct cost")]
    MissingDirectCost { product_id: Uuid },

    #[error("BOM nesting deeper than {limit} levels at product {product_id}")]
    DepthLimitExceeded { product_id: Uuid, limit: usize },

    #[error("Rolled-up cost of product {product_id} overflows the decimal range")]
    CostOverflow { product_id: Uuid },

    #[error("BOM storage error: {message}")]
    Storage { message: String },
}

pub type BomResult<T> = Result<T, BomError>;

fn format_path(path: &[Uuid]) -> String {
    path.iter()
        .map(Uuid::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}

impl BomError {
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidQuantity { .. } => "INVALID_QUANTITY",
            Self::NotComposite { .. } => "NOT_COMPOSITE",
            Self::UnknownComponent { .. } => "UNKNOWN_COMPONENT",
            Self::UnknownProduct { .. } => "UNKNOWN_PRODUCT",
            Self::DuplicateComponent { .. } => "DUPLICATE_COMPONENT",
            Self::ComponentNotFound { .. } => "COMPONENT_NOT_FOUND",
            Self::CyclicBom { .. } => "CYCLIC_BOM",
            Self::CyclicBomError { .. } => "CYCLIC_BOM_ERROR",
            Self::InvalidDirectCost { .. } => "INVALID_DIRECT_COST",
            Self::DirectCostOnComposite { .. } => "DIRECT_COST_ON_COMPOSITE",
            Self::MissingDirectCost { .. } => "MISSING_DIRECT_COST",
            Self::DepthLimitExceeded { .. } => "DEPTH_LIMIT_EXCEEDED",
            Self::CostOverflow { .. } => "COST_OVERFLOW",
            Self::Storage { .. } => "STORAGE_ERROR",
        }
    }

    /// The stored graph already violates acyclicity, or looks like it does.
    pub fn is_integrity_violation(&self) -> bool {
        matches!(
            self,
            Self::CyclicBomError { .. } | Self::DepthLimitExceeded { .. }
        )
    }
}

impl From<sqlx::Error> for BomError {
    fn from(error: sqlx::Error) -> Self {
        Self::storage(error.to_string())
    }
}

impl From<anyhow::Error> for BomError {
    fn from(error: anyhow::Error) -> Self {
        Self::storage(format!("{:#}", error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_error_lists_path() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let error = BomError::CyclicBomError {
            product_id: a,
            path: vec![a, b],
        };

        let message = error.to_string();
        assert!(message.contains(&format!("{} -> {}", a, b)));
        assert!(error.is_integrity_violation());
        assert_eq!(error.error_code(), "CYCLIC_BOM_ERROR");
    }

    #[test]
    fn test_rejected_cycle_is_not_integrity_violation() {
        let error = BomError::CyclicBom {
            parent_id: Uuid::new_v4(),
            component_id: Uuid::new_v4(),
        };
        assert_eq!(error.error_code(), "CYCLIC_BOM");
        assert!(!error.is_integrity_violation());
    }

    #[test]
    fn test_direct_cost_errors_name_the_product() {
        let product_id = Uuid::new_v4();
        let negative = BomError::InvalidDirectCost {
            product_id,
            direct_cost: Decimal::NEGATIVE_ONE,
        };
        assert_eq!(negative.error_code(), "INVALID_DIRECT_COST");
        assert!(negative.to_string().contains(&product_id.to_string()));

        let composite = BomError::DirectCostOnComposite { product_id };
        assert_eq!(composite.error_code(), "DIRECT_COST_ON_COMPOSITE");
        assert!(!composite.is_integrity_violation());
    }
}
