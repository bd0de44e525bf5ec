//! Bill-of-materials models.
//!
//! A `ComponentEdge` states that one unit of `parent_id` consumes `quantity`
//! units of `component_id`. Edges carry the audit stamps of the change that
//! last touched them; the stamps come from an explicit `ChangeContext`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, Validate, PartialEq)]
pub struct ComponentEdge {
    pub parent_id: Uuid,
    pub component_id: Uuid,
    #[validate(custom = "validate_positive_quantity")]
    pub quantity: Decimal,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_by: String,
    pub updated_at: DateTime<Utc>,
}

/// Who is making a BOM change, and when.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChangeContext {
    pub actor: String,
    pub at: DateTime<Utc>,
}

impl ChangeContext {
    pub fn new(actor: impl Into<String>) -> Self {
        Self {
            actor: actor.into(),
            at: Utc::now(),
        }
    }

    pub fn system() -> Self {
        Self::new("system")
    }
}

fn validate_positive_quantity(quantity: &Decimal) -> Result<(), ValidationError> {
    if is_positive_quantity(*quantity) {
        Ok(())
    } else {
        Err(ValidationError::new("non_positive_quantity"))
    }
}

/// Component quantities must be strictly greater than zero.
pub fn is_positive_quantity(quantity: Decimal) -> bool {
    quantity > Decimal::ZERO
}

impl ComponentEdge {
    pub fn new(parent_id: Uuid, component_id: Uuid, quantity: Decimal, ctx: &ChangeContext) -> Self {
        Self {
            parent_id,
            component_id,
            quantity,
            created_by: ctx.actor.clone(),
            created_at: ctx.at,
            updated_by: ctx.actor.clone(),
            updated_at: ctx.at,
        }
    }

    /// Returns a copy carrying the new quantity and the caller's audit stamp
    pub fn with_quantity(&self, quantity: Decimal, ctx: &ChangeContext) -> Self {
        Self {
            quantity,
            updated_by: ctx.actor.clone(),
            updated_at: ctx.at,
            ..self.clone()
        }
    }

    pub fn key(&self) -> (Uuid, Uuid) {
        (self.parent_id, self.component_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_quantity_validation() {
        let ctx = ChangeContext::new("planner");
        let edge = ComponentEdge::new(Uuid::new_v4(), Uuid::new_v4(), Decimal::new(15, 1), &ctx);
        assert!(edge.validate().is_ok());

        let zero = edge.with_quantity(Decimal::ZERO, &ctx);
        assert!(zero.validate().is_err());

        let negative = edge.with_quantity(Decimal::NEGATIVE_ONE, &ctx);
        assert!(negative.validate().is_err());
    }

    #[test]
    fn test_with_quantity_keeps_creation_stamp() {
        let creator = ChangeContext::new("alice");
        let edge = ComponentEdge::new(Uuid::new_v4(), Uuid::new_v4(), Decimal::ONE, &creator);

        let editor = ChangeContext::new("bob");
        let updated = edge.with_quantity(Decimal::TWO, &editor);

        assert_eq!(updated.key(), edge.key());
        assert_eq!(updated.quantity, Decimal::TWO);
        assert_eq!(updated.created_by, "alice");
        assert_eq!(updated.updated_by, "bob");
    }
}
